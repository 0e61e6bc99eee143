use std::path::{Path, PathBuf};

use async_trait::async_trait;
use url::Url;

use crate::{
    entities::scan::{scan_storage_path, ScanId, StoredObject},
    errors::BackendError,
    repositories::storage::ObjectStorage,
};

/// Object storage rooted in a local directory.
///
/// Download URLs point at `public_base_url` when one is configured (e.g. a
/// static file server in front of the directory), otherwise at the file itself.
#[derive(Debug, Clone)]
pub struct LocalObjectStorage {
    root: PathBuf,
    public_base_url: Option<Url>,
}

impl LocalObjectStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: Option<&str>) -> Result<Self, BackendError> {
        let public_base_url = public_base_url
            .map(|base| {
                let normalized = if base.ends_with('/') { base.to_string() } else { format!("{}/", base) };
                Url::parse(&normalized).map_err(|e| BackendError::Validation(format!("{}: {}", base, e)))
            })
            .transpose()?;

        Ok(LocalObjectStorage {
            root: root.into(),
            public_base_url,
        })
    }

    fn download_url(&self, storage_path: &str, absolute: &Path) -> Result<String, BackendError> {
        let url = match &self.public_base_url {
            Some(base) => {
                let mut url = base.clone();
                url.path_segments_mut()
                    .map_err(|_| BackendError::Validation(format!("cannot append a path to {}", base)))?
                    .pop_if_empty()
                    .extend(storage_path.split('/'));
                url
            }
            None => Url::from_file_path(absolute)
                .map_err(|_| BackendError::Validation(format!("not an absolute path: {}", absolute.display())))?,
        };
        Ok(url.to_string())
    }
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn upload_scan_image(
        &self,
        user_id: &str,
        scan_id: &ScanId,
        local_path: &Path,
    ) -> Result<StoredObject, BackendError> {
        if user_id.is_empty() || user_id.contains(['/', '\\']) || user_id.contains("..") {
            return Err(BackendError::Validation(format!("invalid user id: {:?}", user_id)));
        }

        let storage_path = scan_storage_path(user_id, scan_id);
        let target = std::path::absolute(self.root.join(&storage_path))?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(local_path, &target).await?;

        let download_url = self.download_url(&storage_path, &target)?;
        tracing::info!("Stored scan {} at {}", scan_id, storage_path);

        Ok(StoredObject {
            storage_path,
            download_url,
        })
    }
}

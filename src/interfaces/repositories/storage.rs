use std::path::Path;

use async_trait::async_trait;

use crate::{
    entities::scan::{ScanId, StoredObject},
    errors::BackendError,
};

/// Binary object storage for scan images.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Uploads the file at `local_path` to a path derived from `(user_id, scan_id)`.
    /// Once this returns `Ok`, the binary is retrievable at the returned path.
    async fn upload_scan_image(
        &self,
        user_id: &str,
        scan_id: &ScanId,
        local_path: &Path,
    ) -> Result<StoredObject, BackendError>;
}

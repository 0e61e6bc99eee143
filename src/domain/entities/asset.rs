use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;
use validator::Validate;

/// A captured or selected image as handed over by the picker.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ScanAsset {
    /// Local path or `file://` URL.
    #[validate(length(min = 1, message = "Asset URI cannot be empty"))]
    pub uri: String,
    pub mime_type: Option<String>,
    pub file_name: Option<String>,
}

impl ScanAsset {
    pub fn new(uri: impl Into<String>) -> Self {
        ScanAsset {
            uri: uri.into(),
            mime_type: None,
            file_name: None,
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        ScanAsset {
            uri: path.to_string_lossy().into_owned(),
            mime_type: None,
            file_name: path.file_name().map(|n| n.to_string_lossy().into_owned()),
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Resolves the URI to a filesystem path. Returns `None` for non-file URLs.
    pub fn local_path(&self) -> Option<PathBuf> {
        if self.uri.contains("://") {
            let url = Url::parse(&self.uri).ok()?;
            if url.scheme() != "file" {
                return None;
            }
            return url.to_file_path().ok();
        }
        Some(PathBuf::from(&self.uri))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
        }
    }
}

/// Upload-ready image produced by the preprocessor.
///
/// The file at `path` is transient. The upload call that owns it discards it
/// once the storage upload returns; dropping the value removes it as well.
#[derive(Debug)]
pub struct CompressedImage {
    pub path: PathBuf,
    pub format: ImageFormat,
    pub quality: f32,
    pub byte_len: u64,
}

impl CompressedImage {
    pub fn new(path: PathBuf, format: ImageFormat, quality: f32, byte_len: u64) -> Self {
        CompressedImage {
            path,
            format,
            quality,
            byte_len,
        }
    }

    /// Removes the transient file without blocking the runtime.
    pub async fn discard(mut self) {
        let path = std::mem::take(&mut self.path);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::debug!("Could not remove transient image {}: {}", path.display(), e);
            }
        }
    }
}

/// Fallback for values dropped without [`CompressedImage::discard`], e.g. when
/// the owning future is cancelled.
impl Drop for CompressedImage {
    fn drop(&mut self) {
        if self.path.as_os_str().is_empty() {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::debug!("Could not remove transient image {}: {}", self.path.display(), e);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureSource {
    Camera,
    Library,
}

impl fmt::Display for CaptureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureSource::Camera => write!(f, "camera"),
            CaptureSource::Library => write!(f, "library"),
        }
    }
}

/// Outcome of asking the device for an image.
#[derive(Debug, Clone)]
pub enum Acquisition {
    Asset(ScanAsset),
    Cancelled,
    PermissionDenied,
}

use std::fmt;

use derive_more::Display;
use validator::ValidationErrors;

/// Failures surfaced by the upload pipeline and the scan cache.
#[derive(Debug, Display)]
pub enum ScanError {
    #[display("Authentication required")]
    AuthenticationRequired,

    #[display("Upload failed: {_0}")]
    UploadFailed(String),

    #[display("Fetch failed: {_0}")]
    FetchFailed(String),

    #[display("Invalid request: {_0}")]
    InvalidRequest(String),
}

impl std::error::Error for ScanError {}

impl From<PreprocessError> for ScanError {
    fn from(err: PreprocessError) -> Self {
        ScanError::UploadFailed(err.to_string())
    }
}

impl From<ValidationErrors> for ScanError {
    fn from(errors: ValidationErrors) -> Self {
        let messages = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "Invalid value".to_string());
                    format!("{}:{}", field, message)
                })
            })
            .collect::<Vec<_>>()
            .join(", ");

        ScanError::InvalidRequest(messages)
    }
}

/// Turning an asset into an upload-ready JPEG failed.
#[derive(Debug, Display)]
pub enum PreprocessError {
    #[display("Unreadable image: {_0}")]
    Unreadable(String),

    #[display("Unsupported image format: {_0}")]
    UnsupportedFormat(String),

    #[display("Encoding failed: {_0}")]
    EncodeFailed(String),
}

impl std::error::Error for PreprocessError {}

impl From<image::ImageError> for PreprocessError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Unsupported(e) => PreprocessError::UnsupportedFormat(e.to_string()),
            image::ImageError::Decoding(e) => PreprocessError::Unreadable(e.to_string()),
            image::ImageError::IoError(e) => PreprocessError::Unreadable(e.to_string()),
            other => PreprocessError::EncodeFailed(other.to_string()),
        }
    }
}

/// Errors reported by the storage and document-store collaborators.
#[derive(Debug)]
pub enum BackendError {
    Transport(String),
    Validation(String),
    NotFound(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Transport(msg) => write!(f, "Transport error: {}", msg),
            BackendError::Validation(msg) => write!(f, "Validation error: {}", msg),
            BackendError::NotFound(msg) => write!(f, "Not found: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => BackendError::NotFound(err.to_string()),
            _ => BackendError::Transport(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::cache::PageRequest;
    use validator::Validate;

    #[test]
    fn validation_errors_name_the_field() {
        let err: ScanError = PageRequest::new(0, 10).validate().unwrap_err().into();
        let text = err.to_string();
        assert!(text.starts_with("Invalid request: page:"), "{}", text);
    }

    #[test]
    fn preprocess_errors_surface_as_upload_failures() {
        let err: ScanError = PreprocessError::UnsupportedFormat("image/heic".into()).into();
        assert_eq!(err.to_string(), "Upload failed: Unsupported image format: image/heic");
    }
}

use serde::Serialize;

use super::asset::CaptureSource;

/// A user-facing alert. Every failure caught at the pipeline or cache
/// boundary ends up as one of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Notice {
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn authentication_required() -> Self {
        Notice::new("Authentication Required", "Please sign in to upload a scan.")
    }

    pub fn upload_failed() -> Self {
        Notice::new("Upload Failed", "We could not upload your scan. Please try again.")
    }

    pub fn media_unavailable() -> Self {
        Notice::new("Upload Failed", "We were unable to access your media. Please try again.")
    }

    pub fn fetch_failed() -> Self {
        Notice::new("Unable to Load Scans", "We could not refresh your scan history. Please try again.")
    }

    pub fn permission_required(source: CaptureSource) -> Self {
        match source {
            CaptureSource::Camera => Notice::new(
                "Permission Required",
                "Camera access is needed to capture a new scan.",
            ),
            CaptureSource::Library => Notice::new(
                "Permission Required",
                "Media library access is needed to upload a scan.",
            ),
        }
    }

    pub fn scan_uploaded(source: CaptureSource) -> Self {
        match source {
            CaptureSource::Camera => Notice::new(
                "Scan Uploaded",
                "Your photo has been uploaded. Analysis will appear shortly.",
            ),
            CaptureSource::Library => Notice::new(
                "Scan Uploaded",
                "Your selected image has been uploaded. Analysis will appear shortly.",
            ),
        }
    }
}

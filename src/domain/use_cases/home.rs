use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    entities::{
        asset::{Acquisition, CaptureSource},
        cache::FIRST_PAGE,
        notice::Notice,
        scan::{ScanId, ScanRecord, UploadScanResult},
    },
    repositories::{
        device::{ImageSource, Notifier},
        preprocessor::ImagePreprocessor,
        scan::ScanRepository,
        session::{AuthProvider, ProfileGuard},
        storage::ObjectStorage,
    },
};

use super::{scan_cache::ScanCache, upload::UploadScanHandler};

/// The home screen only shows the newest scan.
const LATEST_SCAN_PAGE_SIZE: u32 = 1;

const UPLOAD_ACTION: &str = "upload a scan";
const HISTORY_ACTION: &str = "view scan history";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestScanSummary {
    pub scan_id: ScanId,
    pub status_label: String,
    pub captured_at: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
}

impl From<&ScanRecord> for LatestScanSummary {
    fn from(record: &ScanRecord) -> Self {
        LatestScanSummary {
            scan_id: record.scan_id.clone(),
            status_label: record.status.label(),
            captured_at: record.display_timestamp(),
            image_url: Some(record.download_url.clone()).filter(|url| !url.is_empty()),
        }
    }
}

/// What the "Latest Scan" section renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LatestScanPanel {
    Locked,
    Loading,
    Empty,
    Scan(LatestScanSummary),
}

/// Wires the upload pipeline and the scan cache behind the profile gate.
pub struct HomeScreenController<P, S, R, I>
where
    P: ImagePreprocessor,
    S: ObjectStorage,
    R: ScanRepository,
    I: ImageSource,
{
    pub uploader: UploadScanHandler<P, S, R>,
    pub scans: ScanCache<R>,
    pub image_source: I,
    auth: Arc<dyn AuthProvider>,
    profile: Arc<dyn ProfileGuard>,
    notifier: Arc<dyn Notifier>,
}

impl<P, S, R, I> HomeScreenController<P, S, R, I>
where
    P: ImagePreprocessor,
    S: ObjectStorage,
    R: ScanRepository,
    I: ImageSource,
{
    pub fn new(
        uploader: UploadScanHandler<P, S, R>,
        scans: ScanCache<R>,
        image_source: I,
        auth: Arc<dyn AuthProvider>,
        profile: Arc<dyn ProfileGuard>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        HomeScreenController {
            uploader,
            scans,
            image_source,
            auth,
            profile,
            notifier,
        }
    }

    /// Enables or disables the scan cache to match profile completeness.
    pub async fn sync_profile_gate(&self) {
        self.scans.set_enabled(self.profile.is_profile_complete()).await;
    }

    /// Picks an image, uploads it and refreshes the latest scan.
    pub async fn upload_from(&self, source: CaptureSource) -> Option<UploadScanResult> {
        if !self.profile.ensure_profile_complete(UPLOAD_ACTION) {
            return None;
        }

        let asset = match self.image_source.acquire(source).await {
            Ok(Acquisition::Asset(asset)) => asset,
            Ok(Acquisition::Cancelled) => return None,
            Ok(Acquisition::PermissionDenied) => {
                self.notifier.notify(Notice::permission_required(source));
                return None;
            }
            Err(e) => {
                tracing::error!("Image selection error: {}", e);
                self.notifier.notify(Notice::media_unavailable());
                return None;
            }
        };

        let uploaded = self.uploader.upload_scan(&asset).await?;

        self.refresh_after_upload().await;
        self.notifier.notify(Notice::scan_uploaded(source));

        Some(uploaded)
    }

    /// Recovery sequence after a mutation. Clearing first keeps a racing
    /// background fetch from leaving stale data between the two refreshes.
    pub async fn refresh_after_upload(&self) {
        self.scans.clear_cache();
        self.scans.fetch_total_count().await;
        self.scans.fetch_page(FIRST_PAGE, LATEST_SCAN_PAGE_SIZE).await;
    }

    /// Returns whether navigation to the history screen may proceed.
    pub fn view_history(&self) -> bool {
        self.profile.ensure_profile_complete(HISTORY_ACTION)
    }

    pub fn is_uploading(&self) -> bool {
        self.uploader.is_uploading()
    }

    pub fn upload_disabled(&self) -> bool {
        !self.profile.is_profile_complete() || self.uploader.is_uploading()
    }

    pub fn history_disabled(&self) -> bool {
        !self.profile.is_profile_complete()
    }

    pub fn greeting_name(&self) -> String {
        self.auth
            .current_user()
            .map(|user| user.greeting_name())
            .unwrap_or_else(|| "Explorer".to_string())
    }

    pub fn latest_scan_summary(&self) -> Option<LatestScanSummary> {
        self.scans.latest_scan().as_ref().map(LatestScanSummary::from)
    }

    pub fn latest_scan_panel(&self) -> LatestScanPanel {
        if !self.profile.is_profile_complete() {
            LatestScanPanel::Locked
        } else if self.scans.is_loading() {
            LatestScanPanel::Loading
        } else {
            match self.latest_scan_summary() {
                Some(summary) => LatestScanPanel::Scan(summary),
                None => LatestScanPanel::Empty,
            }
        }
    }
}

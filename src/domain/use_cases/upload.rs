use std::sync::{atomic::AtomicUsize, Arc};

use validator::Validate;

use crate::{
    entities::{
        asset::ScanAsset,
        notice::Notice,
        scan::{NewScanRecord, ScanId, UploadScanResult},
    },
    errors::ScanError,
    repositories::{
        device::Notifier, preprocessor::ImagePreprocessor, scan::ScanRepository,
        session::AuthProvider, storage::ObjectStorage,
    },
};

use super::in_flight::{any_in_flight, InFlightGuard};

/// Turns a captured image into a stored binary plus a `pending_analysis` record.
///
/// Concurrent calls are allowed and run independently; `is_uploading` stays
/// `true` while at least one of them is in flight.
pub struct UploadScanHandler<P, S, R>
where
    P: ImagePreprocessor,
    S: ObjectStorage,
    R: ScanRepository,
{
    pub preprocessor: P,
    pub storage: S,
    pub scan_repo: R,
    auth: Arc<dyn AuthProvider>,
    notifier: Arc<dyn Notifier>,
    in_flight: AtomicUsize,
}

impl<P, S, R> UploadScanHandler<P, S, R>
where
    P: ImagePreprocessor,
    S: ObjectStorage,
    R: ScanRepository,
{
    pub fn new(
        preprocessor: P,
        storage: S,
        scan_repo: R,
        auth: Arc<dyn AuthProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        UploadScanHandler {
            preprocessor,
            storage,
            scan_repo,
            auth,
            notifier,
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn is_uploading(&self) -> bool {
        any_in_flight(&self.in_flight)
    }

    /// Uploads a scan, reporting any failure to the user.
    /// Returns `None` when nothing (or only an orphaned binary) was stored.
    pub async fn upload_scan(&self, asset: &ScanAsset) -> Option<UploadScanResult> {
        match self.try_upload_scan(asset).await {
            Ok(result) => Some(result),
            Err(ScanError::AuthenticationRequired) => {
                tracing::warn!("Upload attempted without a signed-in user");
                self.notifier.notify(Notice::authentication_required());
                None
            }
            Err(e) => {
                tracing::error!("Upload scan failed: {}", e);
                self.notifier.notify(Notice::upload_failed());
                None
            }
        }
    }

    /// Same pipeline as [`upload_scan`](Self::upload_scan) without the user-facing
    /// notification, for callers that need the failure reason.
    pub async fn try_upload_scan(&self, asset: &ScanAsset) -> Result<UploadScanResult, ScanError> {
        let user = self
            .auth
            .current_user()
            .ok_or(ScanError::AuthenticationRequired)?;

        let _uploading = InFlightGuard::enter(&self.in_flight);

        asset
            .validate()
            .map_err(|e| ScanError::UploadFailed(format!("invalid asset: {}", e)))?;

        let compressed = self.preprocessor.compress(asset).await?;

        // Minted before the upload so the storage path and the record share it.
        let scan_id = ScanId::generate();

        let uploaded = self
            .storage
            .upload_scan_image(&user.uid, &scan_id, &compressed.path)
            .await;
        compressed.discard().await;

        let stored = uploaded
            .map_err(|e| ScanError::UploadFailed(format!("storage upload for scan {}: {}", scan_id, e)))?;

        let record = NewScanRecord::pending(&user.uid, scan_id.clone(), stored.clone());
        self.scan_repo
            .create_scan_document(&record)
            .await
            .map_err(|e| {
                tracing::warn!(
                    "Binary for scan {} is stored at {} but has no record",
                    scan_id,
                    stored.storage_path
                );
                ScanError::UploadFailed(format!("record creation for scan {}: {}", scan_id, e))
            })?;

        // Analysis is picked up by whatever processes `pending_analysis` records.
        tracing::info!("Uploaded scan {} for user {}", scan_id, user.uid);

        Ok(UploadScanResult {
            scan_id,
            storage_path: stored.storage_path,
            download_url: stored.download_url,
        })
    }
}

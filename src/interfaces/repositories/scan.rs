use async_trait::async_trait;

use crate::{
    entities::scan::{NewScanRecord, ScanRecord},
    errors::BackendError,
};

/// Document store holding one record per scan.
#[async_trait]
pub trait ScanRepository: Send + Sync {
    /// Persists a new scan record. The store assigns `created_at`/`updated_at`.
    async fn create_scan_document(&self, record: &NewScanRecord) -> Result<(), BackendError>;

    /// Returns one page of the user's scans, most recent first. `page` is 1-based.
    async fn list_scans(&self, user_id: &str, page: u32, page_size: u32) -> Result<Vec<ScanRecord>, BackendError>;

    /// Authoritative number of scans owned by the user.
    async fn count_scans(&self, user_id: &str) -> Result<u64, BackendError>;
}

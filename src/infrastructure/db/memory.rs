use std::{cmp::Ordering, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use crate::{
    entities::scan::{NewScanRecord, ScanRecord},
    errors::BackendError,
    repositories::scan::ScanRepository,
};

/// Helper to compute the slice start from a 1-based `page` and `page_size`.
fn page_offset(page: u32, page_size: u32) -> usize {
    let page = page.saturating_sub(1);
    (page as usize).saturating_mul(page_size as usize)
}

/// Most recent first: capture time, falling back to creation then update time.
/// Records without any timestamp sort last; ties break on scan id, descending.
fn newest_first(a: &ScanRecord, b: &ScanRecord) -> Ordering {
    b.display_timestamp()
        .cmp(&a.display_timestamp())
        .then_with(|| b.scan_id.cmp(&a.scan_id))
}

/// Document store kept in process memory, keyed by user.
#[derive(Debug, Clone, Default)]
pub struct InMemoryScanRepo {
    scans: Arc<DashMap<String, Vec<ScanRecord>>>,
}

impl InMemoryScanRepo {
    pub fn new() -> Self {
        InMemoryScanRepo::default()
    }

    /// Inserts or replaces a fully formed record, e.g. one updated by an analysis job.
    pub fn upsert(&self, record: ScanRecord) {
        let mut scans = self.scans.entry(record.user_id.clone()).or_default();
        scans.retain(|existing| existing.scan_id != record.scan_id);
        scans.push(record);
        scans.sort_by(newest_first);
    }

    pub fn remove(&self, user_id: &str, scan_id: &str) -> bool {
        match self.scans.get_mut(user_id) {
            Some(mut scans) => {
                let before = scans.len();
                scans.retain(|existing| existing.scan_id.as_str() != scan_id);
                before != scans.len()
            }
            None => false,
        }
    }
}

#[async_trait]
impl ScanRepository for InMemoryScanRepo {
    async fn create_scan_document(&self, record: &NewScanRecord) -> Result<(), BackendError> {
        if record.user_id.trim().is_empty() {
            return Err(BackendError::Validation("scan record has no owner".to_string()));
        }

        let mut scans = self.scans.entry(record.user_id.clone()).or_default();
        if scans.iter().any(|existing| existing.scan_id == record.scan_id) {
            return Err(BackendError::Validation(format!("scan {} already exists", record.scan_id)));
        }
        scans.push(record.clone().into_record(Utc::now()));
        scans.sort_by(newest_first);

        Ok(())
    }

    async fn list_scans(&self, user_id: &str, page: u32, page_size: u32) -> Result<Vec<ScanRecord>, BackendError> {
        if page == 0 || page_size == 0 {
            return Err(BackendError::Validation("page and page size start at 1".to_string()));
        }

        let records = self
            .scans
            .get(user_id)
            .map(|scans| {
                scans
                    .iter()
                    .skip(page_offset(page, page_size))
                    .take(page_size as usize)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        Ok(records)
    }

    async fn count_scans(&self, user_id: &str) -> Result<u64, BackendError> {
        Ok(self.scans.get(user_id).map(|scans| scans.len() as u64).unwrap_or(0))
    }
}

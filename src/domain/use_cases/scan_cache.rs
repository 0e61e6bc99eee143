use std::{
    collections::BTreeMap,
    sync::{atomic::AtomicUsize, Arc},
};

use chrono::Utc;
use parking_lot::Mutex;
use validator::Validate;

use crate::{
    constants::DEFAULT_INITIAL_PAGE_SIZE,
    entities::{
        cache::{page_count, CachePage, CacheSnapshot, CacheStatus, PageRequest, FIRST_PAGE},
        notice::Notice,
        scan::ScanRecord,
    },
    errors::ScanError,
    repositories::{device::Notifier, scan::ScanRepository},
};

use super::in_flight::{any_in_flight, InFlightGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanCacheOptions {
    /// Page size used for the automatic fetch of page 1 when the cache is enabled.
    pub initial_page_size: u32,
    pub enabled: bool,
}

impl Default for ScanCacheOptions {
    fn default() -> Self {
        ScanCacheOptions {
            initial_page_size: DEFAULT_INITIAL_PAGE_SIZE,
            enabled: false,
        }
    }
}

#[derive(Debug, Default)]
struct CacheState {
    pages: BTreeMap<u32, CachePage>,
    total_count: Option<u64>,
    enabled: bool,
}

/// Paginated view of one user's scans.
///
/// Build a fresh instance per signed-in user. The latest scan is always read
/// from the cached first page, so after a mutation it must be refreshed by
/// re-fetching page 1 rather than patched locally.
pub struct ScanCache<R>
where
    R: ScanRepository,
{
    pub scan_repo: R,
    user_id: String,
    initial_page_size: u32,
    notifier: Arc<dyn Notifier>,
    state: Mutex<CacheState>,
    in_flight: AtomicUsize,
}

impl<R> ScanCache<R>
where
    R: ScanRepository,
{
    /// Creates a disabled cache. Nothing is fetched until [`set_enabled`](Self::set_enabled).
    pub fn new(scan_repo: R, user_id: impl Into<String>, initial_page_size: u32, notifier: Arc<dyn Notifier>) -> Self {
        ScanCache {
            scan_repo,
            user_id: user_id.into(),
            initial_page_size,
            notifier,
            state: Mutex::new(CacheState::default()),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Creates the cache and applies `options.enabled`, priming page 1 if enabled.
    pub async fn open(
        scan_repo: R,
        user_id: impl Into<String>,
        options: ScanCacheOptions,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let cache = ScanCache::new(scan_repo, user_id, options.initial_page_size, notifier);
        cache.set_enabled(options.enabled).await;
        cache
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn initial_page_size(&self) -> u32 {
        self.initial_page_size
    }

    pub fn is_enabled(&self) -> bool {
        self.state.lock().enabled
    }

    /// Applies the external gate. Turning the cache on fetches page 1 once;
    /// turning it off drops everything cached.
    pub async fn set_enabled(&self, enabled: bool) {
        let was_enabled = {
            let mut state = self.state.lock();
            let was_enabled = state.enabled;
            state.enabled = enabled;
            if !enabled {
                state.pages.clear();
                state.total_count = None;
            }
            was_enabled
        };

        if enabled && !was_enabled {
            tracing::debug!("Scan cache enabled for user {}", self.user_id);
            self.fetch_page(FIRST_PAGE, self.initial_page_size).await;
        }
    }

    /// Fetches one page and stores it in place of any previous copy.
    pub async fn fetch_page(&self, page: u32, page_size: u32) -> Option<Vec<ScanRecord>> {
        if !self.is_enabled() {
            tracing::debug!("Ignoring fetch of page {} while the scan cache is disabled", page);
            return None;
        }

        match self.load_page(PageRequest::new(page, page_size)).await {
            Ok(records) => Some(records),
            Err(e) => {
                self.report(&e);
                None
            }
        }
    }

    /// Asks the backend for the authoritative number of scans.
    pub async fn fetch_total_count(&self) -> Option<u64> {
        if !self.is_enabled() {
            return None;
        }

        match self.load_total_count().await {
            Ok(total) => Some(total),
            Err(e) => {
                self.report(&e);
                None
            }
        }
    }

    /// Drops all pages and the total count. No network access.
    pub fn clear_cache(&self) {
        let mut state = self.state.lock();
        state.pages.clear();
        state.total_count = None;
    }

    async fn load_page(&self, request: PageRequest) -> Result<Vec<ScanRecord>, ScanError> {
        request.validate()?;

        let _loading = InFlightGuard::enter(&self.in_flight);

        let records = self
            .scan_repo
            .list_scans(&self.user_id, request.page, request.page_size)
            .await
            .map_err(|e| ScanError::FetchFailed(format!("page {}: {}", request.page, e)))?;

        let mut state = self.state.lock();
        if state.enabled {
            state.pages.insert(
                request.page,
                CachePage {
                    page: request.page,
                    page_size: request.page_size,
                    records: records.clone(),
                    fetched_at: Utc::now(),
                },
            );
        }

        Ok(records)
    }

    async fn load_total_count(&self) -> Result<u64, ScanError> {
        let _loading = InFlightGuard::enter(&self.in_flight);

        let total = self
            .scan_repo
            .count_scans(&self.user_id)
            .await
            .map_err(|e| ScanError::FetchFailed(format!("total count: {}", e)))?;

        let mut state = self.state.lock();
        if state.enabled {
            state.total_count = Some(total);
        }

        Ok(total)
    }

    fn report(&self, err: &ScanError) {
        match err {
            ScanError::InvalidRequest(_) => tracing::warn!("Rejected scan cache request: {}", err),
            _ => {
                tracing::warn!("Scan cache refresh failed for user {}: {}", self.user_id, err);
                self.notifier.notify(Notice::fetch_failed());
            }
        }
    }

    /// First record of the cached first page.
    pub fn latest_scan(&self) -> Option<ScanRecord> {
        self.state
            .lock()
            .pages
            .get(&FIRST_PAGE)
            .and_then(|page| page.records.first().cloned())
    }

    pub fn is_loading(&self) -> bool {
        any_in_flight(&self.in_flight)
    }

    pub fn total_count(&self) -> Option<u64> {
        self.state.lock().total_count
    }

    pub fn page(&self, page: u32) -> Option<CachePage> {
        self.state.lock().pages.get(&page).cloned()
    }

    /// Every cached record, in page order.
    pub fn records(&self) -> Vec<ScanRecord> {
        self.state
            .lock()
            .pages
            .values()
            .flat_map(|page| page.records.iter().cloned())
            .collect()
    }

    /// Pages needed to show every scan, once the total count is known.
    pub fn total_pages(&self, page_size: u32) -> Option<u32> {
        self.total_count().map(|total| page_count(total, page_size))
    }

    /// Whether a page follows `page`. Without a known total this guesses from
    /// whether the cached page came back full.
    pub fn has_next_page(&self, page: u32, page_size: u32) -> bool {
        match self.total_count() {
            Some(total) => (page as u64).saturating_mul(page_size as u64) < total,
            None => self
                .page(page)
                .is_some_and(|cached| cached.records.len() == page_size as usize),
        }
    }

    pub fn status(&self) -> CacheStatus {
        let state = self.state.lock();
        if !state.enabled {
            CacheStatus::Disabled
        } else if self.is_loading() {
            CacheStatus::Loading
        } else if state.pages.is_empty() && state.total_count.is_none() {
            CacheStatus::Empty
        } else {
            CacheStatus::Ready
        }
    }

    pub fn snapshot(&self) -> CacheSnapshot {
        let state = self.state.lock();
        CacheSnapshot {
            latest_scan: state
                .pages
                .get(&FIRST_PAGE)
                .and_then(|page| page.records.first().cloned()),
            pages: state.pages.clone(),
            total_count: state.total_count,
            is_loading: self.is_loading(),
            enabled: state.enabled,
        }
    }
}

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use validator::Validate;

use crate::constants::MAX_PAGE_SIZE;

use super::scan::ScanRecord;

/// Pages are numbered from 1.
pub const FIRST_PAGE: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Validate)]
pub struct PageRequest {
    #[validate(range(min = 1, message = "Pages are numbered from 1"))]
    pub page: u32,

    #[validate(range(min = 1, max = MAX_PAGE_SIZE, message = "Page size must be between 1 and 100"))]
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        PageRequest { page, page_size }
    }
}

/// One fetched page. Re-fetching the same page replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CachePage {
    pub page: u32,
    pub page_size: u32,
    pub records: Vec<ScanRecord>,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheStatus {
    Disabled,
    Loading,
    Ready,
    Empty,
}

/// Point-in-time copy of the cache, safe to hand to a renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheSnapshot {
    pub pages: BTreeMap<u32, CachePage>,
    pub total_count: Option<u64>,
    pub latest_scan: Option<ScanRecord>,
    pub is_loading: bool,
    pub enabled: bool,
}

/// Number of pages needed to show `total` records.
pub fn page_count(total: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size as u64).min(u32::MAX as u64) as u32
}

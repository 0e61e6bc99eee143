use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque scan identifier, minted on the client before any upload begins.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanId(String);

impl ScanId {
    /// Allocates a fresh identifier locally. No backend round-trip is involved,
    /// so the storage path can be derived before the document exists.
    pub fn generate() -> Self {
        ScanId(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ScanId {
    fn from(value: &str) -> Self {
        ScanId(value.to_string())
    }
}

impl From<String> for ScanId {
    fn from(value: String) -> Self {
        ScanId(value)
    }
}

impl fmt::Display for ScanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Analysis status of a scan. Unknown values reported by the backend are kept
/// verbatim in `Other`; a missing or null status becomes `Other("")`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum ScanStatus {
    PendingAnalysis,
    Analyzed,
    Failed,
    Other(String),
}

impl ScanStatus {
    /// Status of a record the backend sent without one.
    pub fn unreported() -> Self {
        ScanStatus::Other(String::new())
    }

    pub fn as_str(&self) -> &str {
        match self {
            ScanStatus::PendingAnalysis => "pending_analysis",
            ScanStatus::Analyzed => "analyzed",
            ScanStatus::Failed => "failed",
            ScanStatus::Other(raw) => raw.as_str(),
        }
    }

    /// Upper-cased label shown on the latest scan card.
    pub fn label(&self) -> String {
        match self {
            ScanStatus::Other(raw) if raw.trim().is_empty() => "PENDING".to_string(),
            status => status.as_str().to_uppercase(),
        }
    }
}

impl From<String> for ScanStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "pending_analysis" => ScanStatus::PendingAnalysis,
            "analyzed" => ScanStatus::Analyzed,
            "failed" => ScanStatus::Failed,
            _ => ScanStatus::Other(value),
        }
    }
}

impl From<Option<String>> for ScanStatus {
    fn from(value: Option<String>) -> Self {
        value.map(ScanStatus::from).unwrap_or_else(ScanStatus::unreported)
    }
}

impl From<ScanStatus> for String {
    fn from(status: ScanStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRecord {
    pub scan_id: ScanId,
    pub user_id: String,
    pub image_path: String,
    pub download_url: String,
    #[serde(default = "ScanStatus::unreported")]
    pub status: ScanStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub captured_at: Option<DateTime<Utc>>,
}

impl ScanRecord {
    /// Best timestamp to show for this scan: capture time, then creation, then last update.
    pub fn display_timestamp(&self) -> Option<DateTime<Utc>> {
        self.captured_at.or(self.created_at).or(self.updated_at)
    }
}

/// Document submitted to the store once the binary is durable.
/// Timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewScanRecord {
    pub scan_id: ScanId,
    pub user_id: String,
    pub image_path: String,
    pub download_url: String,
    pub status: ScanStatus,
}

impl NewScanRecord {
    pub fn pending(user_id: &str, scan_id: ScanId, stored: StoredObject) -> Self {
        NewScanRecord {
            scan_id,
            user_id: user_id.to_string(),
            image_path: stored.storage_path,
            download_url: stored.download_url,
            status: ScanStatus::PendingAnalysis,
        }
    }

    pub fn into_record(self, now: DateTime<Utc>) -> ScanRecord {
        ScanRecord {
            scan_id: self.scan_id,
            user_id: self.user_id,
            image_path: self.image_path,
            download_url: self.download_url,
            status: self.status,
            created_at: Some(now),
            updated_at: Some(now),
            captured_at: None,
        }
    }
}

/// Where object storage put an uploaded binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredObject {
    pub storage_path: String,
    pub download_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadScanResult {
    pub scan_id: ScanId,
    pub storage_path: String,
    pub download_url: String,
}

/// Object storage path for a scan binary.
pub fn scan_storage_path(user_id: &str, scan_id: &ScanId) -> String {
    format!("scans/{}/{}.jpg", user_id, scan_id)
}

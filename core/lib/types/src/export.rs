use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ExportBatchId, ExportConfigId, SignatureInfoId};

/// A signing-key binding used when assembling a `TEKSignatureList` (spec §6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureInfo {
    pub id: SignatureInfoId,
    /// Opaque to the core; resolved by the KMS facade at sign time.
    pub signing_key_resource_id: String,
    pub key_id: String,
    pub key_version: String,
    pub bundle_id: String,
    pub app_package_name: String,
}

/// Recurring export-generation policy for one output region (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    pub id: ExportConfigId,
    pub period: Duration,
    pub from: DateTime<Utc>,
    pub thru: Option<DateTime<Utc>>,
    pub output_region: String,
    pub input_regions: Vec<String>,
    pub bucket_name: String,
    pub filename_root: String,
    pub signature_info_ids: Vec<SignatureInfoId>,
    pub max_records_override: Option<i64>,
    pub include_travelers: bool,
    pub exclude_regions: Vec<String>,
}

impl ExportConfig {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.from <= now && self.thru.map(|thru| now < thru).unwrap_or(true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "export_batch_status", rename_all = "UPPERCASE")]
pub enum ExportBatchStatus {
    Open,
    Pending,
    Complete,
    Deleted,
}

/// One contiguous, half-open `[start_timestamp, end_timestamp)` time window
/// of a config, materialized into zero or more `ExportFile`s by the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportBatch {
    pub id: ExportBatchId,
    pub config_id: ExportConfigId,
    pub start_timestamp: DateTime<Utc>,
    pub end_timestamp: DateTime<Utc>,
    pub output_region: String,
    pub status: ExportBatchStatus,
    pub lease_expires: Option<DateTime<Utc>>,
    pub signature_info_ids: Vec<SignatureInfoId>,
    pub input_regions: Vec<String>,
}

impl ExportBatch {
    pub fn lease_expired(&self, now: DateTime<Utc>) -> bool {
        match self.lease_expires {
            Some(expires) => now >= expires,
            None => true,
        }
    }

    /// A batch is re-eligible for claiming when it is OPEN, or PENDING with
    /// an expired lease (spec §4.5 step 1 / §5 "stale PENDING").
    pub fn is_claimable(&self, now: DateTime<Utc>) -> bool {
        match self.status {
            ExportBatchStatus::Open => true,
            ExportBatchStatus::Pending => self.lease_expired(now),
            ExportBatchStatus::Complete | ExportBatchStatus::Deleted => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "export_file_status", rename_all = "UPPERCASE")]
pub enum ExportFileStatus {
    Active,
    Expired,
}

/// One physical artifact (zip) within a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportFile {
    pub batch_id: ExportBatchId,
    pub filename: String,
    pub batch_num: i32,
    pub batch_size: i32,
    pub region: String,
    pub status: ExportFileStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(status: ExportBatchStatus, lease_expires: Option<DateTime<Utc>>) -> ExportBatch {
        ExportBatch {
            id: ExportBatchId(1),
            config_id: ExportConfigId(1),
            start_timestamp: Utc::now(),
            end_timestamp: Utc::now(),
            output_region: "TEST".to_string(),
            status,
            lease_expires,
            signature_info_ids: vec![],
            input_regions: vec!["TEST".to_string()],
        }
    }

    #[test]
    fn open_batch_is_always_claimable() {
        assert!(batch(ExportBatchStatus::Open, None).is_claimable(Utc::now()));
    }

    #[test]
    fn pending_batch_claimable_only_after_lease_expiry() {
        let now = Utc::now();
        let still_leased = batch(ExportBatchStatus::Pending, Some(now + Duration::minutes(5)));
        assert!(!still_leased.is_claimable(now));

        let expired = batch(ExportBatchStatus::Pending, Some(now - Duration::minutes(5)));
        assert!(expired.is_claimable(now));
    }

    #[test]
    fn complete_and_deleted_are_never_claimable() {
        let now = Utc::now();
        assert!(!batch(ExportBatchStatus::Complete, None).is_claimable(now));
        assert!(!batch(ExportBatchStatus::Deleted, None).is_claimable(now));
    }
}

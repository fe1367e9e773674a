use chrono::{DateTime, Duration, Utc};
use enserver_types::{
    ExportBatch, ExportBatchId, ExportBatchStatus, ExportConfig, ExportConfigId, ExportFile,
    ExportFileStatus, SignatureInfo, SignatureInfoId,
};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StorageExportConfig {
    pub id: i64,
    pub period_seconds: i64,
    pub from_timestamp: DateTime<Utc>,
    pub thru_timestamp: Option<DateTime<Utc>>,
    pub output_region: String,
    pub input_regions: Vec<String>,
    pub bucket_name: String,
    pub filename_root: String,
    pub signature_info_ids: Vec<i64>,
    pub max_records_override: Option<i64>,
    pub include_travelers: bool,
    pub exclude_regions: Vec<String>,
}

impl From<StorageExportConfig> for ExportConfig {
    fn from(row: StorageExportConfig) -> Self {
        ExportConfig {
            id: ExportConfigId(row.id),
            period: Duration::seconds(row.period_seconds),
            from: row.from_timestamp,
            thru: row.thru_timestamp,
            output_region: row.output_region,
            input_regions: row.input_regions,
            bucket_name: row.bucket_name,
            filename_root: row.filename_root,
            signature_info_ids: row.signature_info_ids.into_iter().map(SignatureInfoId).collect(),
            max_records_override: row.max_records_override,
            include_travelers: row.include_travelers,
            exclude_regions: row.exclude_regions,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StorageExportBatch {
    pub id: i64,
    pub config_id: i64,
    pub start_timestamp: DateTime<Utc>,
    pub end_timestamp: DateTime<Utc>,
    pub output_region: String,
    pub status: ExportBatchStatus,
    pub lease_expires: Option<DateTime<Utc>>,
    pub signature_info_ids: Vec<i64>,
    pub input_regions: Vec<String>,
}

impl From<StorageExportBatch> for ExportBatch {
    fn from(row: StorageExportBatch) -> Self {
        ExportBatch {
            id: ExportBatchId(row.id),
            config_id: ExportConfigId(row.config_id),
            start_timestamp: row.start_timestamp,
            end_timestamp: row.end_timestamp,
            output_region: row.output_region,
            status: row.status,
            lease_expires: row.lease_expires,
            signature_info_ids: row.signature_info_ids.into_iter().map(SignatureInfoId).collect(),
            input_regions: row.input_regions,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StorageExportFile {
    pub batch_id: i64,
    pub filename: String,
    pub batch_num: i32,
    pub batch_size: i32,
    pub region: String,
    pub status: ExportFileStatus,
}

impl From<StorageExportFile> for ExportFile {
    fn from(row: StorageExportFile) -> Self {
        ExportFile {
            batch_id: ExportBatchId(row.batch_id),
            filename: row.filename,
            batch_num: row.batch_num,
            batch_size: row.batch_size,
            region: row.region,
            status: row.status,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StorageSignatureInfo {
    pub id: i64,
    pub signing_key_resource_id: String,
    pub key_id: String,
    pub key_version: String,
    pub bundle_id: String,
    pub app_package_name: String,
}

impl From<StorageSignatureInfo> for SignatureInfo {
    fn from(row: StorageSignatureInfo) -> Self {
        SignatureInfo {
            id: SignatureInfoId(row.id),
            signing_key_resource_id: row.signing_key_resource_id,
            key_id: row.key_id,
            key_version: row.key_version,
            bundle_id: row.bundle_id,
            app_package_name: row.app_package_name,
        }
    }
}

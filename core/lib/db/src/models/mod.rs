pub mod storage_authorized_app;
pub mod storage_export;
pub mod storage_exposure;
pub mod storage_health_authority;
pub mod storage_revision_key;
pub mod storage_stats;

pub use storage_authorized_app::StorageAuthorizedApp;
pub use storage_export::{
    StorageExportBatch, StorageExportConfig, StorageExportFile, StorageSignatureInfo,
};
pub use storage_exposure::StorageExposure;
pub use storage_health_authority::{
    assemble_health_authority, StorageHealthAuthority, StorageHealthAuthorityKey,
};
pub use storage_revision_key::StorageRevisionKey;
pub use storage_stats::StorageHealthAuthorityStats;

//! Shared data model for the exposure-notification key server (spec §3).
//!
//! This crate only defines the domain types; persistence lives in
//! `enserver_db`, which maps these to/from Postgres rows the way
//! `zksync_dal`'s `models` module maps storage rows to domain types.

pub mod authorized_app;
pub mod export;
pub mod exposure;
pub mod federation;
pub mod health_authority;
pub mod ids;
pub mod revision_key;
pub mod revision_token;
pub mod stats;

pub use authorized_app::AuthorizedApp;
pub use export::{ExportBatch, ExportBatchStatus, ExportConfig, ExportFile, ExportFileStatus, SignatureInfo};
pub use exposure::{Exposure, ReportType, RevisedShadow};
pub use federation::FederationCursor;
pub use health_authority::{HealthAuthority, HealthAuthorityKey};
pub use ids::{
    AuthorizedAppId, ExportBatchId, ExportConfigId, HealthAuthorityId, RevisionKeyId,
    SignatureInfoId,
};
pub use revision_key::RevisionKeyMeta;
pub use revision_token::{RevisionToken, RevisionTokenEntry};
pub use stats::HealthAuthorityStats;

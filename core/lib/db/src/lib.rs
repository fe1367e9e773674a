//! Transactional Postgres data store (C2): connection pooling, advisory
//! locks, and one `*Dal` repository per table, each scoped to a single
//! `&mut PgConnection` the caller already holds — mirroring the teacher's
//! `zksync_dal` crate, where every `*Dal` struct wraps a borrowed
//! connection rather than owning the pool itself.

pub mod advisory_lock;
pub mod authorized_app_dal;
pub mod error;
pub mod export_dal;
pub mod exposure_dal;
pub mod federation_dal;
pub mod health_authority_dal;
pub mod models;
pub mod pool;
pub mod revision_key_dal;
pub mod signature_info_dal;
pub mod stats_dal;

pub use advisory_lock::{
    advisory_lock_name_for_batch, advisory_lock_name_for_config,
    advisory_lock_name_for_export_cleanup, advisory_lock_name_for_exposure_cleanup,
    advisory_lock_name_for_index, advisory_lock_name_for_key_rotation, try_xact_lock,
};
pub use authorized_app_dal::AuthorizedAppDal;
pub use error::{DbError, Result};
pub use export_dal::{dal_in_tx, ExportDal};
pub use exposure_dal::ExposureDal;
pub use federation_dal::FederationDal;
pub use health_authority_dal::HealthAuthorityDal;
pub use pool::DbPool;
pub use revision_key_dal::RevisionKeyDal;
pub use signature_info_dal::SignatureInfoDal;
pub use stats_dal::StatsDal;

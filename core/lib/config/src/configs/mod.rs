pub mod cleanup;
pub mod export;
pub mod federation;
pub mod key_rotation;
pub mod publish;
pub mod revision_token;

pub use cleanup::CleanupConfig;
pub use export::{ExportSchedulerConfig, ExportWorkerConfig};
pub use federation::FederationConfig;
pub use key_rotation::KeyRotationConfig;
pub use publish::PublishConfig;
pub use revision_token::RevisionTokenConfig;

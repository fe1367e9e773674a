//! Plain, `serde`-deserializable configuration structs (spec §9:
//! "Polymorphic pluggable resources ... selected by a configuration enum").
//!
//! Parsing these from environment variables, CLI flags, or config files is
//! explicitly out of scope (spec §1) — callers are expected to construct
//! them directly, e.g. from whatever configuration loader their deployment
//! uses, mirroring how `zksync_env_config` (not carried here) is kept
//! separate from `zksync_config` (the data half, which is carried).

pub mod configs;

pub use configs::{
    CleanupConfig, ExportSchedulerConfig, ExportWorkerConfig, FederationConfig, KeyRotationConfig,
    PublishConfig, RevisionTokenConfig,
};

use vise::{Counter, Metrics};

/// Rotation-job counters (spec §4.8: "Emits `RevisionKeysCreated`/
/// `RevisionKeysDeleted`").
#[derive(Debug, Metrics)]
#[metrics(prefix = "enserver_key_rotation")]
pub(super) struct KeyRotationMetrics {
    pub revision_keys_created: Counter,
    pub revision_keys_deleted: Counter,
    pub lock_contention: Counter,
}

#[vise::register]
pub(super) static METRICS: vise::Global<KeyRotationMetrics> = vise::Global::new();

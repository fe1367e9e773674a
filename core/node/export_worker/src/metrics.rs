use vise::{Counter, Metrics};

/// Export-worker counters (spec §4.5).
#[derive(Debug, Metrics)]
#[metrics(prefix = "enserver_export_worker")]
pub(super) struct WorkerMetrics {
    /// Batches that reached COMPLETE in one run.
    pub batches_completed: Counter,
    /// Files written across all completed batches.
    pub files_created: Counter,
    /// Records failing structural validation at export time (spec's "bad
    /// TEK length" check, generalized to the full invariant recheck since
    /// `key_bytes` is already a type-guaranteed 16 bytes).
    pub bad_key_length: Counter,
    /// Claimed batches that failed (`BlobWriteFailed`/`SignFailed`/
    /// `DBUpdateFailed`) and were left `PENDING` for the next run.
    pub batcher_failure: Counter,
    /// Runs that stopped because `WorkerTimeout` elapsed, not because no
    /// more OPEN batches remained.
    pub worker_timeout: Counter,
}

#[vise::register]
pub(super) static METRICS: vise::Global<WorkerMetrics> = vise::Global::new();

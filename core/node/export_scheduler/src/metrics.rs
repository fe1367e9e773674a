use vise::{Counter, Metrics};

/// Export-scheduler counters (spec §4.4).
#[derive(Debug, Metrics)]
#[metrics(prefix = "enserver_export_scheduler")]
pub(super) struct SchedulerMetrics {
    /// Batches created across all active configs in one run.
    pub batcher_created: Counter,
    /// Configs skipped because their advisory lock was already held.
    pub batcher_lock_contention: Counter,
}

#[vise::register]
pub(super) static METRICS: vise::Global<SchedulerMetrics> = vise::Global::new();

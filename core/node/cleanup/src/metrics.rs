use vise::{Counter, Metrics};

/// Retention-sweep counters (spec §4.6).
#[derive(Debug, Metrics)]
#[metrics(prefix = "enserver_cleanup")]
pub(super) struct CleanupMetrics {
    pub exposures_deleted: Counter,
    pub export_files_expired: Counter,
    pub export_batches_deleted: Counter,
    pub cleanup_timeout: Counter,
}

#[vise::register]
pub(super) static METRICS: vise::Global<CleanupMetrics> = vise::Global::new();

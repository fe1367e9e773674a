use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for the export scheduler (C8), spec §4.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSchedulerConfig {
    /// Batches are only created up to `now - min_window_age`, so that a
    /// window is never scheduled before it has fully elapsed.
    pub min_window_age: Duration,
    /// Start/end timestamps are truncated down to a multiple of this.
    pub truncate_window: Duration,
}

impl Default for ExportSchedulerConfig {
    fn default() -> Self {
        Self {
            min_window_age: Duration::from_secs(3600),
            truncate_window: Duration::from_secs(3600),
        }
    }
}

/// Tunables for the export worker (C9), spec §4.5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportWorkerConfig {
    /// Overall deadline for one `/export/do-work` invocation.
    pub worker_timeout: Duration,
    /// Lease duration granted when a batch is claimed (OPEN -> PENDING).
    pub create_timeout: Duration,
    /// Batches with fewer real TEKs than this are padded with synthetic
    /// keys up to `padding_range`.
    pub min_records: usize,
    /// Upper bound on how many synthetic padding keys may be added.
    pub padding_range: usize,
    /// Batches larger than this are split across multiple files.
    pub max_records: usize,
}

impl Default for ExportWorkerConfig {
    fn default() -> Self {
        Self {
            worker_timeout: Duration::from_secs(5 * 60),
            create_timeout: Duration::from_secs(10 * 60),
            min_records: 1000,
            padding_range: 100,
            max_records: 30_000,
        }
    }
}

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for the retention sweeps (C12), spec §4.6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// How long a TEK or export batch is retained after creation/end.
    pub ttl: Duration,
    /// Overall deadline for one cleanup invocation.
    pub timeout: Duration,
    /// Rows are deleted in batches of this size, bounding lock hold time.
    pub delete_batch_size: usize,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(14 * 24 * 3600),
            timeout: Duration::from_secs(5 * 60),
            delete_batch_size: 1000,
        }
    }
}

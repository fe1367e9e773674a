use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for the publish pipeline (C7), spec §4.3.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Keys whose `interval_number + interval_count` predates
    /// `now - max_interval_age` are dropped.
    pub max_interval_age: Duration,
    /// Keys whose rolling-start interval is more than this far in the
    /// future (device-clock skew allowance) are dropped.
    pub created_at_truncate_window: Duration,
    /// Hard cap on keys accepted per publish request.
    pub max_keys_on_publish: usize,
    /// Cap on keys sharing the same `rolling_start_interval_number`.
    pub max_same_start_interval_keys: usize,
    /// When false, keys whose last covered interval has not yet elapsed
    /// are dropped (same-day key suppression).
    pub release_same_day_keys: bool,
    /// The handler holds its response open at least this long, regardless
    /// of how quickly the transaction completes (timing side-channel
    /// mitigation, spec §4.3).
    pub min_request_duration: Duration,
    /// Target response size (bytes) that the `padding` field is computed
    /// up to, so that accepted-key counts cannot be inferred from
    /// response size.
    pub response_padding_min_bytes: usize,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            max_interval_age: Duration::from_secs(15 * 24 * 3600),
            created_at_truncate_window: Duration::from_secs(3600),
            max_keys_on_publish: 15,
            max_same_start_interval_keys: 3,
            release_same_day_keys: false,
            min_request_duration: Duration::from_secs(5),
            response_padding_min_bytes: 1024,
        }
    }
}

use vise::{Counter, Metrics};

/// Federation push/pull counters (spec §4.7).
#[derive(Debug, Metrics)]
#[metrics(prefix = "enserver_federation")]
pub(super) struct FederationMetrics {
    /// TEKs imported across all partners in one pull run.
    pub pull_keys_imported: Counter,
    /// Pull cycles that failed before committing a new cursor.
    pub pull_failures: Counter,
    /// Wire records dropped for a malformed `key_data` length.
    pub pull_bad_key_length: Counter,
    /// TEKs served across all `Fetch` calls (push side).
    pub push_records_sent: Counter,
    /// `Fetch` calls rejected by the client authentication check.
    pub push_rejected: Counter,
}

#[vise::register]
pub(super) static METRICS: vise::Global<FederationMetrics> = vise::Global::new();

use vise::{Counter, Metrics};

/// Publish-pipeline counters (spec §4.3, §9 ambient-stack carve-out).
#[derive(Debug, Metrics)]
#[metrics(prefix = "enserver_publish")]
pub(super) struct PublishMetrics {
    /// Requests rejected because the app package has no `AuthorizedApp` row.
    pub app_not_authorized: Counter,
    /// Requests that failed verification-certificate validation.
    pub bad_verification: Counter,
    /// Requests rejected for an invalid or undecodable revision token.
    pub revision_token_invalid: Counter,
    /// Keys inserted as brand-new rows.
    pub keys_inserted: Counter,
    /// Keys applied as an in-place revision.
    pub keys_revised: Counter,
    /// Keys dropped as duplicates (claimed by neither path).
    pub keys_dropped_duplicate: Counter,
    /// Accepted tokens decoded under a retained prior key rather than the
    /// current one (spec §9 Open Question: accepted, counted as aging).
    pub aging_revision_key_accepted: Counter,
}

#[vise::register]
pub(super) static METRICS: vise::Global<PublishMetrics> = vise::Global::new();

use chrono::{DateTime, Utc};

use crate::ids::HealthAuthorityId;

/// Resumable pull-sync position against one federation partner (C10/C11).
/// The partner hands back an opaque `cursor` with each page; persisting it
/// lets a restarted pull resume instead of re-fetching from the start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederationCursor {
    pub health_authority_id: HealthAuthorityId,
    pub cursor: Option<String>,
    pub last_synced_at: DateTime<Utc>,
}

impl FederationCursor {
    pub fn initial(health_authority_id: HealthAuthorityId, now: DateTime<Utc>) -> Self {
        Self {
            health_authority_id,
            cursor: None,
            last_synced_at: now,
        }
    }
}

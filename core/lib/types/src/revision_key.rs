use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::RevisionKeyId;

/// Metadata for one revision-token AEAD key. The wrapped key material
/// itself is handled by `enserver_db`/`enserver_crypto_primitives`
/// (secret, never serialized alongside this metadata) — see spec §3's
/// ownership note ("revision-key material is shared read-only...").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionKeyMeta {
    pub id: RevisionKeyId,
    pub created_at: DateTime<Utc>,
    pub allowed: bool,
}

impl RevisionKeyMeta {
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.created_at
    }
}

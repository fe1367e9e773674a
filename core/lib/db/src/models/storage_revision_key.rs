use chrono::{DateTime, Utc};
use enserver_types::{RevisionKeyId, RevisionKeyMeta};
use secrecy::Secret;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StorageRevisionKey {
    pub id: i32,
    pub created_at: DateTime<Utc>,
    pub allowed: bool,
    /// KMS-wrapped key material; unwrapped only by the caller holding a
    /// KMS handle (spec §9: the core never unwraps this itself).
    pub wrapped_key_material: Vec<u8>,
}

impl StorageRevisionKey {
    pub fn meta(&self) -> RevisionKeyMeta {
        RevisionKeyMeta {
            id: RevisionKeyId(self.id as u32),
            created_at: self.created_at,
            allowed: self.allowed,
        }
    }

    pub fn wrapped_key_material(&self) -> Secret<Vec<u8>> {
        Secret::new(self.wrapped_key_material.clone())
    }
}

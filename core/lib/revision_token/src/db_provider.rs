use async_trait::async_trait;
use enserver_crypto_primitives::aead::{AeadKey, KEY_LEN};
use enserver_db::{DbPool, RevisionKeyDal};
use enserver_types::RevisionKeyId;
use secrecy::ExposeSecret;
use zeroize::Zeroizing;

use crate::provider::RevisionKeyProvider;

/// [`RevisionKeyProvider`] backed by `revision_key` (C2). A real KMS
/// driver unwraps `wrapped_key_material` before it reaches here; absent
/// one, this treats the stored bytes as already-unwrapped, which is
/// correct for local development and the in-process KMS stub and is the
/// only seam a production KMS integration needs to replace (spec §9:
/// "the core uses them through narrow interfaces").
pub struct DbRevisionKeyProvider {
    pool: DbPool,
}

impl DbRevisionKeyProvider {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn to_aead_key(wrapped: &[u8]) -> Result<AeadKey, String> {
        let bytes: [u8; KEY_LEN] = wrapped
            .get(..KEY_LEN)
            .ok_or_else(|| "revision key material shorter than 32 bytes".to_string())?
            .try_into()
            .map_err(|_| "revision key material is not 32 bytes".to_string())?;
        Ok(Zeroizing::new(bytes))
    }
}

#[async_trait]
impl RevisionKeyProvider for DbRevisionKeyProvider {
    async fn current_key(&self) -> Result<(RevisionKeyId, AeadKey), String> {
        let mut conn = self.pool.raw().acquire().await.map_err(|e| e.to_string())?;
        let mut dal = RevisionKeyDal { conn: &mut conn };
        let row = dal
            .current()
            .await
            .map_err(|e| e.to_string())?
            .ok_or_else(|| "no allowed revision key".to_string())?;
        let key = Self::to_aead_key(row.wrapped_key_material().expose_secret())?;
        Ok((row.meta().id, key))
    }

    async fn key_by_id(&self, id: RevisionKeyId) -> Result<Option<AeadKey>, String> {
        let mut conn = self.pool.raw().acquire().await.map_err(|e| e.to_string())?;
        let mut dal = RevisionKeyDal { conn: &mut conn };
        // `allowed` only governs which key *new* tokens are sealed under
        // (C13 disallows the prior key the moment it rotates out). A token
        // already sealed under that key must keep decoding until C13
        // actually deletes the row (spec §4.1/§3: "accept until deletion"),
        // so row presence, not `allowed`, is the revocation gate here.
        let row = dal.find(id).await.map_err(|e| e.to_string())?;
        let Some(row) = row else { return Ok(None) };
        Ok(Some(Self::to_aead_key(row.wrapped_key_material().expose_secret())?))
    }
}

use async_trait::async_trait;
use rand::RngCore;
use secrecy::Secret;

/// Narrow seam to the external KMS that mints revision-AEAD key material
/// (spec §9: "the core uses [KMS] through narrow interfaces"), mirroring
/// `enserver_revision_token::RevisionKeyProvider`'s read-side seam for the
/// write side this job needs.
#[async_trait]
pub trait KeyMaterialSource: Send + Sync {
    /// Mints a fresh 32-byte AEAD key, wrapped for storage. `enserver_db`
    /// persists the returned bytes opaquely; it never unwraps them itself.
    async fn mint_wrapped_key(&self) -> Result<Secret<Vec<u8>>, String>;
}

/// Generates unwrapped key material directly. Correct for local
/// development and tests, same as `DbRevisionKeyProvider`'s treatment of
/// stored bytes as already-unwrapped absent a real KMS driver.
#[derive(Debug, Default)]
pub struct InMemoryKeyMaterialSource;

#[async_trait]
impl KeyMaterialSource for InMemoryKeyMaterialSource {
    async fn mint_wrapped_key(&self) -> Result<Secret<Vec<u8>>, String> {
        let mut bytes = vec![0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Ok(Secret::new(bytes))
    }
}

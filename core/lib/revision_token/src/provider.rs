use async_trait::async_trait;
use enserver_crypto_primitives::aead::AeadKey;
use enserver_types::RevisionKeyId;

/// Narrow seam to the key store (C2) and its KMS unwrapping (spec §9: "the
/// core uses [KMS] through narrow interfaces"). `enserver_db` owns the
/// wrapped bytes; a concrete KMS driver unwraps them; this crate only ever
/// sees the plaintext AEAD key through this trait.
#[async_trait]
pub trait RevisionKeyProvider: Send + Sync {
    /// The key new tokens are sealed under.
    async fn current_key(&self) -> Result<(RevisionKeyId, AeadKey), String>;

    /// Any key still eligible to open an existing token — the current key
    /// plus any retained prior key (spec §4.1, §9).
    async fn key_by_id(&self, id: RevisionKeyId) -> Result<Option<AeadKey>, String>;
}

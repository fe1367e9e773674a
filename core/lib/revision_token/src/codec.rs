use chrono::{DateTime, Utc};
use enserver_crypto_primitives::aead;
use enserver_types::{RevisionKeyId, RevisionToken};

use crate::error::{Result, RevisionTokenError};
use crate::provider::RevisionKeyProvider;

const KEY_ID_LEN: usize = 4;
const LENGTH_PREFIX_LEN: usize = 4;

/// Encrypt/decrypt a [`RevisionToken`] under the rotating AEAD key set
/// (spec §4.1). The wire format is `key_id:u32 LE || nonce || ciphertext‖tag`,
/// with the key id left in the clear so decode can look the key up before
/// attempting to open.
pub struct RevisionTokenCodec<'a> {
    provider: &'a dyn RevisionKeyProvider,
    aad: Vec<u8>,
    min_decoded_length: usize,
}

impl<'a> RevisionTokenCodec<'a> {
    pub fn new(provider: &'a dyn RevisionKeyProvider, aad: Vec<u8>, min_decoded_length: usize) -> Self {
        Self {
            provider,
            aad,
            min_decoded_length,
        }
    }

    /// Seals `token` under the currently allowed key. Returns the wire
    /// bytes plus the id of the key used, for callers that log/meter it.
    pub async fn encode(&self, token: &RevisionToken) -> Result<(Vec<u8>, RevisionKeyId)> {
        let (key_id, key) = self
            .provider
            .current_key()
            .await
            .map_err(RevisionTokenError::KeyProvider)?;

        let serialized = bincode::serialize(token).map_err(|_| RevisionTokenError::Malformed)?;
        let mut payload = Vec::with_capacity(LENGTH_PREFIX_LEN + serialized.len());
        payload.extend_from_slice(&(serialized.len() as u32).to_le_bytes());
        payload.extend_from_slice(&serialized);
        if payload.len() < self.min_decoded_length {
            payload.resize(self.min_decoded_length, 0);
        }

        let sealed = aead::seal(&key, &self.aad, &payload).map_err(|_| RevisionTokenError::SealBroken)?;

        let mut wire = Vec::with_capacity(KEY_ID_LEN + sealed.len());
        wire.extend_from_slice(&key_id.0.to_le_bytes());
        wire.extend_from_slice(&sealed);
        Ok((wire, key_id))
    }

    /// Opens `wire`, rejecting unknown keys, failed authentication, and
    /// payloads shorter than the configured minimum (spec §4.1). Returns
    /// the decoded token together with the key id it was sealed under, so
    /// callers can distinguish "current key" from "aging prior key" for
    /// stats (spec §9, Open Question).
    pub async fn decode(&self, wire: &[u8]) -> Result<(RevisionToken, RevisionKeyId)> {
        if wire.len() < KEY_ID_LEN {
            return Err(RevisionTokenError::Malformed);
        }
        let (key_id_bytes, sealed) = wire.split_at(KEY_ID_LEN);
        let key_id = RevisionKeyId(u32::from_le_bytes(key_id_bytes.try_into().unwrap()));

        let key = self
            .provider
            .key_by_id(key_id)
            .await
            .map_err(RevisionTokenError::KeyProvider)?
            .ok_or(RevisionTokenError::UnknownKey)?;

        let payload = aead::open(&key, &self.aad, sealed).map_err(|_| RevisionTokenError::SealBroken)?;
        if payload.len() < self.min_decoded_length {
            return Err(RevisionTokenError::TooShort);
        }
        if payload.len() < LENGTH_PREFIX_LEN {
            return Err(RevisionTokenError::Malformed);
        }
        let (len_bytes, rest) = payload.split_at(LENGTH_PREFIX_LEN);
        let len = u32::from_le_bytes(len_bytes.try_into().unwrap()) as usize;
        let serialized = rest.get(..len).ok_or(RevisionTokenError::Malformed)?;

        let token: RevisionToken =
            bincode::deserialize(serialized).map_err(|_| RevisionTokenError::Malformed)?;
        Ok((token, key_id))
    }
}

/// Convenience for building the token that a publish response emits:
/// every accepted `(key, interval_number, interval_count)` triple in the
/// request becomes one entry (spec §4.3 step 6).
pub fn build_token(
    entries: Vec<enserver_types::RevisionTokenEntry>,
    now: DateTime<Utc>,
) -> RevisionToken {
    RevisionToken::new(entries, now)
}

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, thiserror::Error)]
pub enum HmacError {
    #[error("invalid HMAC key length")]
    InvalidKeyLength,
}

/// Computes HMAC-SHA256(key, message), used both for the publish
/// `tekmac` binding (spec §4.2 step 4) and as a general primitive.
pub fn hmac_sha256(key: &[u8], message: &[u8]) -> Result<[u8; 32], HmacError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| HmacError::InvalidKeyLength)?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().into())
}

/// Constant-time comparison of a computed MAC against the caller-provided
/// one, so verification does not leak timing information.
pub fn verify_hmac_sha256(key: &[u8], message: &[u8], expected: &[u8]) -> Result<bool, HmacError> {
    let computed = hmac_sha256(key, message)?;
    Ok(computed.ct_eq(expected).into())
}

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use zeroize::Zeroizing;

pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;

#[derive(Debug, thiserror::Error)]
pub enum AeadError {
    #[error("AEAD encryption failed")]
    SealFailed,
    #[error("AEAD decryption failed: ciphertext invalid or key mismatch")]
    OpenFailed,
    #[error("ciphertext shorter than the minimum nonce+tag length")]
    CiphertextTooShort,
}

/// 256-bit AES-GCM key, zeroized on drop. Key material itself is wrapped
/// by an external KMS before it ever reaches this type (spec §9: "Concrete
/// ... key-management-service ... drivers; the core uses them through
/// narrow interfaces").
pub type AeadKey = Zeroizing<[u8; KEY_LEN]>;

/// Seals `plaintext` with `aad` bound, returning `nonce || ciphertext‖tag`.
pub fn seal(key: &AeadKey, aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, AeadError> {
    let cipher = Aes256Gcm::new_from_slice(key.as_slice()).map_err(|_| AeadError::SealFailed)?;
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(
            &nonce,
            aes_gcm::aead::Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|_| AeadError::SealFailed)?;
    let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    out.extend_from_slice(nonce.as_slice());
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Opens a blob produced by [`seal`] with the same key and `aad`.
pub fn open(key: &AeadKey, aad: &[u8], sealed: &[u8]) -> Result<Vec<u8>, AeadError> {
    if sealed.len() < NONCE_LEN {
        return Err(AeadError::CiphertextTooShort);
    }
    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);
    let cipher = Aes256Gcm::new_from_slice(key.as_slice()).map_err(|_| AeadError::OpenFailed)?;
    cipher
        .decrypt(
            nonce,
            aes_gcm::aead::Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| AeadError::OpenFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> AeadKey {
        Zeroizing::new([7u8; KEY_LEN])
    }

    #[test]
    fn round_trips() {
        let sealed = seal(&key(), b"aad", b"hello").unwrap();
        let opened = open(&key(), b"aad", &sealed).unwrap();
        assert_eq!(opened, b"hello");
    }

    #[test]
    fn rejects_wrong_aad() {
        let sealed = seal(&key(), b"aad-one", b"hello").unwrap();
        assert!(open(&key(), b"aad-two", &sealed).is_err());
    }

    #[test]
    fn rejects_wrong_key() {
        let sealed = seal(&key(), b"aad", b"hello").unwrap();
        let other_key = Zeroizing::new([9u8; KEY_LEN]);
        assert!(open(&other_key, b"aad", &sealed).is_err());
    }

    #[test]
    fn rejects_truncated_ciphertext() {
        assert!(matches!(
            open(&key(), b"aad", &[0u8; 4]),
            Err(AeadError::CiphertextTooShort)
        ));
    }
}

use p256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::pkcs8::DecodePublicKey;
use sha2::{Digest, Sha256};

#[derive(Debug, thiserror::Error)]
pub enum EcdsaError {
    #[error("invalid PEM-encoded public key")]
    InvalidPublicKey,
    #[error("signature verification failed")]
    VerificationFailed,
    #[error("malformed ASN.1 signature")]
    MalformedSignature,
}

/// Parses a SubjectPublicKeyInfo PEM block into a P-256 verifying key, used
/// both by health-authority key resolution (C6) and by downloaders
/// verifying export artifacts (spec §8: "signature verifies with the
/// configured public key").
pub fn parse_public_key_pem(pem: &str) -> Result<VerifyingKey, EcdsaError> {
    VerifyingKey::from_public_key_pem(pem).map_err(|_| EcdsaError::InvalidPublicKey)
}

/// Verifies an ASN.1 DER-encoded ECDSA signature over the SHA-256 digest of
/// `message`, ES256 semantics (SHA-256 digest, P-256 curve) — spec §4.2
/// step 2. Uses `verify_prehash` since `message` is hashed exactly once
/// here; the plain `Verifier` trait would hash it a second time before
/// checking, so the signature would only validate against this function's
/// own `sign_sha256_der`, not a spec-compliant external signer.
pub fn verify(public_key: &VerifyingKey, message: &[u8], der_signature: &[u8]) -> Result<(), EcdsaError> {
    let signature =
        Signature::from_der(der_signature).map_err(|_| EcdsaError::MalformedSignature)?;
    let digest = Sha256::digest(message);
    public_key
        .verify_prehash(&digest, &signature)
        .map_err(|_| EcdsaError::VerificationFailed)
}

/// Signs the SHA-256 digest of `body` with `signing_key`, producing the
/// ASN.1-encoded signature embedded in `TEKSignature.signature` (spec §6:
/// "ASN.1-encoded ECDSA signature over SHA-256 of export.bin"). Uses
/// `sign_prehash` so `body` is hashed exactly once; `Signer::sign` would
/// hash the already-computed digest a second time.
pub fn sign_sha256_der(signing_key: &SigningKey, body: &[u8]) -> Vec<u8> {
    let digest = Sha256::digest(body);
    let signature: Signature = signing_key
        .sign_prehash(&digest)
        .expect("signing a fixed-size SHA-256 digest cannot fail");
    signature.to_der().as_bytes().to_vec()
}

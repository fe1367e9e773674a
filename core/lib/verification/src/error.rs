/// Verification failures (spec §4.2). Every variant maps to the single
/// user-facing error code `health_authority_verification_certificate_invalid`
/// — the distinction is kept internally (for logs/metrics) but never
/// surfaced to the caller, so a rejected certificate does not leak which
/// check failed.
#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("no health authority key for the certificate's kid")]
    HaKeyNotFound,
    #[error("certificate signature does not verify")]
    HaSignatureInvalid,
    #[error("certificate claims rejected: {0}")]
    HaClaimRejected(&'static str),
    #[error("tekmac does not match the submitted TEK set")]
    HaHmacMismatch,
}

pub type Result<T> = std::result::Result<T, VerificationError>;

/// The single code every [`VerificationError`] maps to at the HTTP
/// boundary (spec §4.2).
pub const USER_FACING_CODE: &str = "health_authority_verification_certificate_invalid";

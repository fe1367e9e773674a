//! Cryptographic primitives (C1): HMAC, AEAD, ECDSA sign/verify, JWT
//! parse/verify. Higher-level protocols (revision tokens, certificate
//! verification) compose these from `enserver_revision_token` and
//! `enserver_verification` rather than duplicating them.

pub mod aead;
pub mod ecdsa_util;
pub mod hmac_util;
pub mod jwt;

pub use aead::{AeadError, AeadKey};
pub use ecdsa_util::EcdsaError;
pub use hmac_util::HmacError;
pub use jwt::{JwtError, ParsedJwt, VerificationClaims};

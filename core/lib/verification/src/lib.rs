//! PHA verification-certificate verifier (C6): signature, standard
//! claims, and the `tekmac` HMAC binding over the submitted TEK set.

pub mod error;
pub mod tek_mac;
pub mod verifier;

pub use enserver_crypto_primitives::jwt::TransmissionRiskOverride;
pub use error::{VerificationError, USER_FACING_CODE};
pub use tek_mac::{canonical_encoding, TekForMac};
pub use verifier::{verify, ClockSkew, VerifiedClaims};

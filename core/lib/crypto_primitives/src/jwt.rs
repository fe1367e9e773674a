//! Minimal JWT parsing and ES256 verification.
//!
//! The verification-certificate claims are bespoke (spec §6's `tekmac`,
//! `trisk`, etc.), so rather than pull in a full JWT framework this
//! composes `base64`/`serde_json`/`p256` directly — consistent with the
//! teacher's preference for narrow, composable crates over monolithic
//! frameworks (`zksync_crypto_primitives` itself is `secp256k1` + `sha2` +
//! `blake2`, not an all-in-one "crypto" crate).

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use p256::ecdsa::signature::Verifier;
use p256::ecdsa::{Signature, VerifyingKey};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("malformed JWT: expected three dot-separated segments")]
    Malformed,
    #[error("invalid base64url segment")]
    InvalidBase64,
    #[error("invalid JSON in header or claims")]
    InvalidJson,
    #[error("unsupported algorithm: only ES256 is accepted")]
    UnsupportedAlgorithm,
    #[error("signature verification failed")]
    BadSignature,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub kid: String,
}

/// A transmission-risk override for one interval, from the `trisk[]` claim
/// (spec §6).
#[derive(Debug, Clone, Deserialize)]
pub struct TransmissionRiskOverride {
    pub interval_number: i32,
    pub transmission_risk: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerificationClaims {
    pub iss: String,
    pub aud: String,
    pub exp: i64,
    pub nbf: i64,
    pub tekmac: String,
    #[serde(rename = "reportType")]
    pub report_type: Option<String>,
    #[serde(rename = "symptomOnsetInterval")]
    pub symptom_onset_interval: Option<i32>,
    #[serde(rename = "testDateInterval")]
    pub test_date_interval: Option<i32>,
    #[serde(default)]
    pub trisk: Vec<TransmissionRiskOverride>,
}

/// A JWT split into its parsed header/claims plus the raw signing input
/// (`header.payload`) and decoded signature, ready for signature
/// verification once the caller has resolved the PHA key by `kid`.
pub struct ParsedJwt {
    pub header: JwtHeader,
    pub claims: VerificationClaims,
    signing_input: String,
    signature: Vec<u8>,
}

impl ParsedJwt {
    pub fn parse(token: &str) -> Result<Self, JwtError> {
        let mut parts = token.split('.');
        let (Some(header_b64), Some(payload_b64), Some(sig_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(JwtError::Malformed);
        };

        let header_bytes = URL_SAFE_NO_PAD
            .decode(header_b64)
            .map_err(|_| JwtError::InvalidBase64)?;
        let header: JwtHeader =
            serde_json::from_slice(&header_bytes).map_err(|_| JwtError::InvalidJson)?;
        if header.alg != "ES256" {
            return Err(JwtError::UnsupportedAlgorithm);
        }

        let payload_bytes = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| JwtError::InvalidBase64)?;
        let claims: VerificationClaims =
            serde_json::from_slice(&payload_bytes).map_err(|_| JwtError::InvalidJson)?;

        let signature = URL_SAFE_NO_PAD
            .decode(sig_b64)
            .map_err(|_| JwtError::InvalidBase64)?;

        Ok(Self {
            header,
            claims,
            signing_input: format!("{header_b64}.{payload_b64}"),
            signature,
        })
    }

    /// Verifies the JOSE-format (raw `r||s`, not ASN.1 DER) ES256
    /// signature over `header.payload` using the resolved public key.
    pub fn verify_signature(&self, public_key: &VerifyingKey) -> Result<(), JwtError> {
        let signature =
            Signature::from_slice(&self.signature).map_err(|_| JwtError::BadSignature)?;
        public_key
            .verify(self.signing_input.as_bytes(), &signature)
            .map_err(|_| JwtError::BadSignature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use p256::ecdsa::{signature::Signer, SigningKey};
    use rand::rngs::OsRng;

    fn make_token(claims_json: &str) -> (String, SigningKey) {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"ES256","kid":"v1"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims_json);
        let signing_input = format!("{header}.{payload}");
        let signing_key = SigningKey::random(&mut OsRng);
        let signature: Signature = signing_key.sign(signing_input.as_bytes());
        let sig_b64 = URL_SAFE_NO_PAD.encode(signature.to_bytes());
        (format!("{signing_input}.{sig_b64}"), signing_key)
    }

    #[test]
    fn parses_and_verifies_valid_token() {
        let claims = r#"{"iss":"pha","aud":"server","exp":9999999999,"nbf":0,"tekmac":"abc=="}"#;
        let (token, signing_key) = make_token(claims);
        let parsed = ParsedJwt::parse(&token).unwrap();
        assert_eq!(parsed.header.alg, "ES256");
        let verifying_key = VerifyingKey::from(&signing_key);
        parsed.verify_signature(&verifying_key).unwrap();
    }

    #[test]
    fn rejects_wrong_key() {
        let claims = r#"{"iss":"pha","aud":"server","exp":9999999999,"nbf":0,"tekmac":"abc=="}"#;
        let (token, _) = make_token(claims);
        let parsed = ParsedJwt::parse(&token).unwrap();
        let other_key = VerifyingKey::from(&SigningKey::random(&mut OsRng));
        assert!(parsed.verify_signature(&other_key).is_err());
    }

    #[test]
    fn rejects_malformed_token() {
        assert!(matches!(ParsedJwt::parse("not-a-jwt"), Err(JwtError::Malformed)));
    }
}

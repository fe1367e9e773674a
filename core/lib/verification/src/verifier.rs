use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Duration, Utc};
use enserver_crypto_primitives::ecdsa_util;
use enserver_crypto_primitives::hmac_util;
use enserver_crypto_primitives::jwt::{ParsedJwt, TransmissionRiskOverride};
use enserver_types::{HealthAuthority, ReportType};

use crate::error::{Result, VerificationError};
use crate::tek_mac::{canonical_encoding, TekForMac};

/// Fields extracted from a verified certificate and applied to every TEK
/// in the request (spec §4.2 step 5).
#[derive(Debug, Clone)]
pub struct VerifiedClaims {
    pub report_type: ReportType,
    pub symptom_onset_interval: Option<i32>,
    pub test_date_interval: Option<i32>,
    pub trisk: Vec<TransmissionRiskOverride>,
}

/// Allowed clock skew when checking `nbf`/`exp` (spec §4.2 step 3: "with
/// configured skew").
#[derive(Debug, Clone, Copy)]
pub struct ClockSkew(pub Duration);

impl Default for ClockSkew {
    fn default() -> Self {
        ClockSkew(Duration::minutes(1))
    }
}

/// Verifies a PHA-signed verification certificate against the submitted
/// TEK set (spec §4.2). Stateless: the caller resolves the
/// [`HealthAuthority`] (C2, cached by C4) and supplies the current time.
pub fn verify(
    jwt: &str,
    health_authority: &HealthAuthority,
    hmac_key: &[u8],
    teks: &[TekForMac],
    now: DateTime<Utc>,
    skew: ClockSkew,
) -> Result<VerifiedClaims> {
    let parsed = ParsedJwt::parse(jwt).map_err(|_| VerificationError::HaClaimRejected("malformed JWT"))?;

    let key = health_authority
        .eligible_key(&parsed.header.kid, now)
        .ok_or(VerificationError::HaKeyNotFound)?;
    let public_key = ecdsa_util::parse_public_key_pem(&key.public_key_pem)
        .map_err(|_| VerificationError::HaKeyNotFound)?;

    parsed
        .verify_signature(&public_key)
        .map_err(|_| VerificationError::HaSignatureInvalid)?;

    if parsed.claims.iss != health_authority.issuer {
        return Err(VerificationError::HaClaimRejected("iss"));
    }
    if parsed.claims.aud != health_authority.audience {
        return Err(VerificationError::HaClaimRejected("aud"));
    }
    let now_ts = now.timestamp();
    let skew_secs = skew.0.num_seconds();
    if parsed.claims.nbf > now_ts + skew_secs {
        return Err(VerificationError::HaClaimRejected("nbf"));
    }
    if parsed.claims.exp < now_ts - skew_secs {
        return Err(VerificationError::HaClaimRejected("exp"));
    }

    let canonical = canonical_encoding(teks);
    let claimed_mac = STANDARD
        .decode(&parsed.claims.tekmac)
        .map_err(|_| VerificationError::HaHmacMismatch)?;
    let matches = hmac_util::verify_hmac_sha256(hmac_key, canonical.as_bytes(), &claimed_mac)
        .map_err(|_| VerificationError::HaHmacMismatch)?;
    if !matches {
        return Err(VerificationError::HaHmacMismatch);
    }

    let report_type = parse_report_type(parsed.claims.report_type.as_deref())
        .ok_or(VerificationError::HaClaimRejected("reportType"))?;

    Ok(VerifiedClaims {
        report_type,
        symptom_onset_interval: parsed.claims.symptom_onset_interval,
        test_date_interval: parsed.claims.test_date_interval,
        trisk: parsed.claims.trisk,
    })
}

fn parse_report_type(raw: Option<&str>) -> Option<ReportType> {
    match raw.unwrap_or("unknown") {
        "unknown" => Some(ReportType::Unknown),
        "confirmedTest" => Some(ReportType::ConfirmedTest),
        "clinicalDiagnosis" => Some(ReportType::ClinicalDiagnosis),
        "selfReport" => Some(ReportType::SelfReport),
        "recursive" => Some(ReportType::Recursive),
        "revoked" => Some(ReportType::Revoked),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use enserver_types::HealthAuthorityKey;
    use p256::ecdsa::{signature::Signer, Signature, SigningKey, VerifyingKey};
    use p256::pkcs8::EncodePublicKey;
    use rand::rngs::OsRng;

    fn make_ha_and_token(
        claims_extra: &str,
        hmac_key: &[u8],
        teks: &[TekForMac],
    ) -> (String, HealthAuthority) {
        let signing_key = SigningKey::random(&mut OsRng);
        let verifying_key = VerifyingKey::from(&signing_key);
        let pem = verifying_key.to_public_key_pem(Default::default()).unwrap();

        let mac = hmac_util::hmac_sha256(hmac_key, canonical_encoding(teks).as_bytes()).unwrap();
        let tekmac = STANDARD.encode(mac);

        let payload = format!(
            r#"{{"iss":"pha-1","aud":"server","exp":9999999999,"nbf":0,"tekmac":"{tekmac}"{claims_extra}}}"#
        );
        let payload_b64 = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&payload);
        let header_b64 = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(r#"{"alg":"ES256","kid":"v1"}"#);
        let signing_input = format!("{header_b64}.{payload_b64}");
        let signature: Signature = signing_key.sign(signing_input.as_bytes());
        let sig_b64 = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(signature.to_bytes());
        let token = format!("{signing_input}.{sig_b64}");

        let ha = HealthAuthority {
            id: enserver_types::HealthAuthorityId(1),
            issuer: "pha-1".to_string(),
            audience: "server".to_string(),
            jwks_uri: None,
            keys: vec![HealthAuthorityKey {
                version: "v1".to_string(),
                from: Utc::now() - Duration::days(1),
                thru: None,
                public_key_pem: pem.to_string(),
            }],
        };
        (token, ha)
    }

    #[test]
    fn verifies_valid_certificate() {
        let hmac_key = b"shared-secret";
        let teks = vec![TekForMac {
            key_bytes: [1u8; 16],
            interval_number: 100,
            interval_count: 144,
            transmission_risk: 1,
        }];
        let (token, ha) = make_ha_and_token(",\"reportType\":\"confirmedTest\"", hmac_key, &teks);
        let claims = verify(&token, &ha, hmac_key, &teks, Utc::now(), ClockSkew::default()).unwrap();
        assert_eq!(claims.report_type, ReportType::ConfirmedTest);
    }

    #[test]
    fn rejects_future_nbf() {
        let hmac_key = b"shared-secret";
        let teks = vec![TekForMac {
            key_bytes: [1u8; 16],
            interval_number: 100,
            interval_count: 144,
            transmission_risk: 1,
        }];
        let signing_key = SigningKey::random(&mut OsRng);
        let verifying_key = VerifyingKey::from(&signing_key);
        let pem = verifying_key.to_public_key_pem(Default::default()).unwrap();
        let mac = hmac_util::hmac_sha256(hmac_key, canonical_encoding(&teks).as_bytes()).unwrap();
        let tekmac = STANDARD.encode(mac);
        let future_nbf = (Utc::now() + Duration::hours(1)).timestamp();
        let payload = format!(
            r#"{{"iss":"pha-1","aud":"server","exp":9999999999,"nbf":{future_nbf},"tekmac":"{tekmac}"}}"#
        );
        let header_b64 = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(r#"{"alg":"ES256","kid":"v1"}"#);
        let payload_b64 = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&payload);
        let signing_input = format!("{header_b64}.{payload_b64}");
        let signature: Signature = signing_key.sign(signing_input.as_bytes());
        let sig_b64 = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(signature.to_bytes());
        let token = format!("{signing_input}.{sig_b64}");

        let ha = HealthAuthority {
            id: enserver_types::HealthAuthorityId(1),
            issuer: "pha-1".to_string(),
            audience: "server".to_string(),
            jwks_uri: None,
            keys: vec![HealthAuthorityKey {
                version: "v1".to_string(),
                from: Utc::now() - Duration::days(1),
                thru: None,
                public_key_pem: pem.to_string(),
            }],
        };

        let result = verify(&token, &ha, hmac_key, &teks, Utc::now(), ClockSkew::default());
        assert!(matches!(result, Err(VerificationError::HaClaimRejected("nbf"))));
    }
}

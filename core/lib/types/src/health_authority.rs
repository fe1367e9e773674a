use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::HealthAuthorityId;

/// One versioned ECDSA public key belonging to a `HealthAuthority`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthAuthorityKey {
    pub version: String,
    pub from: DateTime<Utc>,
    pub thru: Option<DateTime<Utc>>,
    pub public_key_pem: String,
}

impl HealthAuthorityKey {
    /// Spec §3: "at any instant only keys where `from ≤ now < thru` (or
    /// `thru` null) are eligible."
    pub fn is_eligible(&self, now: DateTime<Utc>) -> bool {
        self.from <= now && self.thru.map(|thru| now < thru).unwrap_or(true)
    }
}

/// A Public Health Authority: a trusted signer of verification certificates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthAuthority {
    pub id: HealthAuthorityId,
    pub issuer: String,
    pub audience: String,
    pub jwks_uri: Option<String>,
    pub keys: Vec<HealthAuthorityKey>,
}

impl HealthAuthority {
    /// Resolve the eligible key for a given `kid` (JWT header), per spec §4.2 step 1.
    pub fn eligible_key(&self, kid: &str, now: DateTime<Utc>) -> Option<&HealthAuthorityKey> {
        self.keys
            .iter()
            .find(|k| k.version == kid && k.is_eligible(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn key_eligibility_window() {
        let now = Utc::now();
        let key = HealthAuthorityKey {
            version: "v1".to_string(),
            from: now - Duration::days(1),
            thru: Some(now + Duration::days(1)),
            public_key_pem: String::new(),
        };
        assert!(key.is_eligible(now));
        assert!(!key.is_eligible(now + Duration::days(2)));
        assert!(!key.is_eligible(now - Duration::days(2)));
    }

    #[test]
    fn null_thru_never_expires() {
        let now = Utc::now();
        let key = HealthAuthorityKey {
            version: "v1".to_string(),
            from: now - Duration::days(1000),
            thru: None,
            public_key_pem: String::new(),
        };
        assert!(key.is_eligible(now + Duration::days(10_000)));
    }
}

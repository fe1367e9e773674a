use chrono::{DateTime, Utc};
use enserver_types::{HealthAuthority, HealthAuthorityId, HealthAuthorityKey};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StorageHealthAuthority {
    pub id: i64,
    pub issuer: String,
    pub audience: String,
    pub jwks_uri: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StorageHealthAuthorityKey {
    pub health_authority_id: i64,
    pub version: String,
    pub from_timestamp: DateTime<Utc>,
    pub thru_timestamp: Option<DateTime<Utc>>,
    pub public_key_pem: String,
}

/// Joins a `HealthAuthority` row with its keys; the DAL fetches both in one
/// round trip (a single query plus a keyed fold), then assembles this.
pub fn assemble_health_authority(
    row: StorageHealthAuthority,
    keys: Vec<StorageHealthAuthorityKey>,
) -> HealthAuthority {
    HealthAuthority {
        id: HealthAuthorityId(row.id),
        issuer: row.issuer,
        audience: row.audience,
        jwks_uri: row.jwks_uri,
        keys: keys
            .into_iter()
            .map(|k| HealthAuthorityKey {
                version: k.version,
                from: k.from_timestamp,
                thru: k.thru_timestamp,
                public_key_pem: k.public_key_pem,
            })
            .collect(),
    }
}

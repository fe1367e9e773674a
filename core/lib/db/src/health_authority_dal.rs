use enserver_types::{HealthAuthority, HealthAuthorityId};
use sqlx::PgConnection;

use crate::error::Result;
use crate::models::{assemble_health_authority, StorageHealthAuthority, StorageHealthAuthorityKey};

/// Repository for `health_authority` and `health_authority_key` (C2),
/// backing verification (C6) and federation (C10/C11).
pub struct HealthAuthorityDal<'a> {
    pub conn: &'a mut PgConnection,
}

impl<'a> HealthAuthorityDal<'a> {
    pub async fn find_by_issuer(&mut self, issuer: &str) -> Result<Option<HealthAuthority>> {
        let row: Option<StorageHealthAuthority> = sqlx::query_as(
            "SELECT id, issuer, audience, jwks_uri FROM health_authority WHERE issuer = $1",
        )
        .bind(issuer)
        .fetch_optional(&mut *self.conn)
        .await?;
        let Some(row) = row else { return Ok(None) };
        let keys = self.keys_for(HealthAuthorityId(row.id)).await?;
        Ok(Some(assemble_health_authority(row, keys)))
    }

    pub async fn find(&mut self, id: HealthAuthorityId) -> Result<Option<HealthAuthority>> {
        let row: Option<StorageHealthAuthority> = sqlx::query_as(
            "SELECT id, issuer, audience, jwks_uri FROM health_authority WHERE id = $1",
        )
        .bind(id.0)
        .fetch_optional(&mut *self.conn)
        .await?;
        let Some(row) = row else { return Ok(None) };
        let keys = self.keys_for(id).await?;
        Ok(Some(assemble_health_authority(row, keys)))
    }

    pub async fn all(&mut self) -> Result<Vec<HealthAuthority>> {
        let rows: Vec<StorageHealthAuthority> =
            sqlx::query_as("SELECT id, issuer, audience, jwks_uri FROM health_authority ORDER BY id")
                .fetch_all(&mut *self.conn)
                .await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let keys = self.keys_for(HealthAuthorityId(row.id)).await?;
            out.push(assemble_health_authority(row, keys));
        }
        Ok(out)
    }

    async fn keys_for(&mut self, id: HealthAuthorityId) -> Result<Vec<StorageHealthAuthorityKey>> {
        let rows = sqlx::query_as(
            r#"
            SELECT health_authority_id, version, from_timestamp, thru_timestamp, public_key_pem
            FROM health_authority_key WHERE health_authority_id = $1 ORDER BY version
            "#,
        )
        .bind(id.0)
        .fetch_all(&mut *self.conn)
        .await?;
        Ok(rows)
    }
}

use chrono::{DateTime, Utc};
use enserver_types::{FederationCursor, HealthAuthorityId};
use sqlx::PgConnection;

use crate::error::Result;

#[derive(Debug, Clone, sqlx::FromRow)]
struct StorageFederationCursor {
    health_authority_id: i64,
    cursor: Option<String>,
    last_synced_at: DateTime<Utc>,
}

impl From<StorageFederationCursor> for FederationCursor {
    fn from(row: StorageFederationCursor) -> Self {
        FederationCursor {
            health_authority_id: HealthAuthorityId(row.health_authority_id),
            cursor: row.cursor,
            last_synced_at: row.last_synced_at,
        }
    }
}

/// Repository for `federation_cursor` (C2), backing the pull client (C11).
pub struct FederationDal<'a> {
    pub conn: &'a mut PgConnection,
}

impl<'a> FederationDal<'a> {
    pub async fn find(&mut self, id: HealthAuthorityId) -> Result<Option<FederationCursor>> {
        let row: Option<StorageFederationCursor> = sqlx::query_as(
            "SELECT health_authority_id, cursor, last_synced_at FROM federation_cursor WHERE health_authority_id = $1",
        )
        .bind(id.0)
        .fetch_optional(&mut *self.conn)
        .await?;
        Ok(row.map(FederationCursor::from))
    }

    pub async fn upsert(&mut self, cursor: &FederationCursor) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO federation_cursor (health_authority_id, cursor, last_synced_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (health_authority_id) DO UPDATE SET
                cursor = EXCLUDED.cursor,
                last_synced_at = EXCLUDED.last_synced_at
            "#,
        )
        .bind(cursor.health_authority_id.0)
        .bind(&cursor.cursor)
        .bind(cursor.last_synced_at)
        .execute(&mut *self.conn)
        .await?;
        Ok(())
    }
}

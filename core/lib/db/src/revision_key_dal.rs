use chrono::{DateTime, Utc};
use enserver_types::{RevisionKeyId, RevisionKeyMeta};
use secrecy::Secret;
use sqlx::PgConnection;

use crate::error::Result;
use crate::models::StorageRevisionKey;

/// Repository for `revision_key` (C2), backing the AEAD codec (C5) and
/// rotation job (C13). Key material is always KMS-wrapped at rest; this
/// DAL never sees plaintext key bytes.
pub struct RevisionKeyDal<'a> {
    pub conn: &'a mut PgConnection,
}

impl<'a> RevisionKeyDal<'a> {
    pub async fn find(&mut self, id: RevisionKeyId) -> Result<Option<StorageRevisionKey>> {
        let row = sqlx::query_as(
            "SELECT id, created_at, allowed, wrapped_key_material FROM revision_key WHERE id = $1",
        )
        .bind(id.0 as i32)
        .fetch_optional(&mut *self.conn)
        .await?;
        Ok(row)
    }

    pub async fn current(&mut self) -> Result<Option<StorageRevisionKey>> {
        let row = sqlx::query_as(
            "SELECT id, created_at, allowed, wrapped_key_material FROM revision_key WHERE allowed ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(&mut *self.conn)
        .await?;
        Ok(row)
    }

    pub async fn insert(&mut self, wrapped_key_material: &Secret<Vec<u8>>) -> Result<RevisionKeyId> {
        use secrecy::ExposeSecret;
        let (id,): (i32,) = sqlx::query_as(
            "INSERT INTO revision_key (created_at, allowed, wrapped_key_material) VALUES (NOW(), true, $1) RETURNING id",
        )
        .bind(wrapped_key_material.expose_secret())
        .fetch_one(&mut *self.conn)
        .await?;
        Ok(RevisionKeyId(id as u32))
    }

    pub async fn mark_disallowed(&mut self, id: RevisionKeyId) -> Result<()> {
        sqlx::query("UPDATE revision_key SET allowed = false WHERE id = $1")
            .bind(id.0 as i32)
            .execute(&mut *self.conn)
            .await?;
        Ok(())
    }

    pub async fn delete(&mut self, id: RevisionKeyId) -> Result<()> {
        sqlx::query("DELETE FROM revision_key WHERE id = $1")
            .bind(id.0 as i32)
            .execute(&mut *self.conn)
            .await?;
        Ok(())
    }

    /// Disallowed keys older than `before`, eligible for hard deletion
    /// once the rotation grace period has elapsed (C13).
    pub async fn disallowed_before(&mut self, before: DateTime<Utc>) -> Result<Vec<RevisionKeyMeta>> {
        let rows: Vec<StorageRevisionKey> = sqlx::query_as(
            "SELECT id, created_at, allowed, wrapped_key_material FROM revision_key WHERE NOT allowed AND created_at < $1",
        )
        .bind(before)
        .fetch_all(&mut *self.conn)
        .await?;
        Ok(rows.iter().map(StorageRevisionKey::meta).collect())
    }
}

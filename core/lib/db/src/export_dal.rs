use chrono::{DateTime, Utc};
use enserver_types::{
    ExportBatch, ExportBatchId, ExportBatchStatus, ExportConfig, ExportConfigId, ExportFile,
};
use sqlx::{PgConnection, Postgres, Transaction};

use crate::error::Result;
use crate::models::{StorageExportBatch, StorageExportConfig, StorageExportFile};

/// Repository for `export_config`, `export_batch` and `export_file` (C2),
/// backing the scheduler (C8) and worker (C9).
pub struct ExportDal<'a> {
    pub conn: &'a mut PgConnection,
}

impl<'a> ExportDal<'a> {
    pub async fn active_configs(&mut self, now: DateTime<Utc>) -> Result<Vec<ExportConfig>> {
        let rows: Vec<StorageExportConfig> = sqlx::query_as(
            r#"
            SELECT id, period_seconds, from_timestamp, thru_timestamp, output_region,
                   input_regions, bucket_name, filename_root, signature_info_ids,
                   max_records_override, include_travelers, exclude_regions
            FROM export_config
            WHERE from_timestamp <= $1 AND (thru_timestamp IS NULL OR thru_timestamp > $1)
            ORDER BY id
            "#,
        )
        .bind(now)
        .fetch_all(&mut *self.conn)
        .await?;
        Ok(rows.into_iter().map(ExportConfig::from).collect())
    }

    pub async fn find_config(&mut self, id: ExportConfigId) -> Result<Option<ExportConfig>> {
        let row: Option<StorageExportConfig> = sqlx::query_as(
            r#"
            SELECT id, period_seconds, from_timestamp, thru_timestamp, output_region,
                   input_regions, bucket_name, filename_root, signature_info_ids,
                   max_records_override, include_travelers, exclude_regions
            FROM export_config WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&mut *self.conn)
        .await?;
        Ok(row.map(ExportConfig::from))
    }

    /// Latest batch's end timestamp for a config, used by the scheduler to
    /// decide the next window's start (spec §4.4 step 2).
    pub async fn latest_batch_end(
        &mut self,
        config_id: ExportConfigId,
    ) -> Result<Option<DateTime<Utc>>> {
        let row: Option<(DateTime<Utc>,)> = sqlx::query_as(
            "SELECT end_timestamp FROM export_batch WHERE config_id = $1 ORDER BY end_timestamp DESC LIMIT 1",
        )
        .bind(config_id.0)
        .fetch_optional(&mut *self.conn)
        .await?;
        Ok(row.map(|(t,)| t))
    }

    pub async fn insert_batch(
        &mut self,
        config_id: ExportConfigId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        output_region: &str,
        signature_info_ids: &[i64],
        input_regions: &[String],
    ) -> Result<ExportBatchId> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO export_batch (
                config_id, start_timestamp, end_timestamp, output_region, status,
                signature_info_ids, input_regions
            ) VALUES ($1, $2, $3, $4, 'OPEN', $5, $6)
            RETURNING id
            "#,
        )
        .bind(config_id.0)
        .bind(start)
        .bind(end)
        .bind(output_region)
        .bind(signature_info_ids)
        .bind(input_regions)
        .fetch_one(&mut *self.conn)
        .await?;
        Ok(ExportBatchId(id))
    }

    /// Claims the next claimable batch (OPEN, or PENDING with an expired
    /// lease) and sets a fresh lease, all inside one transaction together
    /// with the caller's per-batch advisory lock (spec §4.5 step 1).
    pub async fn claim_next_batch(
        &mut self,
        lease_duration_secs: i64,
    ) -> Result<Option<ExportBatch>> {
        let now = sqlx_now(&mut *self.conn).await?;
        let row: Option<StorageExportBatch> = sqlx::query_as(
            r#"
            SELECT id, config_id, start_timestamp, end_timestamp, output_region, status,
                   lease_expires, signature_info_ids, input_regions
            FROM export_batch
            WHERE status = 'OPEN'
               OR (status = 'PENDING' AND lease_expires < $1)
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(now)
        .fetch_optional(&mut *self.conn)
        .await?;

        let Some(row) = row else { return Ok(None) };
        let lease_expires = now + chrono::Duration::seconds(lease_duration_secs);
        sqlx::query("UPDATE export_batch SET status = 'PENDING', lease_expires = $2 WHERE id = $1")
            .bind(row.id)
            .bind(lease_expires)
            .execute(&mut *self.conn)
            .await?;

        let mut batch = ExportBatch::from(row);
        batch.status = ExportBatchStatus::Pending;
        batch.lease_expires = Some(lease_expires);
        Ok(Some(batch))
    }

    pub async fn mark_complete(&mut self, batch_id: ExportBatchId) -> Result<()> {
        sqlx::query("UPDATE export_batch SET status = 'COMPLETE', lease_expires = NULL WHERE id = $1")
            .bind(batch_id.0)
            .execute(&mut *self.conn)
            .await?;
        Ok(())
    }

    pub async fn mark_deleted(&mut self, batch_id: ExportBatchId) -> Result<()> {
        sqlx::query("UPDATE export_batch SET status = 'DELETED', lease_expires = NULL WHERE id = $1")
            .bind(batch_id.0)
            .execute(&mut *self.conn)
            .await?;
        Ok(())
    }

    pub async fn insert_file(
        &mut self,
        batch_id: ExportBatchId,
        filename: &str,
        batch_num: i32,
        batch_size: i32,
        region: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO export_file (batch_id, filename, batch_num, batch_size, region, status)
            VALUES ($1, $2, $3, $4, $5, 'ACTIVE')
            "#,
        )
        .bind(batch_id.0)
        .bind(filename)
        .bind(batch_num)
        .bind(batch_size)
        .bind(region)
        .execute(&mut *self.conn)
        .await?;
        Ok(())
    }

    pub async fn files_for_batch(&mut self, batch_id: ExportBatchId) -> Result<Vec<ExportFile>> {
        let rows: Vec<StorageExportFile> = sqlx::query_as(
            "SELECT batch_id, filename, batch_num, batch_size, region, status FROM export_file WHERE batch_id = $1 ORDER BY batch_num",
        )
        .bind(batch_id.0)
        .fetch_all(&mut *self.conn)
        .await?;
        Ok(rows.into_iter().map(ExportFile::from).collect())
    }

    /// The config governing a given batch, for cleanup (C12) to resolve
    /// which bucket/filenameRoot a batch's blobs live under.
    pub async fn config_for_batch(&mut self, batch_id: ExportBatchId) -> Result<Option<ExportConfig>> {
        let row: Option<StorageExportConfig> = sqlx::query_as(
            r#"
            SELECT ec.id, ec.period_seconds, ec.from_timestamp, ec.thru_timestamp, ec.output_region,
                   ec.input_regions, ec.bucket_name, ec.filename_root, ec.signature_info_ids,
                   ec.max_records_override, ec.include_travelers, ec.exclude_regions
            FROM export_config ec
            JOIN export_batch eb ON eb.config_id = ec.id
            WHERE eb.id = $1
            "#,
        )
        .bind(batch_id.0)
        .fetch_optional(&mut *self.conn)
        .await?;
        Ok(row.map(ExportConfig::from))
    }

    /// Expires files whose batch has aged past retention (C12 cleanup),
    /// returning the expired rows so the caller can also remove the blob.
    pub async fn expire_files_before(
        &mut self,
        before: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<ExportFile>> {
        let rows: Vec<StorageExportFile> = sqlx::query_as(
            r#"
            WITH expiring AS (
                SELECT ef.batch_id, ef.filename
                FROM export_file ef
                JOIN export_batch eb ON eb.id = ef.batch_id
                WHERE ef.status = 'ACTIVE' AND eb.end_timestamp < $1
                ORDER BY ef.batch_id, ef.filename
                LIMIT $2
            )
            UPDATE export_file
            SET status = 'EXPIRED'
            FROM expiring
            WHERE export_file.batch_id = expiring.batch_id AND export_file.filename = expiring.filename
            RETURNING export_file.batch_id, export_file.filename, export_file.batch_num,
                      export_file.batch_size, export_file.region, export_file.status
            "#,
        )
        .bind(before)
        .bind(limit)
        .fetch_all(&mut *self.conn)
        .await?;
        Ok(rows.into_iter().map(ExportFile::from).collect())
    }
}

async fn sqlx_now(conn: &mut PgConnection) -> Result<DateTime<Utc>> {
    let (now,): (DateTime<Utc>,) = sqlx::query_as("SELECT NOW()")
        .fetch_one(conn)
        .await?;
    Ok(now)
}

/// Convenience wrapper so callers that already hold a `Transaction` can
/// build an `ExportDal` without an extra reborrow at the call site.
pub fn dal_in_tx<'a>(tx: &'a mut Transaction<'_, Postgres>) -> ExportDal<'a> {
    ExportDal { conn: &mut **tx }
}

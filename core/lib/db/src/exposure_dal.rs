use chrono::{DateTime, Utc};
use enserver_types::{Exposure, HealthAuthorityId, ReportType};
use sqlx::{PgConnection, Row};

use crate::error::Result;
use crate::models::StorageExposure;

/// Repository for the `exposure` table (C2), scoped to one open
/// connection or transaction — the same narrow, one-repository-per-table
/// style as `zksync_dal`'s `*Dal` structs.
pub struct ExposureDal<'a> {
    pub conn: &'a mut PgConnection,
}

impl<'a> ExposureDal<'a> {
    pub async fn find_by_key(&mut self, key_bytes: &[u8; 16]) -> Result<Option<Exposure>> {
        let row: Option<StorageExposure> = sqlx::query_as(
            r#"
            SELECT key_bytes, transmission_risk, app_package_name,
                   rolling_start_interval_number, rolling_period, regions, traveler,
                   created_at, local_provenance, federation_sync_id, health_authority_id,
                   report_type, days_since_onset_of_symptoms, revised_report_type,
                   revised_days_since_onset_of_symptoms, revised_at, export_import_id
            FROM exposure WHERE key_bytes = $1
            "#,
        )
        .bind(key_bytes.as_slice())
        .fetch_optional(&mut *self.conn)
        .await?;

        row.map(Exposure::try_from).transpose()
    }

    /// Inserts a brand-new TEK row. Spec §3 invariant (a): key bytes
    /// unique, enforced by the primary key.
    pub async fn insert_new(&mut self, exposure: &Exposure) -> Result<()> {
        let regions: Vec<String> = exposure.regions.iter().cloned().collect();
        sqlx::query(
            r#"
            INSERT INTO exposure (
                key_bytes, transmission_risk, app_package_name,
                rolling_start_interval_number, rolling_period, regions, traveler,
                created_at, local_provenance, federation_sync_id, health_authority_id,
                report_type, days_since_onset_of_symptoms, export_import_id
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(exposure.key_bytes.as_slice())
        .bind(exposure.transmission_risk)
        .bind(&exposure.app_package_name)
        .bind(exposure.rolling_start_interval_number)
        .bind(exposure.rolling_period)
        .bind(&regions)
        .bind(exposure.traveler)
        .bind(exposure.created_at)
        .bind(exposure.local_provenance)
        .bind(&exposure.federation_sync_id)
        .bind(exposure.health_authority_id.map(|id| id.0))
        .bind(exposure.report_type)
        .bind(exposure.days_since_onset_of_symptoms)
        .bind(&exposure.export_import_id)
        .execute(&mut *self.conn)
        .await?;
        Ok(())
    }

    /// Applies a revision in place (spec §3 invariant (e): revisions are
    /// in-place updates, not new rows). The `WHERE` clause re-checks the
    /// single-revision rule and precedence at the database level so the
    /// guarantee holds even if the caller's in-memory check raced with a
    /// concurrent revision — the update simply affects zero rows.
    pub async fn apply_revision(
        &mut self,
        key_bytes: &[u8; 16],
        new_report_type: ReportType,
        new_days_since_onset: Option<i32>,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE exposure
            SET revised_report_type = report_type,
                revised_days_since_onset_of_symptoms = days_since_onset_of_symptoms,
                revised_at = $3,
                report_type = $2,
                days_since_onset_of_symptoms = $4
            WHERE key_bytes = $1
              AND revised_report_type IS NULL
              AND report_type <> 'revoked'
            "#,
        )
        .bind(key_bytes.as_slice())
        .bind(new_report_type)
        .bind(now)
        .bind(new_days_since_onset)
        .execute(&mut *self.conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Bounded batch deletion for the retention sweep (C12, spec §4.6).
    /// Returns the number of rows actually deleted, which may be less
    /// than `limit` when fewer rows qualify.
    pub async fn delete_before(&mut self, before: DateTime<Utc>, limit: i64) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM exposure
            WHERE key_bytes IN (
                SELECT key_bytes FROM exposure
                WHERE created_at < $1
                ORDER BY key_bytes
                LIMIT $2
            )
            "#,
        )
        .bind(before)
        .bind(limit)
        .execute(&mut *self.conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// TEKs created within `[start, end)` matching `regions`, honoring the
    /// traveler-exclusion flag (spec §4.5 step 2).
    pub async fn find_in_window(
        &mut self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        regions: &[String],
        include_travelers: bool,
    ) -> Result<Vec<Exposure>> {
        let rows: Vec<StorageExposure> = sqlx::query_as(
            r#"
            SELECT key_bytes, transmission_risk, app_package_name,
                   rolling_start_interval_number, rolling_period, regions, traveler,
                   created_at, local_provenance, federation_sync_id, health_authority_id,
                   report_type, days_since_onset_of_symptoms, revised_report_type,
                   revised_days_since_onset_of_symptoms, revised_at, export_import_id
            FROM exposure
            WHERE created_at >= $1 AND created_at < $2
              AND regions && $3
              AND ($4 OR NOT traveler)
            ORDER BY key_bytes
            "#,
        )
        .bind(start)
        .bind(end)
        .bind(regions)
        .bind(include_travelers)
        .fetch_all(&mut *self.conn)
        .await?;
        rows.into_iter().map(Exposure::try_from).collect()
    }

    /// TEKs created strictly after `since`, ordered for cursor-based
    /// pagination, honoring a push peer's include/exclude region filters
    /// and a soft per-call cap (spec §4.7, push/C10 side).
    pub async fn find_since(
        &mut self,
        since: DateTime<Utc>,
        include_regions: &[String],
        exclude_regions: &[String],
        limit: i64,
    ) -> Result<Vec<Exposure>> {
        let rows: Vec<StorageExposure> = sqlx::query_as(
            r#"
            SELECT key_bytes, transmission_risk, app_package_name,
                   rolling_start_interval_number, rolling_period, regions, traveler,
                   created_at, local_provenance, federation_sync_id, health_authority_id,
                   report_type, days_since_onset_of_symptoms, revised_report_type,
                   revised_days_since_onset_of_symptoms, revised_at, export_import_id
            FROM exposure
            WHERE created_at > $1
              AND (array_length($2::text[], 1) IS NULL OR regions && $2)
              AND NOT (regions && $3)
            ORDER BY created_at ASC, key_bytes ASC
            LIMIT $4
            "#,
        )
        .bind(since)
        .bind(include_regions)
        .bind(exclude_regions)
        .bind(limit)
        .fetch_all(&mut *self.conn)
        .await?;
        rows.into_iter().map(Exposure::try_from).collect()
    }

    pub async fn count(&mut self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM exposure")
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(row.try_get::<i64, _>("count")?)
    }

    /// For federation import (C11): same insert path as publish, tagged
    /// with provenance and the partner's sync id.
    pub async fn insert_federated(
        &mut self,
        exposure: &Exposure,
        health_authority_id: Option<HealthAuthorityId>,
    ) -> Result<()> {
        let mut exposure = exposure.clone();
        exposure.local_provenance = false;
        exposure.health_authority_id = health_authority_id;
        self.insert_new(&exposure).await
    }
}

use chrono::{DateTime, Utc};
use enserver_types::{HealthAuthorityId, HealthAuthorityStats};
use sqlx::PgConnection;

use crate::error::Result;
use crate::models::StorageHealthAuthorityStats;

/// Repository for `health_authority_stats` (C2): one row per health
/// authority per publish hour, updated in place (spec §4.3 step 7).
pub struct StatsDal<'a> {
    pub conn: &'a mut PgConnection,
}

impl<'a> StatsDal<'a> {
    pub async fn find(
        &mut self,
        health_authority_id: HealthAuthorityId,
        hour: DateTime<Utc>,
    ) -> Result<Option<HealthAuthorityStats>> {
        let row: Option<StorageHealthAuthorityStats> = sqlx::query_as(
            r#"
            SELECT health_authority_id, hour, publish_count, tek_count, revision_count,
                   oldest_tek_days_histogram, onset_age_days_histogram, missing_onset_count,
                   aging_revision_key_count
            FROM health_authority_stats WHERE health_authority_id = $1 AND hour = $2
            "#,
        )
        .bind(health_authority_id.0)
        .bind(hour)
        .fetch_optional(&mut *self.conn)
        .await?;
        row.map(HealthAuthorityStats::try_from).transpose()
    }

    /// Inserts the hourly row if absent, then applies `stats` as deltas
    /// via an atomic upsert — the caller computes the deltas for a single
    /// publish call and this merges them into the running totals.
    pub async fn upsert_merge(&mut self, stats: &HealthAuthorityStats) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO health_authority_stats (
                health_authority_id, hour, publish_count, tek_count, revision_count,
                oldest_tek_days_histogram, onset_age_days_histogram, missing_onset_count,
                aging_revision_key_count
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (health_authority_id, hour) DO UPDATE SET
                publish_count = health_authority_stats.publish_count + EXCLUDED.publish_count,
                tek_count = health_authority_stats.tek_count + EXCLUDED.tek_count,
                revision_count = health_authority_stats.revision_count + EXCLUDED.revision_count,
                oldest_tek_days_histogram = (
                    SELECT array_agg(a + b ORDER BY ord)
                    FROM UNNEST(health_authority_stats.oldest_tek_days_histogram, EXCLUDED.oldest_tek_days_histogram)
                         WITH ORDINALITY AS t(a, b, ord)
                ),
                onset_age_days_histogram = (
                    SELECT array_agg(a + b ORDER BY ord)
                    FROM UNNEST(health_authority_stats.onset_age_days_histogram, EXCLUDED.onset_age_days_histogram)
                         WITH ORDINALITY AS t(a, b, ord)
                ),
                missing_onset_count = health_authority_stats.missing_onset_count + EXCLUDED.missing_onset_count,
                aging_revision_key_count = health_authority_stats.aging_revision_key_count + EXCLUDED.aging_revision_key_count
            "#,
        )
        .bind(stats.health_authority_id.0)
        .bind(stats.hour)
        .bind(stats.publish_count)
        .bind(stats.tek_count)
        .bind(stats.revision_count)
        .bind(stats.oldest_tek_days_histogram.as_slice())
        .bind(stats.onset_age_days_histogram.as_slice())
        .bind(stats.missing_onset_count)
        .bind(stats.aging_revision_key_count)
        .execute(&mut *self.conn)
        .await?;
        Ok(())
    }
}

use chrono::{DateTime, Utc};
use enserver_types::{HealthAuthorityId, HealthAuthorityStats};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StorageHealthAuthorityStats {
    pub health_authority_id: i64,
    pub hour: DateTime<Utc>,
    pub publish_count: i64,
    pub tek_count: i64,
    pub revision_count: i64,
    pub oldest_tek_days_histogram: Vec<i64>,
    pub onset_age_days_histogram: Vec<i64>,
    pub missing_onset_count: i64,
    pub aging_revision_key_count: i64,
}

impl TryFrom<StorageHealthAuthorityStats> for HealthAuthorityStats {
    type Error = crate::error::DbError;

    fn try_from(row: StorageHealthAuthorityStats) -> Result<Self, Self::Error> {
        let oldest_tek_days_histogram = row
            .oldest_tek_days_histogram
            .try_into()
            .map_err(|_| invariant("oldest_tek_days_histogram has the wrong bucket count"))?;
        let onset_age_days_histogram = row
            .onset_age_days_histogram
            .try_into()
            .map_err(|_| invariant("onset_age_days_histogram has the wrong bucket count"))?;
        Ok(HealthAuthorityStats {
            health_authority_id: HealthAuthorityId(row.health_authority_id),
            hour: row.hour,
            publish_count: row.publish_count,
            tek_count: row.tek_count,
            revision_count: row.revision_count,
            oldest_tek_days_histogram,
            onset_age_days_histogram,
            missing_onset_count: row.missing_onset_count,
            aging_revision_key_count: row.aging_revision_key_count,
        })
    }
}

fn invariant(message: &str) -> crate::error::DbError {
    crate::error::DbError::InvariantViolation(message.to_string())
}

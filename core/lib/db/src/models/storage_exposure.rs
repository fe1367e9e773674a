use chrono::{DateTime, Utc};
use enserver_types::{Exposure, HealthAuthorityId, ReportType, RevisedShadow};

/// Row shape of the `exposure` table, mirroring the teacher's
/// `StorageX`/domain-type split (`core/lib/dal/src/models/*.rs`).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StorageExposure {
    pub key_bytes: Vec<u8>,
    pub transmission_risk: i32,
    pub app_package_name: String,
    pub rolling_start_interval_number: i32,
    pub rolling_period: i32,
    pub regions: Vec<String>,
    pub traveler: bool,
    pub created_at: DateTime<Utc>,
    pub local_provenance: bool,
    pub federation_sync_id: Option<String>,
    pub health_authority_id: Option<i64>,
    pub report_type: ReportType,
    pub days_since_onset_of_symptoms: Option<i32>,
    pub revised_report_type: Option<ReportType>,
    pub revised_days_since_onset_of_symptoms: Option<i32>,
    pub revised_at: Option<DateTime<Utc>>,
    pub export_import_id: Option<String>,
}

impl TryFrom<StorageExposure> for Exposure {
    type Error = crate::error::DbError;

    fn try_from(row: StorageExposure) -> Result<Self, Self::Error> {
        let key_bytes: [u8; 16] = row.key_bytes.try_into().map_err(|_| {
            crate::error::DbError::InvariantViolation("key_bytes is not 16 bytes".to_string())
        })?;
        let revised = match (row.revised_report_type, row.revised_at) {
            (Some(report_type), Some(revised_at)) => Some(RevisedShadow {
                report_type,
                days_since_onset_of_symptoms: row.revised_days_since_onset_of_symptoms,
                revised_at,
            }),
            _ => None,
        };
        Ok(Exposure {
            key_bytes,
            transmission_risk: row.transmission_risk,
            app_package_name: row.app_package_name,
            rolling_start_interval_number: row.rolling_start_interval_number,
            rolling_period: row.rolling_period,
            regions: row.regions.into_iter().collect(),
            traveler: row.traveler,
            created_at: row.created_at,
            local_provenance: row.local_provenance,
            federation_sync_id: row.federation_sync_id,
            health_authority_id: row.health_authority_id.map(HealthAuthorityId),
            report_type: row.report_type,
            days_since_onset_of_symptoms: row.days_since_onset_of_symptoms,
            revised,
            export_import_id: row.export_import_id,
        })
    }
}

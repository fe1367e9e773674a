//! Generated gRPC types for the `Federation.Fetch` stream (C10/C11), plus
//! conversions to/from this server's domain `Exposure`.

include!(concat!(env!("OUT_DIR"), "/enserver.federation.rs"));

use chrono::Utc;
use enserver_types::{Exposure, HealthAuthorityId, ReportType};

fn report_type_from_i32(value: i32) -> ReportType {
    match value {
        1 => ReportType::ConfirmedTest,
        2 => ReportType::ClinicalDiagnosis,
        3 => ReportType::SelfReport,
        4 => ReportType::Recursive,
        5 => ReportType::Revoked,
        _ => ReportType::Unknown,
    }
}

fn report_type_to_i32(value: ReportType) -> i32 {
    match value {
        ReportType::Unknown => 0,
        ReportType::ConfirmedTest => 1,
        ReportType::ClinicalDiagnosis => 2,
        ReportType::SelfReport => 3,
        ReportType::Recursive => 4,
        ReportType::Revoked => 5,
    }
}

impl ExposureKey {
    /// Builds the wire record a push peer sends for one local TEK (C10).
    pub fn from_exposure(exposure: &Exposure) -> Self {
        Self {
            key_data: exposure.key_bytes.to_vec(),
            transmission_risk_level: exposure.transmission_risk,
            rolling_start_interval_number: exposure.rolling_start_interval_number,
            rolling_period: exposure.rolling_period,
            report_type: report_type_to_i32(exposure.report_type),
            days_since_onset_of_symptoms: exposure.days_since_onset_of_symptoms.unwrap_or(0),
            regions: exposure.regions.iter().cloned().collect(),
            traveler: exposure.traveler,
        }
    }

    /// Converts a received wire record into an `Exposure` ready for
    /// `ExposureDal::insert_federated` (C11), tagged with the partner's
    /// identity and `local_provenance = false` (spec §4.7).
    pub fn into_exposure(self, partner: HealthAuthorityId, sync_id: String) -> Option<Exposure> {
        let key_bytes: [u8; 16] = self.key_data.try_into().ok()?;
        Some(Exposure {
            key_bytes,
            transmission_risk: self.transmission_risk_level,
            app_package_name: String::new(),
            rolling_start_interval_number: self.rolling_start_interval_number,
            rolling_period: self.rolling_period,
            regions: Exposure::normalize_regions(self.regions),
            traveler: self.traveler,
            created_at: Utc::now(),
            local_provenance: false,
            federation_sync_id: Some(sync_id),
            health_authority_id: Some(partner),
            report_type: report_type_from_i32(self.report_type),
            days_since_onset_of_symptoms: Some(self.days_since_onset_of_symptoms),
            revised: None,
            export_import_id: None,
        })
    }
}

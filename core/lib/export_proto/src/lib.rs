//! Generated protobuf types for TEK export artifacts (C9), plus
//! conversions from this server's domain types.

include!(concat!(env!("OUT_DIR"), "/enserver.export.rs"));

use enserver_types::ReportType;

impl From<ReportType> for temporary_exposure_key::ReportType {
    fn from(value: ReportType) -> Self {
        match value {
            ReportType::Unknown => temporary_exposure_key::ReportType::Unknown,
            ReportType::ConfirmedTest => temporary_exposure_key::ReportType::ConfirmedTest,
            ReportType::ClinicalDiagnosis => {
                temporary_exposure_key::ReportType::ConfirmedClinicalDiagnosis
            }
            ReportType::SelfReport => temporary_exposure_key::ReportType::SelfReport,
            ReportType::Recursive => temporary_exposure_key::ReportType::Recursive,
            ReportType::Revoked => temporary_exposure_key::ReportType::Revoked,
        }
    }
}

impl TemporaryExposureKey {
    /// Builds a wire key from a stored `Exposure`, using whichever report
    /// type/onset is current (a revision supersedes the original values
    /// it shadows).
    pub fn from_exposure(exposure: &enserver_types::Exposure) -> Self {
        let report_type: temporary_exposure_key::ReportType = exposure.report_type.into();
        Self {
            key_data: exposure.key_bytes.to_vec(),
            transmission_risk_level: exposure.transmission_risk,
            rolling_start_interval_number: exposure.rolling_start_interval_number,
            rolling_period: exposure.rolling_period,
            report_type: report_type as i32,
            days_since_onset_of_symptoms: exposure.days_since_onset_of_symptoms.unwrap_or(0),
        }
    }
}

impl From<&enserver_types::SignatureInfo> for SignatureInfo {
    fn from(info: &enserver_types::SignatureInfo) -> Self {
        Self {
            signing_key_version: info.key_version.clone(),
            signing_key_id: info.key_id.clone(),
            app_bundle_id: info.bundle_id.clone(),
            android_package: info.app_package_name.clone(),
            verification_key_version: String::new(),
            verification_key_id: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enserver_types::{Exposure, HealthAuthorityId};

    fn exposure() -> Exposure {
        Exposure {
            key_bytes: [9u8; 16],
            transmission_risk: 1,
            app_package_name: "com.example.app".to_string(),
            rolling_start_interval_number: 100,
            rolling_period: 144,
            regions: Default::default(),
            traveler: false,
            created_at: chrono::Utc::now(),
            local_provenance: true,
            federation_sync_id: None,
            health_authority_id: Some(HealthAuthorityId(1)),
            report_type: ReportType::ConfirmedTest,
            days_since_onset_of_symptoms: Some(3),
            revised: None,
            export_import_id: None,
        }
    }

    #[test]
    fn converts_exposure_to_wire_key() {
        let wire = TemporaryExposureKey::from_exposure(&exposure());
        assert_eq!(wire.key_data, vec![9u8; 16]);
        assert_eq!(wire.report_type, temporary_exposure_key::ReportType::ConfirmedTest as i32);
        assert_eq!(wire.days_since_onset_of_symptoms, 3);
    }
}

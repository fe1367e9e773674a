use enserver_export_proto::{temporary_exposure_key, TemporaryExposureKey};
use rand::RngCore;

/// Synthetic keys added when a batch's real TEK count falls short of
/// `MinRecords` (spec §4.5 step 3), so the presence or absence of real
/// data for a given window can't be inferred from record count alone.
/// These never touch `exposure`; they exist only in the artifact.
pub fn synthetic_keys(count: usize, rolling_start_interval_number: i32) -> Vec<TemporaryExposureKey> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| {
            let mut key_data = vec![0u8; 16];
            rng.fill_bytes(&mut key_data);
            TemporaryExposureKey {
                key_data,
                transmission_risk_level: 0,
                rolling_start_interval_number,
                rolling_period: 144,
                report_type: temporary_exposure_key::ReportType::Unknown as i32,
                days_since_onset_of_symptoms: 0,
            }
        })
        .collect()
}

/// How many synthetic keys to add: enough to reach `min_records`, capped by
/// `padding_range` (spec §4.5 step 3: "pad ... up to `PaddingRange` limit").
pub fn padding_needed(real_count: usize, min_records: usize, padding_range: usize) -> usize {
    min_records.saturating_sub(real_count).min(padding_range)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_up_to_min_records() {
        assert_eq!(padding_needed(10, 100, 500), 90);
    }

    #[test]
    fn caps_at_padding_range() {
        assert_eq!(padding_needed(0, 1000, 100), 100);
    }

    #[test]
    fn no_padding_when_already_above_minimum() {
        assert_eq!(padding_needed(200, 100, 500), 0);
    }

    #[test]
    fn synthetic_keys_are_well_formed() {
        let keys = synthetic_keys(3, 2650000);
        assert_eq!(keys.len(), 3);
        for key in &keys {
            assert_eq!(key.key_data.len(), 16);
            assert_eq!(key.rolling_period, 144);
        }
    }
}

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, TimeZone, Utc};
use enserver_config::PublishConfig;
use enserver_types::exposure::{KeyBytes, MAX_ROLLING_PERIOD, MIN_ROLLING_PERIOD};
use enserver_types::ReportType;
use enserver_verification::VerifiedClaims;
use std::collections::HashMap;

use crate::request::ExposureKeyPayload;

/// Length, in seconds, of one rolling-start interval unit (spec §3/§4.3:
/// the Exposure Notification 10-minute interval).
const INTERVAL_LENGTH_SECS: i64 = 600;

/// One accepted, decoded, and claims-enriched TEK, ready for the
/// insert/revise decision (spec §4.3 steps 3-4).
#[derive(Debug, Clone)]
pub struct TransformedKey {
    pub key_bytes: KeyBytes,
    pub rolling_start_interval_number: i32,
    pub rolling_period: i32,
    pub transmission_risk: i32,
    pub report_type: ReportType,
    pub days_since_onset_of_symptoms: Option<i32>,
}

pub fn interval_to_datetime(interval_number: i32) -> DateTime<Utc> {
    Utc.timestamp_opt(interval_number as i64 * INTERVAL_LENGTH_SECS, 0)
        .single()
        .unwrap_or_else(|| Utc.timestamp_opt(0, 0).single().unwrap())
}

/// Filters and enriches a request's raw key payloads per spec §4.3 step 3.
/// Order matters: structural validity and staleness are checked per-key
/// before the request-wide caps are applied, so a request with many
/// invalid keys doesn't consume cap budget that valid keys could use.
pub fn transform_keys(
    payloads: &[ExposureKeyPayload],
    claims: &VerifiedClaims,
    now: DateTime<Utc>,
    config: &PublishConfig,
) -> Vec<TransformedKey> {
    let max_age = chrono::Duration::from_std(config.max_interval_age).unwrap_or(chrono::Duration::zero());
    let truncate_window =
        chrono::Duration::from_std(config.created_at_truncate_window).unwrap_or(chrono::Duration::zero());

    let mut accepted: Vec<TransformedKey> = payloads
        .iter()
        .filter_map(|payload| decode_and_enrich(payload, claims))
        .filter(|key| (MIN_ROLLING_PERIOD..=MAX_ROLLING_PERIOD).contains(&key.rolling_period))
        .filter(|key| interval_to_datetime(last_interval(key)) >= now - max_age)
        .filter(|key| interval_to_datetime(key.rolling_start_interval_number) <= now + truncate_window)
        .collect();

    if !config.release_same_day_keys {
        accepted.retain(|key| interval_to_datetime(last_interval(key)) <= now);
    }

    accepted.truncate(config.max_keys_on_publish);
    cap_same_start_interval(&mut accepted, config.max_same_start_interval_keys);

    accepted
}

fn last_interval(key: &TransformedKey) -> i32 {
    key.rolling_start_interval_number + key.rolling_period
}

fn decode_and_enrich(payload: &ExposureKeyPayload, claims: &VerifiedClaims) -> Option<TransformedKey> {
    let decoded = STANDARD.decode(&payload.key).ok()?;
    let key_bytes: KeyBytes = decoded.try_into().ok()?;

    let transmission_risk = claims
        .trisk
        .iter()
        .find(|o| o.interval_number == payload.rolling_start_interval_number)
        .map(|o| o.transmission_risk)
        .unwrap_or(payload.transmission_risk);

    let days_since_onset_of_symptoms = claims.symptom_onset_interval.map(|onset_interval| {
        (payload.rolling_start_interval_number - onset_interval).div_euclid(MAX_ROLLING_PERIOD)
    });

    Some(TransformedKey {
        key_bytes,
        rolling_start_interval_number: payload.rolling_start_interval_number,
        rolling_period: payload.rolling_period,
        transmission_risk,
        report_type: claims.report_type,
        days_since_onset_of_symptoms,
    })
}

/// Keeps at most `cap` keys per distinct `rolling_start_interval_number`,
/// preserving the original relative order of survivors (spec §4.3 step 3:
/// "cap keys sharing the same start interval").
fn cap_same_start_interval(keys: &mut Vec<TransformedKey>, cap: usize) {
    let mut seen: HashMap<i32, usize> = HashMap::new();
    keys.retain(|key| {
        let count = seen.entry(key.rolling_start_interval_number).or_insert(0);
        *count += 1;
        *count <= cap
    });
}

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::Utc;
use enserver_authorized_apps::AuthorizedAppRegistry;
use enserver_config::{PublishConfig, RevisionTokenConfig};
use enserver_crypto_primitives::jwt::ParsedJwt;
use enserver_db::{DbPool, ExposureDal, HealthAuthorityDal, StatsDal};
use enserver_revision_token::{build_token, RevisionKeyProvider, RevisionTokenCodec};
use enserver_types::{Exposure, HealthAuthorityStats, ReportType, RevisionTokenEntry};
use enserver_verification::{verify, ClockSkew, VerifiedClaims};
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::error::PublishError;
use crate::metrics::METRICS;
use crate::request::{ExposureKeyPayload, PublishRequest, PublishResponse};
use crate::revision::{apply_revision_decision, RevisionOutcome};
use crate::transform::{interval_to_datetime, transform_keys, TransformedKey};

/// Everything the publish handler needs, assembled once at wiring time
/// and shared across requests (spec §4.3).
#[derive(Clone)]
pub struct PublishState {
    pub pool: DbPool,
    pub apps: Arc<AuthorizedAppRegistry>,
    pub revision_keys: Arc<dyn RevisionKeyProvider>,
    pub revision_token_config: RevisionTokenConfig,
    pub publish_config: PublishConfig,
    pub verification_skew: ClockSkew,
}

pub async fn publish(State(state): State<PublishState>, body: axum::body::Bytes) -> Response {
    let deadline = tokio::time::Instant::now() + state.publish_config.min_request_duration;
    let result = run_publish(&state, &body).await;
    tokio::time::sleep_until(deadline).await;
    match result {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => err.into_response(),
    }
}

fn verification_failed() -> PublishError {
    METRICS.bad_verification.inc();
    PublishError::HealthAuthorityVerificationFailed
}

async fn run_publish(state: &PublishState, body: &[u8]) -> Result<PublishResponse, PublishError> {
    let request: PublishRequest = serde_json::from_slice(body).map_err(|_| PublishError::BadJson)?;
    let now = Utc::now();

    let app = state.apps.require(&request.health_authority_id).await.map_err(|_| {
        METRICS.app_not_authorized.inc();
        PublishError::AppNotAuthorized
    })?;

    let hmac_key = STANDARD
        .decode(&request.hmac_key)
        .map_err(|_| verification_failed())?;
    let teks_for_mac = decode_teks_for_mac(&request.keys);

    let mut tx = state
        .pool
        .begin()
        .await
        .map_err(|e| PublishError::Internal(e.into()))?;

    let (health_authority_id, claims) = if app.bypass_verification {
        (None, unverified_claims())
    } else {
        let parsed = ParsedJwt::parse(&request.verification_payload).map_err(|_| verification_failed())?;
        let health_authority = {
            let mut ha_dal = HealthAuthorityDal { conn: &mut tx };
            ha_dal
                .find_by_issuer(&parsed.claims.iss)
                .await
                .map_err(|e| PublishError::Internal(e.into()))?
                .ok_or_else(verification_failed)?
        };
        if !app.allows_health_authority(health_authority.id) {
            return Err(verification_failed());
        }
        let claims = verify(
            &request.verification_payload,
            &health_authority,
            &hmac_key,
            &teks_for_mac,
            now,
            state.verification_skew,
        )
        .map_err(|_| verification_failed())?;
        (Some(health_authority.id), claims)
    };

    let regions = resolve_regions(&request.regions, &app.allowed_regions, |r| app.allows_region(r));
    let transformed = transform_keys(&request.keys, &claims, now, &state.publish_config);

    let revision_codec = RevisionTokenCodec::new(
        state.revision_keys.as_ref(),
        state.revision_token_config.aad.clone(),
        state.revision_token_config.min_decoded_length,
    );
    let mut aging_key_used = false;
    let decoded_token = if request.revision_token.is_empty() || app.bypass_revision_token {
        None
    } else {
        let wire = STANDARD
            .decode(&request.revision_token)
            .map_err(|_| PublishError::RevisionTokenInvalid)?;
        let (token, key_id) = revision_codec.decode(&wire).await.map_err(|_| {
            METRICS.revision_token_invalid.inc();
            PublishError::RevisionTokenInvalid
        })?;
        if let Ok((current_id, _)) = state.revision_keys.current_key().await {
            if key_id != current_id {
                aging_key_used = true;
            }
        }
        Some(token)
    };

    let mut inserted = 0usize;
    let mut revised = 0usize;
    let mut accepted_entries = Vec::with_capacity(transformed.len());
    let mut accepted_keys: Vec<&TransformedKey> = Vec::with_capacity(transformed.len());

    {
        let mut exposure_dal = ExposureDal { conn: &mut tx };
        for key in &transformed {
            let outcome = apply_revision_decision(
                &mut exposure_dal,
                key,
                decoded_token.as_ref(),
                &app,
                &request.health_authority_id,
                health_authority_id,
                &regions,
                request.traveler,
                now,
            )
            .await
            .map_err(|e| PublishError::Internal(e.into()))?;

            match outcome {
                RevisionOutcome::Inserted => {
                    inserted += 1;
                    accepted_entries.push(entry_for(key));
                    accepted_keys.push(key);
                }
                RevisionOutcome::Revised => {
                    revised += 1;
                    accepted_entries.push(entry_for(key));
                    accepted_keys.push(key);
                }
                RevisionOutcome::DroppedDuplicate => {
                    METRICS.keys_dropped_duplicate.inc();
                }
            }
        }
    }
    METRICS.keys_inserted.inc_by(inserted as u64);
    METRICS.keys_revised.inc_by(revised as u64);
    if aging_key_used {
        METRICS.aging_revision_key_accepted.inc();
    }

    if let Some(ha_id) = health_authority_id {
        let mut delta = HealthAuthorityStats::new_for_hour(ha_id, now);
        delta.record_publish();
        for _ in 0..revised {
            delta.record_revision();
        }
        for key in &accepted_keys {
            delta.record_tek(oldest_tek_days(key, now));
            delta.record_onset_age(key.days_since_onset_of_symptoms.map(i64::from));
        }
        if aging_key_used {
            delta.record_aging_revision_key();
        }
        StatsDal { conn: &mut tx }
            .upsert_merge(&delta)
            .await
            .map_err(|e| PublishError::Internal(e.into()))?;
    }

    let new_token = build_token(accepted_entries, now);
    let (wire, _) = revision_codec
        .encode(&new_token)
        .await
        .map_err(|e| PublishError::Internal(e.into()))?;
    let revision_token = STANDARD.encode(wire);

    tx.commit().await.map_err(|e| PublishError::Internal(e.into()))?;

    let padding = random_padding(response_padding_len(&state.publish_config, revision_token.len()));
    Ok(PublishResponse {
        revision_token,
        inserted_exposures: inserted + revised,
        padding,
    })
}

fn unverified_claims() -> VerifiedClaims {
    VerifiedClaims {
        report_type: ReportType::Unknown,
        symptom_onset_interval: None,
        test_date_interval: None,
        trisk: Vec::new(),
    }
}

fn resolve_regions(
    requested: &[String],
    app_default: &BTreeSet<String>,
    allowed: impl Fn(&str) -> bool,
) -> BTreeSet<String> {
    if requested.is_empty() {
        return app_default.clone();
    }
    Exposure::normalize_regions(requested.iter().cloned())
        .into_iter()
        .filter(|r| allowed(r))
        .collect()
}

fn decode_teks_for_mac(payloads: &[ExposureKeyPayload]) -> Vec<enserver_verification::TekForMac> {
    payloads
        .iter()
        .filter_map(|p| {
            let bytes = STANDARD.decode(&p.key).ok()?;
            let key_bytes: [u8; 16] = bytes.try_into().ok()?;
            Some(enserver_verification::TekForMac {
                key_bytes,
                interval_number: p.rolling_start_interval_number,
                interval_count: p.rolling_period,
                transmission_risk: p.transmission_risk,
            })
        })
        .collect()
}

fn entry_for(key: &TransformedKey) -> RevisionTokenEntry {
    RevisionTokenEntry {
        key_bytes: key.key_bytes,
        interval_number: key.rolling_start_interval_number,
        interval_count: key.rolling_period,
    }
}

fn oldest_tek_days(key: &TransformedKey, now: chrono::DateTime<Utc>) -> i64 {
    (now - interval_to_datetime(key.rolling_start_interval_number)).num_days().max(0)
}

fn response_padding_len(config: &PublishConfig, token_len: usize) -> usize {
    const APPROXIMATE_ENVELOPE_BYTES: usize = 64;
    config
        .response_padding_min_bytes
        .saturating_sub(token_len + APPROXIMATE_ENVELOPE_BYTES)
}

fn random_padding(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

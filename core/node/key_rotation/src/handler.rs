use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use enserver_config::KeyRotationConfig;
use enserver_db::{advisory_lock_name_for_key_rotation, try_xact_lock, DbPool, RevisionKeyDal};
use serde::Serialize;

use crate::error::KeyRotationError;
use crate::kms::KeyMaterialSource;
use crate::metrics::METRICS;

/// Dependencies for one `/key-rotation/rotate-keys` invocation (spec
/// §4.8).
#[derive(Clone)]
pub struct KeyRotationState {
    pub pool: DbPool,
    pub key_source: Arc<dyn KeyMaterialSource>,
    pub config: KeyRotationConfig,
}

#[derive(Debug, Serialize)]
pub struct RotateKeysResponse {
    created: u32,
    deleted: u32,
}

pub async fn rotate_keys(State(state): State<KeyRotationState>) -> Response {
    match run(&state).await {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Mints a new allowed key once the current one reaches `NewKeyPeriod`,
/// atomically demoting the prior allowed key, then hard-deletes any
/// demoted key older than `DeleteOldKeyPeriod` (spec §4.8). Serialized by
/// a single advisory lock so only one rotation runs at a time.
async fn run(state: &KeyRotationState) -> Result<RotateKeysResponse, KeyRotationError> {
    let now = Utc::now();
    let mut tx = state.pool.begin().await.map_err(|e| KeyRotationError::Internal(e.into()))?;

    let lock_name = advisory_lock_name_for_key_rotation();
    if !try_xact_lock(&mut tx, lock_name).await.map_err(|e| KeyRotationError::Internal(e.into()))? {
        METRICS.lock_contention.inc();
        return Ok(RotateKeysResponse { created: 0, deleted: 0 });
    }

    let mut dal = RevisionKeyDal { conn: &mut tx };
    let current = dal.current().await.map_err(|e| KeyRotationError::Internal(e.into()))?;

    let new_key_period = chrono::Duration::from_std(state.config.new_key_period)
        .map_err(|e| KeyRotationError::Internal(anyhow::anyhow!(e)))?;
    let needs_new_key = match &current {
        Some(row) => now - row.created_at >= new_key_period,
        None => true,
    };

    let mut created = 0u32;
    if needs_new_key {
        let wrapped = state
            .key_source
            .mint_wrapped_key()
            .await
            .map_err(|e| KeyRotationError::Internal(anyhow::anyhow!(e)))?;
        if let Some(row) = &current {
            dal.mark_disallowed(row.meta().id).await.map_err(|e| KeyRotationError::Internal(e.into()))?;
        }
        dal.insert(&wrapped).await.map_err(|e| KeyRotationError::Internal(e.into()))?;
        created = 1;
        METRICS.revision_keys_created.inc();
    }

    let delete_old_key_period = chrono::Duration::from_std(state.config.delete_old_key_period)
        .map_err(|e| KeyRotationError::Internal(anyhow::anyhow!(e)))?;
    let cutoff = now - delete_old_key_period;
    let stale = dal.disallowed_before(cutoff).await.map_err(|e| KeyRotationError::Internal(e.into()))?;
    let mut deleted = 0u32;
    for key in &stale {
        dal.delete(key.id).await.map_err(|e| KeyRotationError::Internal(e.into()))?;
        deleted += 1;
    }
    METRICS.revision_keys_deleted.inc_by(deleted as u64);

    tx.commit().await.map_err(|e| KeyRotationError::Internal(e.into()))?;
    Ok(RotateKeysResponse { created, deleted })
}

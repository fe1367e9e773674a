use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use enserver_config::CleanupConfig;
use enserver_db::{
    advisory_lock_name_for_export_cleanup, advisory_lock_name_for_exposure_cleanup,
    advisory_lock_name_for_index, try_xact_lock, DbPool, ExportDal, ExposureDal,
};
use enserver_export_worker::index;
use enserver_object_store::ObjectStore;
use enserver_types::{ExportBatchId, ExportFileStatus};
use serde::Serialize;

use crate::error::CleanupError;
use crate::metrics::METRICS;

/// Dependencies shared by both retention sweeps (spec §4.6).
#[derive(Clone)]
pub struct CleanupState {
    pub pool: DbPool,
    pub object_store: Arc<dyn ObjectStore>,
    pub config: CleanupConfig,
}

#[derive(Debug, Serialize)]
pub struct CleanupExposureResponse {
    deleted: u64,
}

#[derive(Debug, Serialize)]
pub struct CleanupExportResponse {
    files_expired: u64,
    batches_deleted: u64,
}

pub async fn cleanup_exposure(State(state): State<CleanupState>) -> Response {
    match run_exposure_cleanup(&state).await {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn cleanup_export(State(state): State<CleanupState>) -> Response {
    match run_export_cleanup(&state).await {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Deletes TEKs older than `TTL` in advisory-locked batches of
/// `DeleteBatchSize` until none remain or `Timeout` elapses (spec §4.6:
/// "delete TEKs with `created_at < now - TTL`... in batches of N
/// (advisory-locked)").
async fn run_exposure_cleanup(state: &CleanupState) -> Result<CleanupExposureResponse, CleanupError> {
    let deadline = tokio::time::Instant::now() + state.config.timeout;
    let cutoff = Utc::now()
        - chrono::Duration::from_std(state.config.ttl).map_err(|e| CleanupError::Internal(anyhow::anyhow!(e)))?;
    let lock_name = advisory_lock_name_for_exposure_cleanup();

    let mut deleted = 0u64;
    loop {
        if tokio::time::Instant::now() >= deadline {
            METRICS.cleanup_timeout.inc();
            break;
        }

        let mut tx = state.pool.begin().await.map_err(|e| CleanupError::Internal(e.into()))?;
        if !try_xact_lock(&mut tx, lock_name).await.map_err(|e| CleanupError::Internal(e.into()))? {
            break;
        }
        let n = ExposureDal { conn: &mut tx }
            .delete_before(cutoff, state.config.delete_batch_size as i64)
            .await
            .map_err(|e| CleanupError::Internal(e.into()))?;
        tx.commit().await.map_err(|e| CleanupError::Internal(e.into()))?;

        deleted += n;
        METRICS.exposures_deleted.inc_by(n);
        if n == 0 {
            break;
        }
    }

    Ok(CleanupExposureResponse { deleted })
}

/// Expires `ExportFile` rows whose batch has aged past `TTL`, deletes the
/// corresponding blobs, drops them from `index.txt`, and deletes the
/// `ExportBatch` row once every file in it is gone (spec §4.6). Re-entrant:
/// a file already marked EXPIRED is simply not selected again, so a run
/// interrupted mid-batch resumes cleanly.
async fn run_export_cleanup(state: &CleanupState) -> Result<CleanupExportResponse, CleanupError> {
    let deadline = tokio::time::Instant::now() + state.config.timeout;
    let cutoff = Utc::now()
        - chrono::Duration::from_std(state.config.ttl).map_err(|e| CleanupError::Internal(anyhow::anyhow!(e)))?;
    let lock_name = advisory_lock_name_for_export_cleanup();

    let mut files_expired = 0u64;
    let mut batches_deleted = 0u64;

    loop {
        if tokio::time::Instant::now() >= deadline {
            METRICS.cleanup_timeout.inc();
            break;
        }

        let mut tx = state.pool.begin().await.map_err(|e| CleanupError::Internal(e.into()))?;
        if !try_xact_lock(&mut tx, lock_name).await.map_err(|e| CleanupError::Internal(e.into()))? {
            break;
        }
        let expired = ExportDal { conn: &mut tx }
            .expire_files_before(cutoff, state.config.delete_batch_size as i64)
            .await
            .map_err(|e| CleanupError::Internal(e.into()))?;
        tx.commit().await.map_err(|e| CleanupError::Internal(e.into()))?;

        if expired.is_empty() {
            break;
        }

        let mut by_batch: HashMap<ExportBatchId, Vec<String>> = HashMap::new();
        for file in &expired {
            by_batch.entry(file.batch_id).or_default().push(file.filename.clone());
        }

        for (batch_id, filenames) in by_batch {
            let config = {
                let mut conn = state.pool.raw().acquire().await.map_err(|e| CleanupError::Internal(e.into()))?;
                ExportDal { conn: &mut conn }
                    .config_for_batch(batch_id)
                    .await
                    .map_err(|e| CleanupError::Internal(e.into()))?
                    .ok_or_else(|| CleanupError::Internal(anyhow::anyhow!("export config for batch {} not found", batch_id.0)))?
            };

            for filename in &filenames {
                let object_name = format!("{}/{filename}", config.filename_root);
                match state.object_store.delete_object(&config.bucket_name, &object_name).await {
                    Ok(()) => {}
                    Err(enserver_object_store::ObjectStoreError::NotFound(_)) => {}
                    Err(err) => return Err(CleanupError::Internal(err.into())),
                }
            }

            {
                let index_lock = advisory_lock_name_for_index(&config.bucket_name, &config.filename_root);
                let mut tx = state.pool.begin().await.map_err(|e| CleanupError::Internal(e.into()))?;
                while !try_xact_lock(&mut tx, &index_lock).await.map_err(|e| CleanupError::Internal(e.into()))? {
                    tx.rollback().await.map_err(|e| CleanupError::Internal(e.into()))?;
                    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                    tx = state.pool.begin().await.map_err(|e| CleanupError::Internal(e.into()))?;
                }
                index::remove(state.object_store.as_ref(), &config.bucket_name, &config.filename_root, &filenames)
                    .await
                    .map_err(|e| CleanupError::Internal(e.into()))?;
                tx.commit().await.map_err(|e| CleanupError::Internal(e.into()))?;
            }

            files_expired += filenames.len() as u64;
            METRICS.export_files_expired.inc_by(filenames.len() as u64);

            let mut conn = state.pool.raw().acquire().await.map_err(|e| CleanupError::Internal(e.into()))?;
            let remaining = ExportDal { conn: &mut conn }
                .files_for_batch(batch_id)
                .await
                .map_err(|e| CleanupError::Internal(e.into()))?;
            if remaining.iter().all(|f| f.status == ExportFileStatus::Expired) {
                ExportDal { conn: &mut conn }
                    .mark_deleted(batch_id)
                    .await
                    .map_err(|e| CleanupError::Internal(e.into()))?;
                batches_deleted += 1;
                METRICS.export_batches_deleted.inc();
            }
        }
    }

    Ok(CleanupExportResponse { files_expired, batches_deleted })
}

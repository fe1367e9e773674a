use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use enserver_config::ExportSchedulerConfig;
use enserver_db::{advisory_lock_name_for_config, try_xact_lock, DbPool, ExportDal};
use enserver_types::ExportConfig;
use serde::Serialize;

use crate::error::SchedulerError;
use crate::metrics::METRICS;
use crate::window::truncate_down;

/// Dependencies for one `/export/create-batches` run (spec §4.4).
#[derive(Clone)]
pub struct SchedulerState {
    pub pool: DbPool,
    pub config: ExportSchedulerConfig,
}

#[derive(Debug, Serialize)]
pub struct CreateBatchesResponse {
    batches_created: usize,
    configs_skipped: usize,
}

pub async fn create_batches(State(state): State<SchedulerState>) -> Response {
    match run(&state).await {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn run(state: &SchedulerState) -> Result<CreateBatchesResponse, SchedulerError> {
    let now = Utc::now();
    let mut tx = state.pool.begin().await.map_err(|e| SchedulerError::Internal(e.into()))?;
    let configs: Vec<ExportConfig> = ExportDal { conn: &mut tx }
        .active_configs(now)
        .await
        .map_err(|e| SchedulerError::Internal(e.into()))?;
    tx.commit().await.map_err(|e| SchedulerError::Internal(e.into()))?;

    let mut batches_created = 0usize;
    let mut configs_skipped = 0usize;

    for config in configs {
        let mut tx = state.pool.begin().await.map_err(|e| SchedulerError::Internal(e.into()))?;
        let lock_name = advisory_lock_name_for_config(config.id.0);
        let acquired = try_xact_lock(&mut tx, &lock_name)
            .await
            .map_err(|e| SchedulerError::Internal(e.into()))?;
        if !acquired {
            METRICS.batcher_lock_contention.inc();
            configs_skipped += 1;
            continue;
        }

        let created = create_batches_for_config(&mut tx, &config, now, state.config).await?;
        tx.commit().await.map_err(|e| SchedulerError::Internal(e.into()))?;
        batches_created += created;
    }

    METRICS.batcher_created.inc_by(batches_created as u64);
    Ok(CreateBatchesResponse { batches_created, configs_skipped })
}

/// Advances one config by whole `Period` increments up to
/// `now - MinWindowAge`, truncated to `TruncateWindow` (spec §4.4 steps
/// 1-2), inserting one `OPEN` `ExportBatch` row per increment.
async fn create_batches_for_config(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    config: &ExportConfig,
    now: chrono::DateTime<Utc>,
    scheduler_config: ExportSchedulerConfig,
) -> Result<usize, SchedulerError> {
    let mut dal = ExportDal { conn: &mut **tx };
    let mut start = match dal
        .latest_batch_end(config.id)
        .await
        .map_err(|e| SchedulerError::Internal(e.into()))?
    {
        // A prior batch's end is already an aligned boundary; only the
        // very first window needs truncating down from `config.from`.
        Some(end) => end,
        None => truncate_down(config.from, scheduler_config.truncate_window),
    };

    let deadline_raw = now - chrono::Duration::from_std(scheduler_config.min_window_age)
        .map_err(|e| SchedulerError::Internal(anyhow::anyhow!(e)))?;
    let deadline = truncate_down(deadline_raw, scheduler_config.truncate_window);

    let signature_info_ids: Vec<i64> = config.signature_info_ids.iter().map(|id| id.0).collect();

    let mut created = 0usize;
    while start + config.period <= deadline {
        let end = start + config.period;
        dal.insert_batch(
            config.id,
            start,
            end,
            &config.output_region,
            &signature_info_ids,
            &config.input_regions,
        )
        .await
        .map_err(|e| SchedulerError::Internal(e.into()))?;
        created += 1;
        start = end;
    }

    Ok(created)
}

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use enserver_config::ExportWorkerConfig;
use enserver_db::{advisory_lock_name_for_index, try_xact_lock, DbPool, ExportDal, ExposureDal, SignatureInfoDal};
use enserver_export_proto::TemporaryExposureKey;
use enserver_object_store::ObjectStore;
use enserver_types::{Exposure, ExportBatch};
use serde::Serialize;

use crate::artifact::{build_file, filename_for, zip_file, ArtifactError, FileRecords};
use crate::error::{BatchError, WorkerError};
use crate::index;
use crate::metrics::METRICS;
use crate::padding::{padding_needed, synthetic_keys};
use crate::signing::SigningKeyProvider;

/// Dependencies for one `/export/do-work` invocation (spec §4.5).
#[derive(Clone)]
pub struct WorkerState {
    pub pool: DbPool,
    pub object_store: Arc<dyn ObjectStore>,
    pub signing_keys: Arc<dyn SigningKeyProvider>,
    pub config: ExportWorkerConfig,
}

#[derive(Debug, Serialize)]
pub struct DoWorkResponse {
    batches_completed: usize,
}

pub async fn do_work(State(state): State<WorkerState>) -> Response {
    match run(&state).await {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Single-threaded claim-and-work loop, stopping at `WorkerTimeout` or
/// when no more claimable batches remain (spec §4.5).
async fn run(state: &WorkerState) -> Result<DoWorkResponse, WorkerError> {
    let deadline = tokio::time::Instant::now() + state.config.worker_timeout;
    let mut batches_completed = 0usize;

    loop {
        if tokio::time::Instant::now() >= deadline {
            METRICS.worker_timeout.inc();
            break;
        }

        let mut tx = state.pool.begin().await.map_err(|e| WorkerError::Internal(e.into()))?;
        let claimed = ExportDal { conn: &mut tx }
            .claim_next_batch(state.config.create_timeout.as_secs() as i64)
            .await
            .map_err(|e| WorkerError::Internal(e.into()))?;
        tx.commit().await.map_err(|e| WorkerError::Internal(e.into()))?;

        let Some(batch) = claimed else { break };

        match process_batch(state, &batch).await {
            Ok(()) => {
                batches_completed += 1;
                METRICS.batches_completed.inc();
            }
            Err(err) => {
                METRICS.batcher_failure.inc();
                tracing::error!(
                    batch_id = batch.id.0,
                    error = %err,
                    "export worker batch failed; leaving PENDING for retry"
                );
            }
        }
    }

    Ok(DoWorkResponse { batches_completed })
}

/// Materializes one claimed batch end to end (spec §4.5 steps 2-7). Any
/// failure here is caught by the caller and left for the next run to
/// retry against the still-PENDING batch.
async fn process_batch(state: &WorkerState, batch: &ExportBatch) -> anyhow::Result<()> {
    let config = {
        let mut conn = state.pool.raw().acquire().await?;
        ExportDal { conn: &mut conn }
            .find_config(batch.config_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("export config {} not found", batch.config_id.0))?
    };
    let bucket = config.bucket_name;
    let filename_root = config.filename_root;
    let include_travelers = config.include_travelers;
    let max_records_override = config.max_records_override;

    let exposures = {
        let mut conn = state.pool.raw().acquire().await?;
        ExposureDal { conn: &mut conn }
            .find_in_window(batch.start_timestamp, batch.end_timestamp, &batch.input_regions, include_travelers)
            .await?
    };

    let signature_infos = {
        let mut conn = state.pool.raw().acquire().await?;
        SignatureInfoDal { conn: &mut conn }.find_many(&batch.signature_info_ids).await?
    };

    let (mut keys, mut revised_keys) = partition_and_convert(exposures);
    keys.sort_by(|a, b| a.key_data.cmp(&b.key_data));
    revised_keys.sort_by(|a, b| a.key_data.cmp(&b.key_data));

    let real_count = keys.len() + revised_keys.len();
    let to_pad = padding_needed(real_count, state.config.min_records, state.config.padding_range);
    if to_pad > 0 {
        keys.extend(synthetic_keys(to_pad, interval_for(batch.start_timestamp)));
    }

    let max_records = max_records_override.unwrap_or(state.config.max_records as i64).max(1) as usize;
    let files = split_into_files(keys, revised_keys, max_records);
    let file_count = files.len() as i32;

    let start_unix = batch.start_timestamp.timestamp();
    let end_unix = batch.end_timestamp.timestamp();

    let mut uploaded_filenames = Vec::with_capacity(files.len());
    for (i, records) in files.into_iter().enumerate() {
        let batch_num = (i + 1) as i32;
        let built = build_file(
            start_unix,
            end_unix,
            &batch.output_region,
            batch_num,
            file_count,
            records,
            &signature_infos,
            state.signing_keys.as_ref(),
        )
        .await
        .map_err(|e| match e {
            ArtifactError::SignFailed(msg) => anyhow::Error::from(BatchError::SignFailed(msg)),
            other => anyhow::anyhow!(other),
        })?;
        let zip_bytes = zip_file(&built).map_err(|e| anyhow::anyhow!(e))?;

        let filename = filename_for(start_unix, end_unix, batch_num);
        let object_name = format!("{filename_root}/{filename}");
        state
            .object_store
            .create_object(&bucket, &object_name, &zip_bytes)
            .await
            .map_err(BatchError::BlobWriteFailed)?;

        let mut conn = state.pool.raw().acquire().await?;
        ExportDal { conn: &mut conn }
            .insert_file(batch.id, &filename, batch_num, file_count, &batch.output_region)
            .await
            .map_err(BatchError::DbUpdateFailed)?;

        uploaded_filenames.push(filename);
        METRICS.files_created.inc();
    }

    {
        let lock_name = advisory_lock_name_for_index(&bucket, &filename_root);
        let mut tx = acquire_index_lock(state, &lock_name).await?;
        index::append(state.object_store.as_ref(), &bucket, &filename_root, &uploaded_filenames)
            .await
            .map_err(BatchError::BlobWriteFailed)?;
        tx.commit().await?;
    }

    let mut conn = state.pool.raw().acquire().await?;
    ExportDal { conn: &mut conn }
        .mark_complete(batch.id)
        .await
        .map_err(BatchError::DbUpdateFailed)?;

    Ok(())
}

fn partition_and_convert(exposures: Vec<Exposure>) -> (Vec<TemporaryExposureKey>, Vec<TemporaryExposureKey>) {
    let mut keys = Vec::new();
    let mut revised_keys = Vec::new();
    for exposure in &exposures {
        // `key_bytes` is a type-guaranteed `[u8; 16]`; this recheck exists
        // only so a future loosening of that guarantee (e.g. a federation
        // import path that decodes raw bytes) fails closed per spec §4.5.
        if !exposure.is_structurally_valid() {
            METRICS.bad_key_length.inc();
            continue;
        }
        let wire = TemporaryExposureKey::from_exposure(exposure);
        if exposure.revised.is_some() {
            revised_keys.push(wire);
        } else {
            keys.push(wire);
        }
    }
    (keys, revised_keys)
}

/// Splits `keys` followed by `revised_keys` into files of at most
/// `max_records` *combined* records each (spec §4.5 step 3: "split into N
/// files of size ≤ MaxRecords"). Chunking the two lists independently
/// would let a file's `keys` chunk and `revised_keys` chunk both be full,
/// so the file as a whole exceeds `max_records`; chunking the concatenated
/// sequence and then splitting each chunk back into its keys/revised_keys
/// halves keeps every file within the cap while preserving the
/// keys-before-revised-keys ordering within each file.
fn split_into_files(
    keys: Vec<TemporaryExposureKey>,
    revised_keys: Vec<TemporaryExposureKey>,
    max_records: usize,
) -> Vec<FileRecords> {
    if keys.is_empty() && revised_keys.is_empty() {
        return vec![FileRecords { keys: Vec::new(), revised_keys: Vec::new() }];
    }

    let max_records = max_records.max(1);
    let key_count = keys.len();
    let mut combined = keys;
    combined.extend(revised_keys);

    combined
        .chunks(max_records)
        .enumerate()
        .map(|(chunk_index, chunk)| {
            let chunk_start = chunk_index * max_records;
            let split_at = key_count.saturating_sub(chunk_start).min(chunk.len());
            let (keys, revised_keys) = chunk.split_at(split_at);
            FileRecords { keys: keys.to_vec(), revised_keys: revised_keys.to_vec() }
        })
        .collect()
}

/// Blocks (with backoff) until the named per-index advisory lock is held,
/// serializing concurrent `index.txt` read-modify-writes from other
/// worker instances or a concurrent cleanup run against the same
/// `(bucket, filenameRoot)` (spec §9: index updates are read-modify-write
/// and must not race).
async fn acquire_index_lock(
    state: &WorkerState,
    lock_name: &str,
) -> anyhow::Result<sqlx::Transaction<'static, sqlx::Postgres>> {
    loop {
        let mut tx = state.pool.begin().await?;
        if try_xact_lock(&mut tx, lock_name).await? {
            return Ok(tx);
        }
        tx.rollback().await?;
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
}

/// The EN interval number covering `at`, used as the rolling start for
/// synthetic padding keys so they look plausible for the window.
fn interval_for(at: chrono::DateTime<Utc>) -> i32 {
    (at.timestamp() / 600) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8) -> TemporaryExposureKey {
        TemporaryExposureKey {
            key_data: vec![byte; 16],
            ..Default::default()
        }
    }

    fn total_records(files: &[FileRecords]) -> usize {
        files.iter().map(|f| f.keys.len() + f.revised_keys.len()).sum()
    }

    #[test]
    fn no_file_exceeds_max_records_when_both_keys_and_revised_keys_are_present() {
        let keys: Vec<_> = (0..5).map(key).collect();
        let revised_keys: Vec<_> = (5..8).map(key).collect();

        let files = split_into_files(keys, revised_keys, 4);

        assert_eq!(total_records(&files), 8);
        for file in &files {
            assert!(
                file.keys.len() + file.revised_keys.len() <= 4,
                "file exceeded max_records: {} keys + {} revised",
                file.keys.len(),
                file.revised_keys.len()
            );
        }
        // 8 records at max_records=4 must split into exactly 2 files, not
        // 2 independently-chunked (and therefore overlapping) halves.
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn a_file_spanning_the_keys_revised_keys_boundary_keeps_ordering() {
        let keys: Vec<_> = (0..5).map(key).collect();
        let revised_keys: Vec<_> = (5..8).map(key).collect();

        let files = split_into_files(keys, revised_keys, 4);

        // keys[0..4] fill the first file entirely.
        assert_eq!(files[0].keys.len(), 4);
        assert_eq!(files[0].revised_keys.len(), 0);
        // the last key plus all three revised keys fill the second file.
        assert_eq!(files[1].keys.len(), 1);
        assert_eq!(files[1].revised_keys.len(), 3);
    }

    #[test]
    fn empty_input_still_produces_one_file() {
        let files = split_into_files(Vec::new(), Vec::new(), 4);
        assert_eq!(files.len(), 1);
        assert!(files[0].keys.is_empty());
        assert!(files[0].revised_keys.is_empty());
    }
}

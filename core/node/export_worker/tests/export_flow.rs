//! End-to-end batch materialization against a real database (spec §4.5,
//! §8 scenario 1: "happy publish+export"). Gated on `TEST_DATABASE_URL`;
//! skips silently when unset.

use std::io::Read as _;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use enserver_config::ExportWorkerConfig;
use enserver_db::{ExportDal, ExposureDal};
use enserver_export_proto::TemporaryExposureKeyExport;
use enserver_export_worker::artifact::HEADER_MAGIC;
use enserver_export_worker::{do_work, InMemorySigningKeyProvider, WorkerState};
use enserver_object_store::{InMemoryObjectStore, ObjectStore};
use enserver_test_support::{sample_exposure, test_db_pool};
use enserver_types::ReportType;
use p256::ecdsa::SigningKey;
use prost::Message;
use rand::rngs::OsRng;

const RESOURCE_ID: &str = "export-flow-test-key";

async fn seed_config(pool: &enserver_db::DbPool, signature_info_id: i64) -> i64 {
    seed_config_with(pool, signature_info_id, "exports", "test-export", None).await
}

async fn seed_config_with(
    pool: &enserver_db::DbPool,
    signature_info_id: i64,
    bucket_name: &str,
    filename_root: &str,
    max_records_override: Option<i64>,
) -> i64 {
    let (config_id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO export_config (
            period_seconds, from_timestamp, thru_timestamp, output_region,
            input_regions, bucket_name, filename_root, signature_info_ids,
            max_records_override, include_travelers, exclude_regions
        ) VALUES (3600, NOW() - interval '1 hour', NULL, 'TEST', '{US}', $1, $2, $3, $4, false, '{}')
        RETURNING id
        "#,
    )
    .bind(bucket_name)
    .bind(filename_root)
    .bind(vec![signature_info_id])
    .bind(max_records_override)
    .fetch_one(pool.raw())
    .await
    .unwrap();
    config_id
}

async fn seed_signature_info(pool: &enserver_db::DbPool) -> i64 {
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO signature_info (signing_key_resource_id, key_id, key_version, bundle_id, app_package_name)
        VALUES ($1, 'key-1', 'v1', 'com.example.app', 'com.example.app')
        RETURNING id
        "#,
    )
    .bind(RESOURCE_ID)
    .fetch_one(pool.raw())
    .await
    .unwrap();
    id
}

#[tokio::test]
async fn do_work_materializes_an_open_batch_into_a_signed_artifact() {
    let Some(pool) = test_db_pool().await else {
        return;
    };

    let signature_info_id = seed_signature_info(&pool).await;
    let config_id = seed_config(&pool, signature_info_id).await;

    let now = Utc::now();
    let start = now - chrono::Duration::minutes(30);
    let end = now + chrono::Duration::minutes(30);

    {
        let mut conn = pool.raw().acquire().await.unwrap();
        let mut exposure_dal = ExposureDal { conn: &mut conn };
        exposure_dal.insert_new(&sample_exposure(42, now)).await.unwrap();
    }

    let batch_id = {
        let mut tx = pool.begin().await.unwrap();
        let id = ExportDal { conn: &mut tx }
            .insert_batch(
                enserver_types::ExportConfigId(config_id),
                start,
                end,
                "TEST",
                &[signature_info_id],
                &["US".to_string()],
            )
            .await
            .unwrap();
        tx.commit().await.unwrap();
        id
    };

    let object_store: Arc<dyn enserver_object_store::ObjectStore> = Arc::new(InMemoryObjectStore::new());
    let signing_keys = Arc::new(
        InMemorySigningKeyProvider::new().with_key(RESOURCE_ID, SigningKey::random(&mut OsRng)),
    );

    let state = WorkerState {
        pool: pool.clone(),
        object_store: object_store.clone(),
        signing_keys,
        config: ExportWorkerConfig {
            min_records: 0,
            ..ExportWorkerConfig::default()
        },
    };

    let response = do_work(axum::extract::State(state)).await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);

    let mut conn = pool.raw().acquire().await.unwrap();
    let files = ExportDal { conn: &mut conn }.files_for_batch(batch_id).await.unwrap();
    assert!(!files.is_empty(), "worker should have produced at least one file");

    let index = object_store
        .get_object("exports", "test-export/index.txt")
        .await
        .unwrap();
    assert!(!index.is_empty());
}

#[tokio::test]
async fn do_work_is_a_no_op_when_no_batches_are_claimable() {
    let Some(pool) = test_db_pool().await else {
        return;
    };

    let object_store: Arc<dyn enserver_object_store::ObjectStore> = Arc::new(InMemoryObjectStore::new());
    let state = WorkerState {
        pool,
        object_store,
        signing_keys: Arc::new(InMemorySigningKeyProvider::new()),
        config: ExportWorkerConfig {
            worker_timeout: Duration::from_millis(50),
            ..ExportWorkerConfig::default()
        },
    };

    let response = do_work(axum::extract::State(state)).await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);
}

/// Spec §8 scenario 6 ("large export split"): a batch with both plain and
/// revised TEKs, capped at a `MaxRecords` small enough to force several
/// files, must never let a single file's combined `keys` + `revised_keys`
/// exceed that cap (the bug this regresses zipped the two lists'
/// independently-chunked halves together, letting a file hold up to 2x
/// `MaxRecords`).
#[tokio::test]
async fn do_work_splits_a_large_batch_without_exceeding_max_records_per_file() {
    let Some(pool) = test_db_pool().await else {
        return;
    };

    let signature_info_id = seed_signature_info(&pool).await;
    const MAX_RECORDS: i64 = 4;
    let config_id =
        seed_config_with(&pool, signature_info_id, "exports", "test-export-split", Some(MAX_RECORDS)).await;

    let now = Utc::now();
    let start = now - chrono::Duration::minutes(30);
    let end = now + chrono::Duration::minutes(30);

    {
        let mut conn = pool.raw().acquire().await.unwrap();
        let mut exposure_dal = ExposureDal { conn: &mut conn };
        // 6 plain TEKs and 3 revised TEKs: 9 combined records, which at
        // MAX_RECORDS=4 forces at least 3 files and, under the old
        // zip-by-index bug, would have let one file hold 4 keys + 4
        // revised keys at once.
        for byte in 200u8..206 {
            exposure_dal.insert_new(&sample_exposure(byte, now)).await.unwrap();
        }
        for byte in 206u8..209 {
            let exposure = sample_exposure(byte, now);
            exposure_dal.insert_new(&exposure).await.unwrap();
            exposure_dal
                .apply_revision(&exposure.key_bytes, ReportType::ConfirmedTest, Some(3), now)
                .await
                .unwrap();
        }
    }

    let batch_id = {
        let mut tx = pool.begin().await.unwrap();
        let id = ExportDal { conn: &mut tx }
            .insert_batch(
                enserver_types::ExportConfigId(config_id),
                start,
                end,
                "TEST",
                &[signature_info_id],
                &["US".to_string()],
            )
            .await
            .unwrap();
        tx.commit().await.unwrap();
        id
    };

    let object_store = Arc::new(InMemoryObjectStore::new());
    let signing_keys = Arc::new(
        InMemorySigningKeyProvider::new().with_key(RESOURCE_ID, SigningKey::random(&mut OsRng)),
    );

    let state = WorkerState {
        pool: pool.clone(),
        object_store: object_store.clone() as Arc<dyn ObjectStore>,
        signing_keys,
        config: ExportWorkerConfig {
            min_records: 0,
            max_records: MAX_RECORDS as usize,
            ..ExportWorkerConfig::default()
        },
    };

    let response = do_work(axum::extract::State(state)).await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);

    let mut conn = pool.raw().acquire().await.unwrap();
    let files = ExportDal { conn: &mut conn }.files_for_batch(batch_id).await.unwrap();
    assert!(files.len() >= 3, "9 combined records at MaxRecords=4 should span at least 3 files");

    let mut total_records = 0usize;
    for file in &files {
        let zip_bytes = object_store
            .get_object("exports", &format!("test-export-split/{}", file.filename))
            .await
            .unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_bytes)).unwrap();
        let mut export_bin = Vec::new();
        archive.by_name("export.bin").unwrap().read_to_end(&mut export_bin).unwrap();
        assert!(export_bin.starts_with(HEADER_MAGIC));
        let export = TemporaryExposureKeyExport::decode(&export_bin[HEADER_MAGIC.len()..]).unwrap();
        let record_count = export.keys.len() + export.revised_keys.len();
        assert!(
            record_count <= MAX_RECORDS as usize,
            "file {} held {} combined records, exceeding MaxRecords={MAX_RECORDS}",
            file.filename,
            record_count
        );
        total_records += record_count;
    }
    assert_eq!(total_records, 9, "no records should be dropped across the split");
}

//! Spec §8 scenario 5 ("cleanup index cascade"): expiring the last active
//! file of a batch must delete its blob, drop it from `index.txt`, and
//! mark the owning `ExportBatch` `DELETED`. Gated on `TEST_DATABASE_URL`;
//! skips silently when unset.

use std::sync::Arc;

use chrono::Utc;
use enserver_cleanup::{cleanup_export, CleanupState};
use enserver_config::CleanupConfig;
use enserver_db::ExportDal;
use enserver_export_worker::index;
use enserver_object_store::{InMemoryObjectStore, ObjectStore, ObjectStoreError};
use enserver_test_support::test_db_pool;

const BUCKET: &str = "cleanup-bucket";
const FILENAME_ROOT: &str = "cleanup-test";

async fn seed_signature_info(pool: &enserver_db::DbPool) -> i64 {
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO signature_info (signing_key_resource_id, key_id, key_version, bundle_id, app_package_name)
        VALUES ('cleanup-flow-test-key', 'key-1', 'v1', 'com.example.app', 'com.example.app')
        RETURNING id
        "#,
    )
    .fetch_one(pool.raw())
    .await
    .unwrap();
    id
}

async fn seed_config(pool: &enserver_db::DbPool, signature_info_id: i64) -> i64 {
    let (config_id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO export_config (
            period_seconds, from_timestamp, thru_timestamp, output_region,
            input_regions, bucket_name, filename_root, signature_info_ids,
            max_records_override, include_travelers, exclude_regions
        ) VALUES (3600, NOW() - interval '1 day', NULL, 'TEST', '{US}', $1, $2, $3, NULL, false, '{}')
        RETURNING id
        "#,
    )
    .bind(BUCKET)
    .bind(FILENAME_ROOT)
    .bind(vec![signature_info_id])
    .fetch_one(pool.raw())
    .await
    .unwrap();
    config_id
}

#[tokio::test]
async fn expiring_the_last_file_deletes_the_blob_index_entry_and_batch() {
    let Some(pool) = test_db_pool().await else {
        return;
    };

    let signature_info_id = seed_signature_info(&pool).await;
    let config_id = seed_config(&pool, signature_info_id).await;

    let now = Utc::now();
    let start = now - chrono::Duration::hours(2);
    let end = now - chrono::Duration::hours(1);

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

    let filename = format!("{}-{}-1.zip", start.timestamp(), end.timestamp());
    {
        let mut conn = pool.raw().acquire().await.unwrap();
        ExportDal { conn: &mut conn }
            .insert_file(batch_id, &filename, 1, 1, "TEST")
            .await
            .unwrap();
    }

    let object_store = Arc::new(InMemoryObjectStore::new());
    let object_name = format!("{FILENAME_ROOT}/{filename}");
    object_store.create_object(BUCKET, &object_name, b"zip bytes").await.unwrap();
    index::append(object_store.as_ref(), BUCKET, FILENAME_ROOT, &[filename.clone()]).await.unwrap();

    let state = CleanupState {
        pool: pool.clone(),
        object_store: object_store.clone() as Arc<dyn ObjectStore>,
        config: CleanupConfig {
            ttl: std::time::Duration::from_secs(0),
            timeout: std::time::Duration::from_secs(30),
            delete_batch_size: 100,
        },
    };

    let response = cleanup_export(axum::extract::State(state)).await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);

    assert!(
        matches!(
            object_store.get_object(BUCKET, &object_name).await,
            Err(ObjectStoreError::NotFound(_))
        ),
        "expired file's blob should have been deleted"
    );

    let index_bytes = object_store.get_object(BUCKET, &format!("{FILENAME_ROOT}/index.txt")).await.unwrap();
    let index_content = String::from_utf8(index_bytes).unwrap();
    assert!(
        !index_content.lines().any(|line| line == filename),
        "expired filename should have been dropped from index.txt"
    );

    let mut conn = pool.raw().acquire().await.unwrap();
    let files = ExportDal { conn: &mut conn }.files_for_batch(batch_id).await.unwrap();
    assert!(files.iter().all(|f| f.status == enserver_types::ExportFileStatus::Expired));

    let (status,): (String,) = sqlx::query_as("SELECT status::text FROM export_batch WHERE id = $1")
        .bind(batch_id.0)
        .fetch_one(pool.raw())
        .await
        .unwrap();
    assert_eq!(status, "DELETED", "batch should be marked DELETED once every file in it has expired");
}

//! Spec §8 scenario 4 ("key-rotation invalidation"): a token sealed under
//! a key must keep decoding through C13's disallow-then-delete lifecycle,
//! exactly until the row is hard-deleted. Gated on `TEST_DATABASE_URL`;
//! skips silently when unset.

use std::sync::Arc;
use std::time::Duration;

use enserver_config::KeyRotationConfig;
use enserver_db::RevisionKeyDal;
use enserver_key_rotation::{rotate_keys, InMemoryKeyMaterialSource, KeyRotationState};
use enserver_revision_token::{DbRevisionKeyProvider, RevisionKeyProvider};
use enserver_test_support::test_db_pool;
use secrecy::Secret;

#[tokio::test]
async fn rotation_keeps_a_demoted_key_decodable_until_it_is_deleted() {
    let Some(pool) = test_db_pool().await else {
        return;
    };

    let demoted_id = {
        let mut conn = pool.raw().acquire().await.unwrap();
        let mut dal = RevisionKeyDal { conn: &mut conn };
        dal.insert(&Secret::new(vec![11u8; 32])).await.unwrap()
    };

    let state = KeyRotationState {
        pool: pool.clone(),
        key_source: Arc::new(InMemoryKeyMaterialSource),
        config: KeyRotationConfig {
            new_key_period: Duration::from_secs(0),
            delete_old_key_period: Duration::from_secs(3600),
        },
    };

    // The key just inserted has the highest id, so `current()` is it;
    // `new_key_period: 0` forces a rotation that mints a replacement and
    // demotes (marks disallowed) the one we just seeded.
    let response = rotate_keys(axum::extract::State(state)).await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);

    {
        let mut conn = pool.raw().acquire().await.unwrap();
        let mut dal = RevisionKeyDal { conn: &mut conn };
        let row = dal.find(demoted_id).await.unwrap().expect("demoted key row must still exist");
        assert!(!row.meta().allowed, "demoted key should no longer be `allowed`");
    }

    // Still within `DeleteOldKeyPeriod`: a token sealed under the demoted
    // key must keep decoding (the "accept until deletion" invariant).
    let provider = DbRevisionKeyProvider::new(pool.clone());
    let key = provider.key_by_id(demoted_id).await.unwrap();
    assert!(key.is_some(), "a demoted-but-not-yet-deleted key must still open prior tokens");

    // Once the grace period has elapsed, a further rotation hard-deletes
    // it, and it must stop working.
    let state = KeyRotationState {
        pool: pool.clone(),
        key_source: Arc::new(InMemoryKeyMaterialSource),
        config: KeyRotationConfig {
            new_key_period: Duration::from_secs(0),
            delete_old_key_period: Duration::from_secs(0),
        },
    };
    let response = rotate_keys(axum::extract::State(state)).await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);

    {
        let mut conn = pool.raw().acquire().await.unwrap();
        let mut dal = RevisionKeyDal { conn: &mut conn };
        assert!(dal.find(demoted_id).await.unwrap().is_none(), "deleted key row must be gone");
    }

    let key = provider.key_by_id(demoted_id).await.unwrap();
    assert!(key.is_none(), "a deleted key must no longer open any token");
}

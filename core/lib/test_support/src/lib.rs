//! Shared test harness: a gated Postgres pool for integration suites that
//! need the real schema, plus small domain-object builders so tests don't
//! repeat the same struct literals.
//!
//! Gated the way the teacher's integration suites gate on a live
//! environment: tests that need Postgres call [`test_db_pool`] and
//! `#[ignore]` themselves when `TEST_DATABASE_URL` is unset, rather than
//! failing the whole suite in environments with no database.

use chrono::{DateTime, Utc};
use enserver_db::DbPool;
use enserver_object_store::InMemoryObjectStore;
use enserver_types::{AuthorizedApp, Exposure, HealthAuthorityId, ReportType};

/// Connects to the database named by `TEST_DATABASE_URL`. Returns `None`
/// when the variable is unset, so callers can skip instead of panicking
/// in environments without a test database provisioned.
pub async fn test_db_pool() -> Option<DbPool> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    DbPool::connect(&url, 5).await.ok()
}

pub fn in_memory_object_store() -> InMemoryObjectStore {
    InMemoryObjectStore::new()
}

/// A structurally valid TEK with sane defaults, for tests that only care
/// about a few fields.
pub fn sample_exposure(key_byte: u8, now: DateTime<Utc>) -> Exposure {
    Exposure {
        key_bytes: [key_byte; 16],
        transmission_risk: 1,
        app_package_name: "com.example.app".to_string(),
        rolling_start_interval_number: 2650847,
        rolling_period: 144,
        regions: ["US"].into_iter().map(str::to_string).collect(),
        traveler: false,
        created_at: now,
        local_provenance: true,
        federation_sync_id: None,
        health_authority_id: Some(HealthAuthorityId(1)),
        report_type: ReportType::ConfirmedTest,
        days_since_onset_of_symptoms: Some(2),
        revised: None,
        export_import_id: None,
    }
}

pub fn sample_authorized_app(app_package_name: &str) -> AuthorizedApp {
    AuthorizedApp {
        app_package_name: app_package_name.to_string(),
        allowed_regions: Default::default(),
        allowed_health_authority_ids: vec![HealthAuthorityId(1)],
        bypass_verification: false,
        bypass_revision_token: false,
    }
}

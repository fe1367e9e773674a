//! Retention cleanup (C12): bounded, advisory-locked deletion of expired
//! TEKs and export artifacts, per spec §4.6.

mod error;
mod handler;
mod metrics;

use axum::routing::get;
use axum::Router;

pub use error::CleanupError;
pub use handler::{cleanup_export, cleanup_exposure, CleanupExportResponse, CleanupExposureResponse, CleanupState};

/// Mounts both retention-sweep routes. Spec §7: `GET/POST` both accepted.
pub fn router(state: CleanupState) -> Router {
    Router::new()
        .route("/cleanup-exposure", get(cleanup_exposure).post(cleanup_exposure))
        .route("/cleanup-export", get(cleanup_export).post(cleanup_export))
        .with_state(state)
}

//! Export batch scheduler (C8): periodically extends each active
//! `ExportConfig`'s window into `OPEN` `ExportBatch` rows for the worker
//! (C9) to claim, per spec §4.4.

pub mod error;
pub mod handler;
pub mod metrics;
pub mod window;

use axum::routing::get;
use axum::Router;

pub use error::SchedulerError;
pub use handler::{create_batches, CreateBatchesResponse, SchedulerState};

/// Mounts the scheduler route onto a router. Spec §6: `GET/POST` both
/// accepted (these are triggered by a scheduler, not a browser form).
pub fn router(state: SchedulerState) -> Router {
    Router::new()
        .route("/export/create-batches", get(create_batches).post(create_batches))
        .with_state(state)
}

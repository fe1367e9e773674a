//! Export worker (C9): claims one `OPEN` `ExportBatch` at a time, builds
//! signed zip artifacts from the TEKs in its window, uploads them via C3,
//! and refreshes the per-config filename index, per spec §4.5.

pub mod artifact;
pub mod error;
pub mod handler;
pub mod index;
pub mod metrics;
pub mod padding;
pub mod signing;

use axum::routing::get;
use axum::Router;

pub use error::{BatchError, WorkerError};
pub use handler::{do_work, DoWorkResponse, WorkerState};
pub use signing::{InMemorySigningKeyProvider, SigningKeyProvider};

/// Mounts the export-worker route onto a router. Spec §6: `GET/POST` both
/// accepted.
pub fn router(state: WorkerState) -> Router {
    Router::new().route("/export/do-work", get(do_work).post(do_work)).with_state(state)
}

//! Publish handler (C7): the end-to-end ingest path wiring the authorized
//! app registry (C4), the verification verifier (C6), the key-transform
//! pipeline, a single DB transaction (C2), and the revision-token codec
//! (C5), per spec §4.3.

pub mod error;
pub mod handler;
pub mod metrics;
pub mod request;
pub mod revision;
pub mod transform;

use axum::routing::post;
use axum::Router;

pub use error::PublishError;
pub use handler::{publish, PublishState};
pub use request::{ExposureKeyPayload, PublishRequest, PublishResponse};

/// Mounts the publish route onto a router. Kept separate from `server`'s
/// top-level router assembly so each node crate owns its own route shape.
pub fn router(state: PublishState) -> Router {
    Router::new().route("/publish/v1/publish", post(publish)).with_state(state)
}

//! Revision-key rotation (C13): periodically mints a new allowed AEAD key
//! and retires old ones past their grace period, per spec §4.8.

mod error;
mod handler;
mod kms;
mod metrics;

use axum::routing::get;
use axum::Router;

pub use error::KeyRotationError;
pub use handler::{rotate_keys, KeyRotationState, RotateKeysResponse};
pub use kms::{InMemoryKeyMaterialSource, KeyMaterialSource};

/// Mounts the rotation route. Spec §6: `GET/POST` both accepted.
pub fn router(state: KeyRotationState) -> Router {
    Router::new().route("/key-rotation/rotate-keys", get(rotate_keys).post(rotate_keys)).with_state(state)
}

//! Federation (C10/C11): gRPC TEK exchange between partner exposure
//! notification servers. Unlike the rest of this workspace's node crates,
//! this one speaks gRPC rather than HTTP, so it exposes a `FederationService`
//! for `tonic`'s server builder plus a `pull_all` entry point for the
//! client side, instead of an axum `router()`.

mod error;
mod handler;
mod metrics;
mod partner;
mod proto;
mod pull;
mod push;

use axum::routing::get;
use axum::Router;

pub use error::FederationError;
pub use handler::{federation_in, FederationInResponse, FederationInState};
pub use partner::FederationPartner;
pub use proto::{federation_server::FederationServer, ExposureKey, FetchRequest, FetchResponse};
pub use pull::{pull_all, pull_once};
pub use push::FederationService;

/// Mounts the `/federation-in` pull trigger (spec §6). The gRPC `Fetch`
/// service (`FederationServer`/`FederationService`) is wired separately
/// onto a `tonic` server, not this axum router.
pub fn router(state: FederationInState) -> Router {
    Router::new().route("/federation-in", get(federation_in).post(federation_in)).with_state(state)
}

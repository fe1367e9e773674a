//! Assembles every node crate's axum router into the one HTTP surface a
//! deployment actually binds (spec §6). Each node crate owns its own
//! route shape and state; this crate only merges the already-stated
//! routers together, the way `RestApi::into_router` composes sub-routers
//! in the teacher's withdrawal-service coordinator.

use axum::routing::get;
use axum::Router;

mod health;

pub use health::{health, HealthState};

/// Every HTTP-facing dependency this server exposes, one state struct per
/// node crate. The gRPC `Federation.Fetch` service is not part of this
/// router — it's wired separately onto a `tonic` server.
pub struct ApiDependencies {
    pub publish: enserver_publish::PublishState,
    pub export_scheduler: enserver_export_scheduler::SchedulerState,
    pub export_worker: enserver_export_worker::WorkerState,
    pub cleanup: enserver_cleanup::CleanupState,
    pub key_rotation: enserver_key_rotation::KeyRotationState,
    pub federation_in: enserver_federation::FederationInState,
    pub health: HealthState,
}

/// Builds the combined router. Each sub-router already carries its own
/// state (via `.with_state`), so merging them needs no shared state type.
pub fn build_router(deps: ApiDependencies) -> Router {
    Router::new()
        .merge(enserver_publish::router(deps.publish))
        .merge(enserver_export_scheduler::router(deps.export_scheduler))
        .merge(enserver_export_worker::router(deps.export_worker))
        .merge(enserver_cleanup::router(deps.cleanup))
        .merge(enserver_key_rotation::router(deps.key_rotation))
        .merge(enserver_federation::router(deps.federation_in))
        .merge(Router::new().route("/health", get(health::health)).with_state(deps.health))
}

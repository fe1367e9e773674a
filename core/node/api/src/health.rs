use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use enserver_health_check::{AppHealthCheck, HealthStatus};

#[derive(Clone)]
pub struct HealthState(pub Arc<AppHealthCheck>);

/// `/health`: aggregates every registered component's readiness (spec §9
/// ambient concern; not a numbered module).
pub async fn health(State(state): State<HealthState>) -> Response {
    let (status, components) = state.0.check_all().await;
    let code = match status {
        HealthStatus::Ready => StatusCode::OK,
        HealthStatus::Affected => StatusCode::OK,
        HealthStatus::NotReady => StatusCode::SERVICE_UNAVAILABLE,
    };
    (code, Json(components)).into_response()
}

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use enserver_db::DbPool;
use serde::Serialize;

use crate::partner::FederationPartner;
use crate::pull::pull_all;

/// Dependencies for one `/federation-in` invocation (spec §6, §4.7).
#[derive(Clone)]
pub struct FederationInState {
    pub pool: DbPool,
    pub partners: Arc<Vec<FederationPartner>>,
    pub rpc_timeout: Duration,
}

#[derive(Debug, Serialize)]
pub struct FederationInResponse {
    imported: usize,
}

pub async fn federation_in(State(state): State<FederationInState>) -> Response {
    let imported = pull_all(&state.partners, &state.pool, state.rpc_timeout).await;
    (StatusCode::OK, Json(FederationInResponse { imported })).into_response()
}

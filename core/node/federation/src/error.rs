use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Failures from one partner pull cycle (C11). Logged and counted; the
/// persisted cursor from the last successful commit makes retry safe
/// (spec §4.7: "interruption is safe").
#[derive(Debug, thiserror::Error)]
pub enum FederationError {
    #[error("could not connect to partner: {0}")]
    Connect(#[from] tonic::transport::Error),
    #[error("partner RPC failed: {0}")]
    Rpc(#[from] tonic::Status),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for FederationError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "federation-in run failed");
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
}

impl IntoResponse for SchedulerError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "export scheduler run failed");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody { code: "internal" })).into_response()
    }
}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum CleanupError {
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for CleanupError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "cleanup run failed");
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}

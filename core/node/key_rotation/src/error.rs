use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum KeyRotationError {
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for KeyRotationError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "key rotation run failed");
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}

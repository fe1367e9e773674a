use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Publish failures (spec §4.3: "Failures: `BadJSON` (400),
/// `AppNotAuthorized` (401), `HealthAuthority*` (401), `RevisionTokenInvalid`
/// (400), `Internal` (500)"). Boundary translation into HTTP mirrors the
/// teacher's `WiringError`-to-response pattern: one place maps every
/// internal error variant to its wire status and code.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("request body is not valid JSON")]
    BadJson,
    #[error("app package is not authorized to publish")]
    AppNotAuthorized,
    #[error("verification certificate invalid")]
    HealthAuthorityVerificationFailed,
    #[error("revision token invalid")]
    RevisionTokenInvalid,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
}

impl PublishError {
    fn code(&self) -> &'static str {
        match self {
            PublishError::BadJson => "bad_json",
            PublishError::AppNotAuthorized => "app_not_authorized",
            PublishError::HealthAuthorityVerificationFailed => {
                enserver_verification::USER_FACING_CODE
            }
            PublishError::RevisionTokenInvalid => "revision_token_invalid",
            PublishError::Internal(_) => "internal",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            PublishError::BadJson => StatusCode::BAD_REQUEST,
            PublishError::AppNotAuthorized => StatusCode::UNAUTHORIZED,
            PublishError::HealthAuthorityVerificationFailed => StatusCode::UNAUTHORIZED,
            PublishError::RevisionTokenInvalid => StatusCode::BAD_REQUEST,
            PublishError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PublishError {
    fn into_response(self) -> Response {
        if matches!(self, PublishError::Internal(_)) {
            tracing::error!(error = %self, "publish request failed internally");
        }
        (self.status(), Json(ErrorBody { code: self.code() })).into_response()
    }
}

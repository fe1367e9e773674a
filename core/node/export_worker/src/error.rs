use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Top-level failures that abort the whole `/export/do-work` run. Per-batch
/// failures (`BlobWriteFailed`, `SignFailed`, `DBUpdateFailed` in spec
/// §4.5) are recoverable and handled inside the claim loop instead: they
/// leave the batch `PENDING` with its lease running and let the next run
/// retry, rather than failing the request.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
}

impl IntoResponse for WorkerError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "export worker run failed");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody { code: "internal" })).into_response()
    }
}

/// One claimed batch's processing failed (spec §4.5 "Failures"): logged
/// and counted, batch stays `PENDING` for the next run to retry.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("blob store write failed: {0}")]
    BlobWriteFailed(#[source] enserver_object_store::ObjectStoreError),
    #[error("signing failed: {0}")]
    SignFailed(String),
    #[error("database update failed: {0}")]
    DbUpdateFailed(#[source] enserver_db::DbError),
}

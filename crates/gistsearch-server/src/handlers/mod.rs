//! HTTP request handlers.

mod search;

pub use search::handle_search;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gistsearch_core::{ErrorResponse, GistError};

/// Liveness check.
pub async fn handle_ping() -> &'static str {
    "pong"
}

/// Fallback for unknown routes.
pub async fn handle_not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not Found")
}

/// `{"status": "error", "message": ...}` with the given status.
pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(message))).into_response()
}

/// Map a library error onto its HTTP status and client-facing body.
pub(crate) fn gist_error_response(err: &GistError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorResponse::from(err))).into_response()
}

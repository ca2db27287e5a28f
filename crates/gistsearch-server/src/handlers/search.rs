//! `POST /api/v1/search`: streamed regex search over a user's gists.

use super::{error_response, gist_error_response};
use crate::server::AppState;
use axum::{
    body::{Body, Bytes},
    extract::{rejection::BytesRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use gistsearch_core::{ErrorResponse, GistError, SearchResponse};
use serde_json::Value;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Validate the body, list the gist page, then stream one JSON line per match.
///
/// Errors before the first line get a proper status code; an error after
/// streaming has begun is written as a final `{"status": "error"}` line.
pub async fn handle_search(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            let status = rejection.status();
            debug!("Rejecting search body: {}", rejection.body_text());
            let message = if status == StatusCode::PAYLOAD_TOO_LARGE {
                "Request body too large"
            } else {
                "Invalid JSON data"
            };
            return error_response(status, message);
        }
    };

    let body: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            debug!("Rejecting search body: {}", e);
            return error_response(StatusCode::BAD_REQUEST, "Invalid JSON data");
        }
    };

    let lines = match state.api.search_json(&body).await {
        Ok(lines) => lines,
        Err(e) => {
            if e.http_status() >= 500 {
                error!("Search failed: {}", e);
            } else {
                debug!("Search rejected: {}", e);
            }
            return gist_error_response(&e);
        }
    };

    let chunks = lines.map(|line| Ok::<_, Infallible>(encode_line(line)));

    (
        [(header::CONTENT_TYPE, "application/json")],
        Body::from_stream(chunks),
    )
        .into_response()
}

/// Serialize one response line, newline-terminated.
fn encode_line(line: gistsearch_core::Result<SearchResponse>) -> Bytes {
    let encoded = match &line {
        Ok(response) => serde_json::to_vec(response),
        Err(e) => {
            warn!("Search stream ended with error: {}", e);
            serde_json::to_vec(&ErrorResponse::from(e))
        }
    };

    let mut bytes = encoded.unwrap_or_else(|e| {
        let err = GistError::from(e);
        error!("Failed to encode search line: {}", err);
        serde_json::to_vec(&ErrorResponse::new("Response encoding error")).unwrap_or_default()
    });
    bytes.push(b'\n');
    Bytes::from(bytes)
}

//! Shared response helpers for handlers.

use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde_json::{json, Value};
use tracing::error;
use uuid::Uuid;

use cinedb_core::{CineError, Movie, MovieId};

use crate::store::Page;

/// Error half of every handler's `Result`.
pub type ApiError = (StatusCode, Json<Value>);

/// Header carrying the caller identity established by the auth layer.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Build an error body: `fail` for 4xx, `error` for 5xx.
pub fn fail(status: StatusCode, message: impl Into<String>) -> ApiError {
    let label = if status.is_client_error() { "fail" } else { "error" };
    (
        status,
        Json(json!({ "status": label, "message": message.into() })),
    )
}

/// Map a domain error onto an HTTP status.
pub fn api_error(err: CineError) -> ApiError {
    match &err {
        CineError::NotFound(_) => fail(StatusCode::NOT_FOUND, err.to_string()),
        _ if err.is_client_error() => fail(StatusCode::BAD_REQUEST, err.to_string()),
        _ => {
            error!(error = %err, "request failed");
            fail(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

/// Parse a path id; malformed ids are reported as missing movies.
pub fn parse_movie_id(raw: &str) -> Result<MovieId, ApiError> {
    Uuid::parse_str(raw).map_err(|_| fail(StatusCode::NOT_FOUND, "Movie not found"))
}

/// Caller identity, or `anonymous` when no auth layer set one.
pub fn caller_id(headers: &HeaderMap) -> String {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("anonymous")
        .to_string()
}

/// Standard paginated movie listing body.
pub fn page_body(page: Page<Movie>) -> Value {
    json!({
        "status": "success",
        "results": page.items.len(),
        "total": page.total,
        "page": page.page,
        "totalPages": page.total_pages,
        "data": { "movies": page.items },
    })
}

//! Bulk movie creation through the ingestion queue, plus queue introspection.
//!
//! `POST /api/movies/bulk` validates every record up front and rejects the
//! whole request on any problem. Accepted records are stamped with the caller
//! and handed to the queue; the response returns before any of them are
//! stored.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde_json::{json, Value};
use tracing::info;

use cinedb_core::{Movie, NewMovie};

use super::common::{caller_id, fail, ApiError};
use crate::state::AppState;

/// Accept either a bare array or `{"movies": [...]}`.
fn records_from(body: Value) -> Option<Vec<Value>> {
    match body {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => match map.remove("movies") {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        },
        _ => None,
    }
}

/// POST /api/movies/bulk
pub async fn movies_bulk_create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let records = records_from(body)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| fail(StatusCode::BAD_REQUEST, "Please provide a non-empty array of movies"))?;

    let max = state.ingest.bulk_max_items;
    if records.len() > max {
        return Err(fail(
            StatusCode::BAD_REQUEST,
            format!("Cannot add more than {max} movies at once"),
        ));
    }

    let added_by = caller_id(&headers);
    let mut movies = Vec::with_capacity(records.len());
    let mut errors = Vec::new();

    for (index, record) in records.into_iter().enumerate() {
        let validated = serde_json::from_value::<NewMovie>(record)
            .map_err(|e| e.to_string())
            .and_then(|new| new.validate().map_err(|e| e.to_string()));
        match validated {
            Ok(fields) => movies.push(Movie::new(fields, added_by.as_str())),
            Err(message) => errors.push(json!({ "index": index, "message": message })),
        }
    }

    if !errors.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "status": "fail",
                "message": format!("{} of {} movies failed validation", errors.len(), errors.len() + movies.len()),
                "errors": errors,
            })),
        ));
    }

    let queued = state.movie_queue.enqueue(movies);
    let (pending_count, active) = state.movie_queue.activity();
    info!(queued, pending = pending_count, added_by = %added_by, "bulk movies queued");

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "status": "success",
            "message": format!("{queued} movies queued for processing"),
            "data": {
                "queued": queued,
                "pendingCount": pending_count,
                "active": active,
            },
        })),
    ))
}

/// GET /api/movies/queue/status
pub async fn movies_queue_status(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "success",
        "data": state.movie_queue.status(),
    }))
}

/// DELETE /api/movies/queue: drop pending records and reset counters.
pub async fn movies_queue_clear(State(state): State<Arc<AppState>>) -> Json<Value> {
    let discarded = state.movie_queue.clear();
    Json(json!({
        "status": "success",
        "message": "Queue cleared",
        "data": { "discarded": discarded },
    }))
}

//! Movie CRUD, search and sorted listing.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde_json::{json, Value};
use tracing::info;

use cinedb_core::{MoviePatch, NewMovie};

use super::common::{api_error, caller_id, fail, page_body, parse_movie_id, ApiError};
use crate::state::AppState;
use crate::store::{PageRequest, SortField, SortOrder};

fn page_from(params: &HashMap<String, String>) -> PageRequest {
    PageRequest::from_params(
        params.get("page").map(String::as_str),
        params.get("limit").map(String::as_str),
    )
}

/// GET /api/movies, newest first, paginated.
pub async fn movies_list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    Json(page_body(state.movies.list(page_from(&params))))
}

/// GET /api/movies/search?q=
pub async fn movies_search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let q = params.get("q").map(String::as_str).unwrap_or_default();
    if q.trim().is_empty() {
        return Err(fail(
            StatusCode::BAD_REQUEST,
            "Search query parameter \"q\" is required",
        ));
    }

    let page = state.movies.search(q, page_from(&params)).map_err(api_error)?;
    let mut body = page_body(page);
    body["query"] = json!(q);
    Ok(Json(body))
}

/// GET /api/movies/sorted?sortBy=&order=
pub async fn movies_sorted(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let field = SortField::from_param(params.get("sortBy").map(String::as_str));
    let order = SortOrder::from_param(params.get("order").map(String::as_str));

    let mut body = page_body(state.movies.sorted(field, order, page_from(&params)));
    body["sortBy"] = json!(field.as_str());
    body["order"] = json!(order.as_str());
    Json(body)
}

/// GET /api/movies/{id}
pub async fn movies_get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_movie_id(&id)?;
    let movie = state.movies.get(&id).map_err(api_error)?;
    Ok(Json(json!({ "status": "success", "data": { "movie": movie } })))
}

/// POST /api/movies
pub async fn movies_create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(new): Json<NewMovie>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let added_by = caller_id(&headers);
    let movie = state.movies.insert(&new, &added_by).map_err(api_error)?;
    info!(id = %movie.id, added_by = %added_by, "movie created");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "message": "Movie created successfully",
            "data": { "movie": movie },
        })),
    ))
}

/// PUT /api/movies/{id}
pub async fn movies_update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<MoviePatch>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_movie_id(&id)?;
    let movie = state.movies.update(&id, &patch).map_err(api_error)?;
    Ok(Json(json!({
        "status": "success",
        "message": "Movie updated successfully",
        "data": { "movie": movie },
    })))
}

/// DELETE /api/movies/{id}
pub async fn movies_delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_movie_id(&id)?;
    state.movies.delete(&id).map_err(api_error)?;
    info!(id = %id, "movie deleted");
    Ok(Json(json!({
        "status": "success",
        "message": "Movie deleted successfully",
        "data": null,
    })))
}

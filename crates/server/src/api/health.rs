use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "success",
        "message": "Server is running",
        "timestamp": Utc::now(),
        "uptime_secs": (Utc::now() - state.started_at).num_seconds(),
        "movies": state.movies.count(),
    }))
}

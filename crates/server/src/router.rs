//! HTTP router construction.
//!
//! Assembles all Axum routes and middleware into a single `Router`.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::api;
use crate::state::AppState;

const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

fn cors_layer(origin: &str) -> CorsLayer {
    if origin == "*" {
        return CorsLayer::permissive();
    }
    match origin.parse::<HeaderValue>() {
        Ok(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(e) => {
            warn!(origin, error = %e, "invalid CORS_ORIGIN, allowing any origin");
            CorsLayer::permissive()
        }
    }
}

/// Build the complete application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>, cors_origin: &str) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/api/movies", get(api::movies_list).post(api::movies_create))
        // Static segments below take precedence over /{id}
        .route("/api/movies/search", get(api::movies_search))
        .route("/api/movies/sorted", get(api::movies_sorted))
        .route("/api/movies/bulk", post(api::movies_bulk_create))
        .route("/api/movies/queue/status", get(api::movies_queue_status))
        .route("/api/movies/queue", delete(api::movies_queue_clear))
        .route(
            "/api/movies/{id}",
            get(api::movies_get)
                .put(api::movies_update)
                .delete(api::movies_delete),
        )
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(cors_layer(cors_origin))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use cinedb_core::config::IngestConfig;

    fn app_with(ingest: IngestConfig) -> (Router, Arc<AppState>) {
        let state = Arc::new(AppState::new(ingest));
        (build_router(state.clone(), "*"), state)
    }

    fn app() -> (Router, Arc<AppState>) {
        app_with(IngestConfig {
            batch_size: 2,
            batch_delay_ms: 0,
            bulk_max_items: 5,
        })
    }

    fn movie_json(title: &str) -> Value {
        json!({
            "title": title,
            "description": format!("{title} description"),
            "releaseDate": "2001-09-14",
            "duration": 101,
            "rating": 7.5,
        })
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-user-id", "admin-1");
        let body = match body {
            Some(v) => {
                builder = builder.header("content-type", "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app();
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
    }

    #[tokio::test]
    async fn test_movie_crud_flow() {
        let (app, _) = app();

        let (status, body) = send(&app, Method::POST, "/api/movies", Some(movie_json("Donnie Darko"))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["movie"]["addedBy"], "admin-1");
        let id = body["data"]["movie"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(&app, Method::GET, &format!("/api/movies/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["movie"]["title"], "Donnie Darko");

        let mut changed = movie_json("Donnie Darko");
        changed["rating"] = json!(8.0);
        let (status, body) = send(&app, Method::PUT, &format!("/api/movies/{id}"), Some(changed)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["movie"]["rating"], 8.0);

        let (status, _) = send(&app, Method::DELETE, &format!("/api/movies/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, Method::GET, &format!("/api/movies/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "fail");
    }

    #[tokio::test]
    async fn test_partial_update_keeps_omitted_fields() {
        let (app, _) = app();
        let mut movie = movie_json("Paprika");
        movie["poster"] = json!("https://img.example.com/p.jpg");
        movie["trailerId"] = json!("Q0xSnCmv3Qk");
        movie["streamingLinks"] = json!([{ "platform": "Max", "url": "https://max.com/paprika" }]);
        let (_, body) = send(&app, Method::POST, "/api/movies", Some(movie)).await;
        let id = body["data"]["movie"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/api/movies/{id}"),
            Some(json!({ "rating": 7.7 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let updated = &body["data"]["movie"];
        assert_eq!(updated["rating"], 7.7);
        assert_eq!(updated["title"], "Paprika");
        assert_eq!(updated["poster"], "https://img.example.com/p.jpg");
        assert_eq!(updated["trailerId"], "Q0xSnCmv3Qk");
        assert_eq!(updated["streamingLinks"][0]["platform"], "Max");

        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/api/movies/{id}"),
            Some(json!({ "duration": 0 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("Duration"));
    }

    #[tokio::test]
    async fn test_invalid_movie_rejected() {
        let (app, _) = app();
        let mut bad = movie_json("X");
        bad["duration"] = json!(0);
        let (status, body) = send(&app, Method::POST, "/api/movies", Some(bad)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("Duration"));
    }

    #[tokio::test]
    async fn test_malformed_id_is_not_found() {
        let (app, _) = app();
        let (status, _) = send(&app, Method::GET, "/api/movies/12345", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bulk_create_drains_into_store() {
        let (app, state) = app();
        let records: Vec<Value> = (0..5).map(|i| movie_json(&format!("Bulk {i}"))).collect();

        let (status, body) = send(&app, Method::POST, "/api/movies/bulk", Some(json!(records))).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["data"]["queued"], 5);
        assert_eq!(body["data"]["active"], true);

        state.movie_queue.wait_idle().await;
        assert_eq!(state.movies.count(), 5);

        let (status, body) = send(&app, Method::GET, "/api/movies/queue/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["pendingCount"], 0);
        assert_eq!(body["data"]["active"], false);
        assert_eq!(body["data"]["stats"]["total"], 5);
        assert_eq!(body["data"]["stats"]["processed"], 5);

        let (_, body) = send(&app, Method::GET, "/api/movies?limit=2", None).await;
        assert_eq!(body["results"], 2);
        assert_eq!(body["total"], 5);
        assert_eq!(body["totalPages"], 3);
    }

    #[tokio::test]
    async fn test_bulk_accepts_wrapped_object() {
        let (app, state) = app();
        let body = json!({ "movies": [movie_json("Wrapped")] });
        let (status, _) = send(&app, Method::POST, "/api/movies/bulk", Some(body)).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        state.movie_queue.wait_idle().await;
        assert_eq!(state.movies.count(), 1);
    }

    #[tokio::test]
    async fn test_bulk_limits_and_validation() {
        let (app, state) = app();

        let (status, _) = send(&app, Method::POST, "/api/movies/bulk", Some(json!([]))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let too_many: Vec<Value> = (0..6).map(|i| movie_json(&format!("M{i}"))).collect();
        let (status, body) = send(&app, Method::POST, "/api/movies/bulk", Some(json!(too_many))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("more than 5"));

        let mut bad = movie_json("Bad");
        bad["rating"] = json!(42);
        let mixed = json!([movie_json("Fine"), bad]);
        let (status, body) = send(&app, Method::POST, "/api/movies/bulk", Some(mixed)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["index"], 1);

        // Nothing was enqueued by the rejected requests.
        assert_eq!(state.movie_queue.status().stats.total, 0);
    }

    #[tokio::test]
    async fn test_queue_clear_endpoint() {
        let (app, state) = app();
        let records: Vec<Value> = (0..3).map(|i| movie_json(&format!("C{i}"))).collect();
        send(&app, Method::POST, "/api/movies/bulk", Some(json!(records))).await;
        state.movie_queue.wait_idle().await;

        let (status, body) = send(&app, Method::DELETE, "/api/movies/queue", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["discarded"], 0);

        let status = state.movie_queue.status();
        assert_eq!(status.stats.total, 0);
        assert_eq!(status.generation, 1);
        // Clearing the queue never touches stored movies.
        assert_eq!(state.movies.count(), 3);
    }

    #[tokio::test]
    async fn test_search_and_sorted() {
        let (app, _) = app();
        for (title, rating) in [("Solaris", 8.1), ("Stalker", 8.2), ("Mirror", 8.0)] {
            let mut m = movie_json(title);
            m["rating"] = json!(rating);
            send(&app, Method::POST, "/api/movies", Some(m)).await;
        }

        let (status, body) = send(&app, Method::GET, "/api/movies/search?q=stalker", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
        assert_eq!(body["query"], "stalker");

        let (_, body) = send(&app, Method::GET, "/api/movies/search?q=%20solaris%20", None).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["query"], " solaris ");

        let (status, _) = send(&app, Method::GET, "/api/movies/search?q=", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = send(&app, Method::GET, "/api/movies/sorted?sortBy=rating&order=asc", None).await;
        assert_eq!(body["sortBy"], "rating");
        assert_eq!(body["order"], "asc");
        assert_eq!(body["data"]["movies"][0]["title"], "Mirror");

        let (_, body) = send(&app, Method::GET, "/api/movies/sorted?sortBy=bogus", None).await;
        assert_eq!(body["sortBy"], "createdAt");
        assert_eq!(body["order"], "desc");
    }
}

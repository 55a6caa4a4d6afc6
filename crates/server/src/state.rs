use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use cinedb_core::config::IngestConfig;
use cinedb_core::Movie;
use cinedb_queue::{IngestionQueue, QueueConfig};

use crate::store::{MovieSink, MovieStore};

pub struct AppState {
    pub movies: Arc<MovieStore>,
    /// Bulk-create backlog feeding `movies`.
    pub movie_queue: IngestionQueue<Movie>,
    pub ingest: IngestConfig,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Wire the movie store, its sink and the ingestion queue together.
    pub fn new(ingest: IngestConfig) -> Self {
        let movies = Arc::new(MovieStore::new());
        let sink = Arc::new(MovieSink::new(movies.clone()));
        let movie_queue = IngestionQueue::new(
            sink,
            QueueConfig {
                batch_size: ingest.batch_size,
                inter_batch_delay: ingest.batch_delay(),
            },
        );
        info!(
            batch_size = ingest.batch_size,
            batch_delay_ms = ingest.batch_delay_ms,
            "movie ingestion queue ready"
        );

        Self {
            movies,
            movie_queue,
            ingest,
            started_at: Utc::now(),
        }
    }
}

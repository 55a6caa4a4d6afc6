//! Cumulative counters and status snapshots.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A batch whose sink call failed, kept for inspection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFailure<T> {
    pub batch: Vec<T>,
    pub message: String,
    pub failed_at: DateTime<Utc>,
}

/// Counters since construction or the last `clear`.
///
/// `errors` grows by one entry per failed batch and is only trimmed by
/// `clear`.
#[derive(Debug, Clone, Serialize)]
pub struct QueueStats<T> {
    pub total: u64,
    pub processed: u64,
    pub failed: u64,
    pub errors: Vec<BatchFailure<T>>,
}

impl<T> Default for QueueStats<T> {
    fn default() -> Self {
        Self {
            total: 0,
            processed: 0,
            failed: 0,
            errors: Vec::new(),
        }
    }
}

/// Point-in-time view returned by `IngestionQueue::status`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatus<T> {
    pub pending_count: usize,
    pub active: bool,
    /// Incremented by every `clear`.
    pub generation: u64,
    pub stats: QueueStats<T>,
}

//! In-process batch ingestion queue.
//!
//! Producers hand bursts of records to an [`IngestionQueue`]; a single worker
//! task drains them in fixed-size batches into a [`BatchSink`], pausing
//! between batches and recording per-batch success or failure.

pub mod backlog;
pub mod error;
pub mod queue;
pub mod sink;
pub mod stats;

pub use backlog::Backlog;
pub use error::QueueError;
pub use queue::{IngestionQueue, QueueConfig};
pub use sink::{sink_fn, BatchSink, SinkFn};
pub use stats::{BatchFailure, QueueStats, QueueStatus};

//! Queue error types.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("sink error: {0}")]
    Sink(String),

    #[error("sink panicked: {0}")]
    SinkPanicked(String),
}

impl QueueError {
    /// Wrap any displayable error as a sink failure.
    pub fn sink(err: impl fmt::Display) -> Self {
        QueueError::Sink(err.to_string())
    }
}

//! Downstream sink trait and a closure adapter.

use std::future::Future;

use async_trait::async_trait;

use crate::error::QueueError;

/// Destination for drained batches.
///
/// The queue calls `write_batch` with one batch at a time and never
/// concurrently with itself. An `Ok` counts every record in the batch as
/// processed; an `Err` counts every record as failed. Implementations may
/// store part of a batch and still return an error.
#[async_trait]
pub trait BatchSink<T>: Send + Sync {
    /// Persist a batch. The slice must not be retained after returning.
    async fn write_batch(&self, batch: &[T]) -> Result<(), QueueError>;

    /// Short label used in log lines.
    fn name(&self) -> &str {
        "sink"
    }
}

/// A [`BatchSink`] backed by an async closure. Build one with [`sink_fn`].
pub struct SinkFn<F> {
    f: F,
}

/// Wrap an async closure taking an owned batch as a [`BatchSink`].
pub fn sink_fn<F>(f: F) -> SinkFn<F> {
    SinkFn { f }
}

#[async_trait]
impl<T, F, Fut> BatchSink<T> for SinkFn<F>
where
    T: Clone + Send + Sync + 'static,
    F: Fn(Vec<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), QueueError>> + Send + 'static,
{
    async fn write_batch(&self, batch: &[T]) -> Result<(), QueueError> {
        (self.f)(batch.to_vec()).await
    }

    fn name(&self) -> &str {
        "fn"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_sink_fn_receives_batch() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let captured = seen.clone();
        let sink = sink_fn(move |batch: Vec<u32>| {
            let captured = captured.clone();
            async move {
                captured.lock().unwrap().extend(batch);
                Ok::<(), QueueError>(())
            }
        });

        sink.write_batch(&[1, 2, 3]).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
        assert_eq!(BatchSink::<u32>::name(&sink), "fn");
    }

    #[tokio::test]
    async fn test_sink_fn_propagates_error() {
        let sink = sink_fn(|_batch: Vec<u32>| async { Err::<(), _>(QueueError::sink("disk full")) });
        let err = sink.write_batch(&[1]).await.unwrap_err();
        assert_eq!(err.to_string(), "sink error: disk full");
    }
}

//! The ingestion queue and its batch worker loop.
//!
//! All mutable state (backlog, `active` flag, counters, generation) sits
//! behind one mutex, so `enqueue` checks and sets `active` in the same
//! critical section that appends to the backlog. At most one worker task runs
//! per queue: `enqueue` only spawns when it flips `active` from false to
//! true, and the worker only clears `active` after observing an empty backlog
//! under the same lock.
//!
//! The lock is never held across an `.await`. The worker suspends only while
//! awaiting the sink and during the inter-batch delay.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use futures::FutureExt;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::backlog::Backlog;
use crate::error::QueueError;
use crate::sink::BatchSink;
use crate::stats::{BatchFailure, QueueStats, QueueStatus};

/// Construction-time tuning. Not reconfigurable afterwards.
#[derive(Debug, Clone, Copy)]
pub struct QueueConfig {
    /// Maximum records per sink call. Zero is treated as one.
    pub batch_size: usize,
    /// Pause between batches while a backlog remains.
    pub inter_batch_delay: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            inter_batch_delay: Duration::from_millis(100),
        }
    }
}

struct State<T> {
    backlog: Backlog<T>,
    active: bool,
    stats: QueueStats<T>,
    generation: u64,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    sink: Arc<dyn BatchSink<T>>,
    config: QueueConfig,
    /// Mirrors `State::active` for `wait_idle`; only written under `state`.
    active_tx: watch::Sender<bool>,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        // A panic while holding the lock leaves the counters consistent
        // (each update is a single field write), so keep going.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to an in-memory batch ingestion queue.
///
/// Cloning is cheap and every clone refers to the same queue. Records are
/// delivered to the sink in submission order, in batches of at most
/// `batch_size`, each batch attempted exactly once.
pub struct IngestionQueue<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for IngestionQueue<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T> IngestionQueue<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(sink: Arc<dyn BatchSink<T>>, config: QueueConfig) -> Self {
        let (active_tx, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    backlog: Backlog::new(),
                    active: false,
                    stats: QueueStats::default(),
                    generation: 0,
                }),
                sink,
                config,
                active_tx,
            }),
        }
    }

    /// Append records to the backlog and start the worker if it is idle.
    ///
    /// Never waits on processing. The worker is spawned onto the current
    /// tokio runtime; outside a runtime the records stay pending and the next
    /// enqueue made inside one starts the worker. Returns how many records
    /// were accepted.
    pub fn enqueue<I>(&self, records: I) -> usize
    where
        I: IntoIterator<Item = T>,
    {
        let runtime = Handle::try_current().ok();
        let (added, worker_runtime) = {
            let mut state = self.shared.lock();
            let added = state.backlog.push(records);
            state.stats.total += added as u64;
            let mut start = None;
            if !state.active && !state.backlog.is_empty() {
                match runtime {
                    Some(handle) => {
                        state.active = true;
                        self.shared.active_tx.send_replace(true);
                        start = Some(handle);
                    }
                    None => warn!(
                        pending = state.backlog.len(),
                        "no tokio runtime, ingestion worker not started"
                    ),
                }
            }
            (added, start)
        };

        if let Some(handle) = worker_runtime {
            handle.spawn(run_worker(self.shared.clone()));
        }
        added
    }

    /// Enqueue a single record.
    pub fn enqueue_one(&self, record: T) -> usize {
        self.enqueue(std::iter::once(record))
    }

    /// Backlog size and worker activity, without copying the counters.
    pub fn activity(&self) -> (usize, bool) {
        let state = self.shared.lock();
        (state.backlog.len(), state.active)
    }

    /// Snapshot of backlog size, worker activity and a copy of the counters.
    pub fn status(&self) -> QueueStatus<T> {
        let state = self.shared.lock();
        QueueStatus {
            pending_count: state.backlog.len(),
            active: state.active,
            generation: state.generation,
            stats: state.stats.clone(),
        }
    }

    /// Drop every pending record and reset the counters.
    ///
    /// A batch already handed to the sink still completes, but its outcome
    /// belongs to the previous generation and is not counted. Returns how
    /// many pending records were discarded.
    pub fn clear(&self) -> usize {
        let (discarded, generation) = {
            let mut state = self.shared.lock();
            let discarded = state.backlog.clear();
            state.stats = QueueStats::default();
            state.generation += 1;
            (discarded, state.generation)
        };
        info!(discarded, generation, "ingestion queue cleared");
        discarded
    }

    /// Resolve once no worker is running.
    ///
    /// Returns immediately on an idle queue. Records enqueued while waiting
    /// keep the worker busy, so this may wait for them too.
    pub async fn wait_idle(&self) {
        let mut rx = self.shared.active_tx.subscribe();
        // The sender lives in `shared`, which we hold, so this cannot fail.
        let _ = rx.wait_for(|active| !*active).await;
    }
}

/// Drain the backlog batch by batch until it is empty, then go idle.
async fn run_worker<T>(shared: Arc<Shared<T>>)
where
    T: Clone + Send + Sync + 'static,
{
    let sink_name = shared.sink.name().to_string();
    debug!(sink = %sink_name, "ingestion worker started");

    loop {
        let (batch, generation) = {
            let mut state = shared.lock();
            if state.backlog.is_empty() {
                state.active = false;
                shared.active_tx.send_replace(false);
                break;
            }
            let batch = state.backlog.take_batch(shared.config.batch_size);
            (batch, state.generation)
        };

        let batch_size = batch.len();
        debug!(sink = %sink_name, batch_size, "handing batch to sink");

        let result = match AssertUnwindSafe(shared.sink.write_batch(&batch))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(panic) => Err(QueueError::SinkPanicked(panic_message(panic.as_ref()))),
        };

        if let Err(e) = &result {
            error!(sink = %sink_name, batch_size, error = %e, "batch failed");
        }

        let more = {
            let mut state = shared.lock();
            if state.generation != generation {
                debug!(
                    sink = %sink_name,
                    batch_size,
                    "queue cleared while batch was in flight, outcome discarded"
                );
            } else {
                match result {
                    Ok(()) => state.stats.processed += batch_size as u64,
                    Err(e) => {
                        state.stats.failed += batch_size as u64;
                        state.stats.errors.push(BatchFailure {
                            batch,
                            message: e.to_string(),
                            failed_at: Utc::now(),
                        });
                    }
                }
            }
            !state.backlog.is_empty()
        };

        if more && !shared.config.inter_batch_delay.is_zero() {
            tokio::time::sleep(shared.config.inter_batch_delay).await;
        }
    }

    debug!(sink = %sink_name, "ingestion worker idle");
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

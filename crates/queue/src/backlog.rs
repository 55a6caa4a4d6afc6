//! FIFO backlog of records awaiting the sink.
//!
//! Records are appended in submission order and drained from the front in
//! batches of at most `max` items, so concatenating every drained batch
//! yields exactly the submitted sequence.

use std::collections::VecDeque;

/// Ordered buffer of pending records.
#[derive(Debug)]
pub struct Backlog<T> {
    items: VecDeque<T>,
}

impl<T> Default for Backlog<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Backlog<T> {
    pub fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    /// Append records to the back, preserving their order.
    ///
    /// Returns how many records were added.
    pub fn push<I>(&mut self, records: I) -> usize
    where
        I: IntoIterator<Item = T>,
    {
        let before = self.items.len();
        self.items.extend(records);
        self.items.len() - before
    }

    /// Remove up to `max` records from the front.
    ///
    /// A `max` of zero is treated as one so a non-empty backlog always makes
    /// progress.
    pub fn take_batch(&mut self, max: usize) -> Vec<T> {
        let n = max.max(1).min(self.items.len());
        self.items.drain(..n).collect()
    }

    /// Drop every pending record, returning how many were discarded.
    pub fn clear(&mut self) -> usize {
        let n = self.items.len();
        self.items.clear();
        n
    }

    /// Number of records currently pending.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

use std::sync::Arc;
use std::sync::atomic::Ordering::Relaxed;

use super::queue::Shared;
use crate::Core::alloc::{BlockSource, HeapBlocks};

/// Receiving half of an unbounded queue.
///
/// There is exactly one per queue: the handle is not `Clone` and dequeues
/// through `&mut self`.
pub struct Consumer<T, S: BlockSource = HeapBlocks> {
    shared: Arc<Shared<T, S>>,
}

impl<T, S: BlockSource> Consumer<T, S> {
    pub(crate) fn new(shared: Arc<Shared<T, S>>) -> Self {
        Self { shared }
    }

    /// Take the next ready item.
    ///
    /// # Returns
    /// * `Some(item)` if an item was ready
    /// * `None` if the queue is empty, or every pending slot is still being
    ///   written by its producer
    pub fn dequeue(&mut self) -> Option<Box<T>> {
        // Safety: `&mut self` on the only consumer handle.
        unsafe { self.shared.dequeue() }
    }

    /// Chunks currently allocated by the queue, including spares in flight.
    pub fn live_chunks(&self) -> usize {
        self.shared.live_chunks.load(Relaxed)
    }

    pub fn slots_per_chunk(&self) -> usize {
        self.shared.slots_per_chunk
    }

    /// Total number of slots ever reserved by producers.
    pub fn enqueued(&self) -> u64 {
        self.shared.tail_counter.load(Relaxed)
    }

    /// Slots the consumer passed while their producer was still writing,
    /// waiting to be retried.
    pub fn pending_slots(&self) -> usize {
        // Safety: the run state is only touched through this handle, and
        // `&self` rules out a dequeue in progress.
        let run = unsafe { &*self.shared.run.get() };
        run.skipped.len() + run.retry.len()
    }

    pub fn block_source(&self) -> &S {
        &self.shared.source
    }
}

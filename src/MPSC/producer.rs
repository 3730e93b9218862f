use std::mem::ManuallyDrop;
use std::sync::Arc;

use super::queue::Shared;
use crate::Core::alloc::{BlockSource, HeapBlocks};
use crate::Core::fatal::fatal;

/// Sending half of an unbounded queue.
///
/// Cheap to clone; give one to every thread that produces items.
/// Enqueueing never blocks and never fails.
pub struct Producer<T, S: BlockSource = HeapBlocks> {
    pub(crate) shared: Arc<Shared<T, S>>,
}

impl<T, S: BlockSource> Producer<T, S> {
    pub(crate) fn new(shared: Arc<Shared<T, S>>) -> Self {
        Self { shared }
    }

    /// Append `item` to the queue.
    #[inline]
    pub fn enqueue(&self, item: Box<T>) {
        self.shared.enqueue(item);
    }

    /// Convenience for `enqueue(Box::new(value))`.
    pub fn send(&self, value: T) {
        self.enqueue(Box::new(value));
    }

    /// Take a place in the queue now and supply the item later.
    ///
    /// Until the reservation is published the consumer steps over its slot
    /// and keeps delivering later items, so anything enqueued in the meantime
    /// may come out first. Once published, the item comes out ahead of every
    /// item enqueued after it.
    pub fn reserve(&self) -> Reservation<'_, T, S> {
        Reservation {
            producer: self,
            slot: self.shared.reserve(),
        }
    }
}

impl<T, S: BlockSource> Clone for Producer<T, S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// A slot taken with [`Producer::reserve`] that has not been written yet.
///
/// Dropping it unpublished aborts the process: the slot could never be
/// filled, and the queue could never reclaim memory past it.
#[must_use = "a reserved slot must be published"]
pub struct Reservation<'a, T, S: BlockSource = HeapBlocks> {
    producer: &'a Producer<T, S>,
    slot: u64,
}

impl<T, S: BlockSource> Reservation<'_, T, S> {
    /// Position of the reserved slot in the queue.
    pub fn slot(&self) -> u64 {
        self.slot
    }

    /// Fill the reserved slot with `item`.
    pub fn publish(self, item: Box<T>) {
        let this = ManuallyDrop::new(self);
        this.producer.shared.publish(this.slot, item);
    }
}

impl<T, S: BlockSource> Drop for Reservation<'_, T, S> {
    fn drop(&mut self) {
        fatal(format_args!("reserved slot {} dropped without being published", self.slot));
    }
}

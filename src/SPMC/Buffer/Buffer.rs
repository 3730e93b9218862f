// This is the bounded SPMC circular buffer used to recycle allocations

use std::marker::PhantomData;
use std::sync::atomic::{AtomicPtr, AtomicU64, AtomicUsize};

use crossbeam_utils::CachePadded;

/// A single slot of the circular buffer.
pub struct RecycleSlot<T> {
    /// Owned item, or null when the slot is free.
    pub(crate) item: AtomicPtr<T>,

    /// Sequence number stamped by the producer when it filled the slot.
    /// Consumers look for the slot carrying their ticket.
    pub(crate) seq: AtomicU64,
}

/// A bounded, wait-free on common hardware, single-producer multi-consumer
/// buffer of owned items.
///
/// ### Concurrency Design:
/// - **Producer (Enqueue)**: scans forward from its private cursor for a free
///   slot, installs the item with a CAS, stamps the slot with the next
///   sequence number and then publishes `enqueue_counter`.
/// - **Consumers (Dequeue)**: take a ticket from `dequeue_barrier`, bounded by
///   `enqueue_counter` and rolled back on overrun. The ticket entitles them to
///   one sequence number from `head_seq`; they scan from `head` for the slot
///   carrying it, take the item and bump `dequeue_counter`.
///
/// Items are delivered exactly once, not necessarily in FIFO order.
pub struct RecycleBuffer<T> {
    pub(crate) slots: Box<[RecycleSlot<T>]>,

    /// Hint where consumers start scanning.
    pub(crate) head: CachePadded<AtomicUsize>,
    pub(crate) head_seq: CachePadded<AtomicU64>,
    pub(crate) dequeue_barrier: CachePadded<AtomicU64>,
    pub(crate) dequeue_counter: CachePadded<AtomicU64>,

    /// Written by the producer only.
    pub(crate) enqueue_counter: CachePadded<AtomicU64>,

    pub(crate) _owns: PhantomData<Box<T>>,
}

unsafe impl<T: Send> Send for RecycleBuffer<T> {}
unsafe impl<T: Send> Sync for RecycleBuffer<T> {}

/// The producer's private scan position. Lives in the producer handle so the
/// shared buffer holds nothing only one thread may touch.
#[derive(Debug, Default)]
pub(crate) struct TailCursor {
    pub(crate) tail: usize,
    pub(crate) tail_seq: u64,
}

// Shared state of the unbounded MPSC queue and the producer side of it.

use std::cell::UnsafeCell;
use std::marker::PhantomData;
use std::ptr;
use std::sync::atomic::{AtomicPtr, AtomicU64, AtomicUsize};
use std::sync::atomic::Ordering::{Acquire, Relaxed, SeqCst};

use crossbeam_utils::CachePadded;
use tracing::{debug, trace};

use super::run::RunState;
use super::skipped::SkipFifo;
use super::Chunk::layout::slots_for_block;
use super::Chunk::{ChunkHeader, ChunkRef};
use crate::Core::alloc::BlockSource;
use crate::Core::error::ConfigError;
use crate::Core::fatal::fatal;

/// The queue proper: a virtual infinite array of slots, materialized as a
/// doubly linked chain of fixed-size chunks.
///
/// ### Concurrency Design:
/// - **Producers** reserve a slot id with one `fetch_add` on `tail_counter`,
///   find (or create) the chunk holding that id starting from the `tail`
///   hint, and publish their item into the slot.
/// - **The consumer** walks the slots in id order. Slots that are reserved
///   but not yet written are skipped and retried later, so a preempted
///   producer never stalls the consumer.
/// - **Reclamation** is done by the consumer, one chunk per dequeue at most,
///   using the release counters stamped into each chunk.
pub(crate) struct Shared<T, S: BlockSource> {
    /// Total number of slots ever reserved.
    pub(crate) tail_counter: CachePadded<AtomicU64>,

    /// Hint to the newest chunk. Only moves forward.
    pub(crate) tail: CachePadded<AtomicPtr<ChunkHeader<T>>>,

    pub(crate) source: S,
    pub(crate) slots_per_chunk: usize,
    pub(crate) live_chunks: AtomicUsize,

    /// Touched only through the single `Consumer` handle and in `Drop`.
    pub(crate) run: UnsafeCell<RunState<T>>,

    pub(crate) _owns: PhantomData<Box<T>>,
}

// Items move between threads but are never shared, so `T: Send` is enough.
unsafe impl<T: Send, S: BlockSource> Send for Shared<T, S> {}
unsafe impl<T: Send, S: BlockSource> Sync for Shared<T, S> {}

impl<T, S: BlockSource> Shared<T, S> {
    pub(crate) fn new(source: S) -> Result<Self, ConfigError> {
        let slots_per_chunk = slots_for_block::<T>(source.block_size())?;
        // Skipped slots live in blocks from the same source as the chunks.
        let skipped = SkipFifo::new(source.block_size())?;
        let retry = SkipFifo::new(source.block_size())?;
        let live_chunks = AtomicUsize::new(0);

        let first = ChunkRef::init(source.acquire(), ptr::null_mut(), 0, slots_per_chunk);
        live_chunks.fetch_add(1, Relaxed);

        debug!(
            block_size = source.block_size(),
            slots_per_chunk, "unbounded queue created"
        );

        Ok(Self {
            tail_counter: CachePadded::new(AtomicU64::new(0)),
            tail: CachePadded::new(AtomicPtr::new(first.as_ptr())),
            source,
            slots_per_chunk,
            live_chunks,
            run: UnsafeCell::new(RunState::new(first, skipped, retry)),
            _owns: PhantomData,
        })
    }

    fn allocate_chunk(&self, prev: ChunkRef<T>, start_slot: u64) -> ChunkRef<T> {
        let chunk = ChunkRef::init(self.source.acquire(), prev.as_ptr(), start_slot, self.slots_per_chunk);
        self.live_chunks.fetch_add(1, Relaxed);
        trace!(start_slot, "chunk allocated");
        chunk
    }

    /// Give a chunk's memory back to the block source.
    ///
    /// # Safety
    /// No thread may reference `chunk` any more.
    pub(crate) unsafe fn free_chunk(&self, chunk: ChunkRef<T>) {
        let start_slot = chunk.start_slot();
        self.source.release(chunk.into_block(self.source.block_size()));
        self.live_chunks.fetch_sub(1, Relaxed);
        trace!(start_slot, "chunk released");
    }

    /// Reserve a slot and publish `item` into it. Never blocks.
    pub(crate) fn enqueue(&self, item: Box<T>) {
        let slot = self.reserve();
        self.publish(slot, item);
    }

    /// Claim the next slot id. The slot stays unwritten until `publish`.
    pub(crate) fn reserve(&self) -> u64 {
        // SeqCst: slot counter, tail hint and release counters share one total order.
        self.tail_counter.fetch_add(1, SeqCst)
    }

    /// Write `item` into `slot`, which must come from `reserve` and must not
    /// have been published before.
    pub(crate) fn publish(&self, slot: u64, item: Box<T>) {
        let item = Box::into_raw(item);
        let mut current = match ChunkRef::from_ptr(self.tail.load(SeqCst)) {
            Some(chunk) => chunk,
            None => fatal(format_args!("unbounded queue lost its tail chunk")),
        };

        if current.start_slot() > slot {
            // The tail hint already moved past our slot: walk back.
            while current.start_slot() > slot {
                current = match current.prev() {
                    Some(prev) => prev,
                    None => fatal(format_args!("slot {slot} lies before the first live chunk")),
                };
            }
        } else if current.end_slot() <= slot {
            current = self.extend_to(current, slot);
        }

        current.publish(slot, item);
    }

    /// Walk forward from `current` to the chunk holding `slot`, creating the
    /// chunks that do not exist yet.
    fn extend_to(&self, mut current: ChunkRef<T>, slot: u64) -> ChunkRef<T> {
        // A chunk we built but lost the race to link. Reused for the next
        // extension instead of being thrown away.
        let mut spare: Option<ChunkRef<T>> = None;

        while current.end_slot() <= slot {
            current = match current.next() {
                Some(next) => next,
                None => {
                    let start_slot = current.end_slot();
                    let fresh = match spare.take() {
                        // Safety: the spare was never linked, only we know it.
                        Some(chunk) => unsafe { chunk.reset(current.as_ptr(), start_slot) },
                        None => self.allocate_chunk(current, start_slot),
                    };
                    match current.next_link().compare_exchange(
                        ptr::null_mut(),
                        fresh.as_ptr(),
                        SeqCst,
                        Acquire,
                    ) {
                        Ok(_) => fresh,
                        Err(winner) => {
                            spare = Some(fresh);
                            match ChunkRef::from_ptr(winner) {
                                Some(winner) => winner,
                                None => fatal(format_args!("chunk link CAS failed against null")),
                            }
                        }
                    }
                }
            };

            self.advance_tail(current);
            self.stamp_release_counter(current);
        }

        if let Some(spare) = spare {
            // Safety: never linked, never seen by another thread.
            unsafe { self.free_chunk(spare) };
        }

        current
    }

    /// Move the tail hint forward to `to`, unless it is already there or past it.
    ///
    /// The hint never moves backward: once a chunk's release counter is
    /// stamped, no later producer can load a tail older than that chunk.
    fn advance_tail(&self, to: ChunkRef<T>) {
        let mut seen = self.tail.load(SeqCst);
        // The caller holds an unwritten slot, so any chunk the hint points at
        // stays alive until that slot is published.
        while let Some(chunk) = ChunkRef::from_ptr(seen) {
            if chunk.start_slot() >= to.start_slot() {
                return;
            }
            match self.tail.compare_exchange(seen, to.as_ptr(), SeqCst, SeqCst) {
                Ok(_) => return,
                Err(actual) => seen = actual,
            }
        }
    }

    /// Record how many slots were reserved by the time `chunk` became
    /// reachable, helping whichever producer linked it. If several producers
    /// race, the smallest observation wins.
    fn stamp_release_counter(&self, chunk: ChunkRef<T>) {
        let counter = chunk.release_counter();
        if counter.load(Acquire) != 0 {
            return;
        }

        let observed = self.tail_counter.load(SeqCst);
        let mut expected = 0;
        loop {
            match counter.compare_exchange(expected, observed, SeqCst, SeqCst) {
                Ok(_) => break,
                Err(actual) if actual > observed => expected = actual,
                Err(_) => break,
            }
        }
    }
}

impl<T, S: BlockSource> Drop for Shared<T, S> {
    fn drop(&mut self) {
        // Every producer handle is gone, so every reserved slot was written.
        let mut undelivered = 0usize;
        // Safety: `&mut self` makes us the only consumer.
        while let Some(item) = unsafe { self.dequeue() } {
            drop(item);
            undelivered += 1;
        }

        let run = self.run.get_mut();
        run.skipped.release_all(&self.source);
        run.retry.release_all(&self.source);
        let mut last = run.head;
        while let Some(next) = last.next() {
            last = next;
        }

        let mut cursor = Some(last);
        while let Some(chunk) = cursor {
            cursor = chunk.prev();
            // Safety: no producers remain and the consumer state is ours.
            unsafe { self.free_chunk(chunk) };
        }

        debug!(
            undelivered,
            reserved = *self.tail_counter.get_mut(),
            "unbounded queue dropped"
        );
    }
}

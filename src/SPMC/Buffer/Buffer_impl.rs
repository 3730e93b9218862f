use std::marker::PhantomData;
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicPtr, AtomicU64, AtomicUsize};
use std::sync::atomic::Ordering::{Acquire, Relaxed, Release};

use crossbeam_utils::CachePadded;
use tracing::debug;

use super::Buffer::{RecycleBuffer, RecycleSlot, TailCursor};
use crate::Core::error::ConfigError;

impl<T> RecycleBuffer<T> {
    pub(crate) fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }

        let slots = (0..capacity)
            .map(|_| RecycleSlot {
                item: AtomicPtr::new(ptr::null_mut()),
                seq: AtomicU64::new(0),
            })
            .collect::<Vec<_>>()
            .into_boxed_slice();

        debug!(capacity, "recycle buffer created");

        Ok(Self {
            slots,
            head: CachePadded::new(AtomicUsize::new(0)),
            head_seq: CachePadded::new(AtomicU64::new(0)),
            dequeue_barrier: CachePadded::new(AtomicU64::new(0)),
            dequeue_counter: CachePadded::new(AtomicU64::new(0)),
            enqueue_counter: CachePadded::new(AtomicU64::new(0)),
            _owns: PhantomData,
        })
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    fn next_index(&self, index: usize) -> usize {
        if index + 1 == self.slots.len() {
            0
        } else {
            index + 1
        }
    }

    /// Store `item`, or hand it back if the buffer is full.
    ///
    /// # Safety
    /// Only the single producer may call this, always with the same cursor.
    pub(crate) unsafe fn enqueue(&self, cursor: &mut TailCursor, item: Box<T>) -> Result<(), Box<T>> {
        // Single producer: nobody else moves `enqueue_counter`.
        let total_enqueued = self.enqueue_counter.load(Relaxed);
        let total_dequeued = self.dequeue_counter.load(Acquire);
        if total_enqueued - total_dequeued == self.slots.len() as u64 {
            return Err(item);
        }

        let item = Box::into_raw(item);
        // A consumer that bumped `dequeue_counter` already cleared its slot,
        // so the scan finds a free one within one lap.
        while self.slots[cursor.tail]
            .item
            .compare_exchange(ptr::null_mut(), item, Release, Relaxed)
            .is_err()
        {
            cursor.tail = self.next_index(cursor.tail);
        }

        cursor.tail_seq += 1;
        self.slots[cursor.tail].seq.store(cursor.tail_seq, Release);
        cursor.tail = self.next_index(cursor.tail);

        self.enqueue_counter.store(total_enqueued + 1, Release);
        Ok(())
    }

    /// Take any one stored item, `None` if the buffer is empty.
    pub(crate) fn dequeue(&self) -> Option<Box<T>> {
        let total_enqueued = self.enqueue_counter.load(Acquire);
        let barrier = self.dequeue_barrier.fetch_add(1, Relaxed) + 1;
        if barrier > total_enqueued {
            self.dequeue_barrier.fetch_sub(1, Relaxed);
            return None;
        }

        // The ticket guarantees a filled slot carrying `my_seq` exists.
        let my_seq = self.head_seq.fetch_add(1, Relaxed) + 1;
        let mut current = self.head.load(Relaxed);
        while self.slots[current].seq.load(Acquire) != my_seq {
            let next = self.next_index(current);
            let _ = self
                .head
                .compare_exchange(current, next, Relaxed, Relaxed);
            current = next;
        }

        let next = self.next_index(current);
        let _ = self
            .head
            .compare_exchange(current, next, Relaxed, Relaxed);

        let item = self.slots[current].item.swap(ptr::null_mut(), Acquire);
        self.dequeue_counter.fetch_add(1, Release);
        // Safety: the slot carried our sequence, so it held an item only we
        // were entitled to take.
        NonNull::new(item).map(|item| unsafe { Box::from_raw(item.as_ptr()) })
    }

    /// Items stored right now. Approximate under concurrency.
    pub(crate) fn len(&self) -> usize {
        let enqueued = self.enqueue_counter.load(Relaxed);
        let dequeued = self.dequeue_counter.load(Relaxed);
        enqueued.saturating_sub(dequeued) as usize
    }
}

impl<T> Drop for RecycleBuffer<T> {
    fn drop(&mut self) {
        let mut dropped = 0usize;
        for slot in self.slots.iter_mut() {
            if let Some(item) = NonNull::new(*slot.item.get_mut()) {
                // Safety: exclusive access, the slot owns the item.
                drop(unsafe { Box::from_raw(item.as_ptr()) });
                dropped += 1;
            }
        }
        debug!(capacity = self.slots.len(), dropped, "recycle buffer dropped");
    }
}

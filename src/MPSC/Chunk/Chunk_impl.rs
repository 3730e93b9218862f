use std::marker::PhantomData;
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicPtr, AtomicU64};
use std::sync::atomic::Ordering::{Acquire, Relaxed, Release};

use super::layout::{block_size_for_slots, slots_offset};
use super::Chunk::{ChunkHeader, ChunkRef};
use crate::Core::alloc::Block;
use crate::Core::fatal::fatal;

impl<T> ChunkRef<T> {
    /// Lay out a fresh chunk over `block`, taking ownership of the block.
    pub(crate) fn init(block: Block, prev: *mut ChunkHeader<T>, start_slot: u64, slots: usize) -> Self {
        let needed = block_size_for_slots::<T>(slots).unwrap_or(usize::MAX);
        if block.size() < needed {
            fatal(format_args!(
                "a {} byte block cannot hold a chunk of {} slots",
                block.size(),
                slots
            ));
        }
        let ptr = block.into_raw().cast::<ChunkHeader<T>>();
        // Safety: the block is ours, large enough and BLOCK_ALIGN aligned.
        unsafe { Self::write(ptr, prev, start_slot, slots) }
    }

    /// Re-lay a chunk that was allocated but never linked into the chain.
    ///
    /// # Safety
    /// The caller must own `self` exclusively; no other thread may have seen it.
    pub(crate) unsafe fn reset(self, prev: *mut ChunkHeader<T>, start_slot: u64) -> Self {
        let slots = self.slot_count();
        Self::write(self.ptr, prev, start_slot, slots)
    }

    unsafe fn write(ptr: NonNull<ChunkHeader<T>>, prev: *mut ChunkHeader<T>, start_slot: u64, slots: usize) -> Self {
        ptr.as_ptr().write(ChunkHeader {
            prev: AtomicPtr::new(prev),
            next: AtomicPtr::new(ptr::null_mut()),
            start_slot,
            slot_count: slots as u64,
            release_counter: AtomicU64::new(0),
        });
        // All-zero bytes are a valid, null `AtomicPtr`.
        let first_slot = ptr.as_ptr().cast::<u8>().add(slots_offset::<T>()).cast::<AtomicPtr<T>>();
        ptr::write_bytes(first_slot, 0, slots);
        Self {
            ptr,
            _marker: PhantomData,
        }
    }

    /// Hand the chunk's memory back as a block of `block_size` bytes.
    ///
    /// # Safety
    /// Nobody may touch the chunk afterwards, and `block_size` must be the
    /// size of the block it was laid over.
    pub(crate) unsafe fn into_block(self, block_size: usize) -> Block {
        Block::from_raw(self.ptr.cast::<u8>(), block_size)
    }

    /// Wrap a raw chunk pointer, `None` for null.
    #[inline]
    pub(crate) fn from_ptr(ptr: *mut ChunkHeader<T>) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self {
            ptr,
            _marker: PhantomData,
        })
    }

    #[inline]
    pub(crate) fn as_ptr(self) -> *mut ChunkHeader<T> {
        self.ptr.as_ptr()
    }

    #[inline]
    fn header(&self) -> &ChunkHeader<T> {
        // Safety: a ChunkRef only exists for live chunks.
        unsafe { self.ptr.as_ref() }
    }

    #[inline]
    pub(crate) fn start_slot(self) -> u64 {
        self.header().start_slot
    }

    #[inline]
    pub(crate) fn slot_count(self) -> usize {
        self.header().slot_count as usize
    }

    /// One past the last slot id in this chunk.
    #[inline]
    pub(crate) fn end_slot(self) -> u64 {
        self.start_slot() + self.header().slot_count
    }

    #[inline]
    pub(crate) fn next(self) -> Option<Self> {
        Self::from_ptr(self.header().next.load(Acquire))
    }

    #[inline]
    pub(crate) fn next_link(&self) -> &AtomicPtr<ChunkHeader<T>> {
        &self.header().next
    }

    #[inline]
    pub(crate) fn prev(self) -> Option<Self> {
        Self::from_ptr(self.header().prev.load(Relaxed))
    }

    /// Consumer only.
    #[inline]
    pub(crate) fn set_prev(self, prev: Option<Self>) {
        let raw = prev.map_or(ptr::null_mut(), Self::as_ptr);
        self.header().prev.store(raw, Relaxed);
    }

    #[inline]
    pub(crate) fn release_counter(&self) -> &AtomicU64 {
        &self.header().release_counter
    }

    #[inline]
    fn slot(&self, index: usize) -> &AtomicPtr<T> {
        debug_assert!(index < self.slot_count());
        // Safety: `index` is within the slot array that follows the header,
        // and the whole block is derived from the same allocation as `ptr`.
        unsafe {
            &*self
                .ptr
                .as_ptr()
                .cast::<u8>()
                .add(slots_offset::<T>())
                .cast::<AtomicPtr<T>>()
                .add(index)
        }
    }

    /// Publish `item` into the slot with global id `slot_id`.
    #[inline]
    pub(crate) fn publish(self, slot_id: u64, item: *mut T) {
        let index = (slot_id - self.start_slot()) as usize;
        self.slot(index).store(item, Release);
    }

    /// Whether the producer of the slot at `index` finished writing it.
    #[inline]
    pub(crate) fn is_written(self, index: usize) -> bool {
        !self.slot(index).load(Acquire).is_null()
    }

    /// Take the item at `index` if its producer finished writing it.
    ///
    /// # Safety
    /// Only the consumer may call this, and at most once per written slot.
    #[inline]
    pub(crate) unsafe fn take(self, index: usize) -> Option<Box<T>> {
        let item = self.slot(index).load(Acquire);
        NonNull::new(item).map(|item| Box::from_raw(item.as_ptr()))
    }
}

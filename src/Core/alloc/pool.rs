use super::Block;
use crate::Core::error::ConfigError;
use crate::Core::fatal::fatal;
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicPtr, AtomicU64};
use std::sync::atomic::Ordering::{AcqRel, Acquire, Relaxed};
use tracing::{debug, trace};

/// Best-effort pool of equally sized blocks, shared by any number of threads.
///
/// The pool is an array of atomically held block pointers:
/// - `alloc` swaps each entry with null until it finds a block, and falls
///   back to the heap when every entry is empty.
/// - `free` swaps the returned block into the first entry and carries the
///   displaced block to the next entry, and so on. A block that falls off the
///   end goes back to the heap.
///
/// Both operations take at most one atomic swap per entry and never wait.
/// Under contention a free can lose its block to the heap even though an
/// entry was empty a moment earlier. That costs a heap round trip later,
/// never a corrupted or doubly handed out block.
pub struct FixedBufferPool {
    pub(super) slots: Box<[AtomicPtr<u8>]>,
    pub(super) block_size: usize,
    pub(super) heap_fallbacks: AtomicU64,
}

impl FixedBufferPool {
    /// Create a pool caching `blocks` blocks of `block_size` bytes, all
    /// allocated up front.
    pub fn new(blocks: usize, block_size: usize) -> Result<Self, ConfigError> {
        Block::validate_size(block_size)?;

        let slots = (0..blocks)
            .map(|_| AtomicPtr::new(Block::alloc(block_size).into_raw().as_ptr()))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        debug!(blocks, block_size, "fixed buffer pool created");

        Ok(Self {
            slots,
            block_size,
            heap_fallbacks: AtomicU64::new(0),
        })
    }

    /// Take a block, from the pool if one is cached, otherwise from the heap.
    pub fn alloc(&self) -> Block {
        for slot in self.slots.iter() {
            let ptr = slot.swap(ptr::null_mut(), Acquire);
            if let Some(ptr) = NonNull::new(ptr) {
                // Safety: only blocks of `block_size` bytes are ever stored.
                return unsafe { Block::from_raw(ptr, self.block_size) };
            }
        }

        self.heap_fallbacks.fetch_add(1, Relaxed);
        trace!(block_size = self.block_size, "pool empty, allocating block from the heap");
        Block::alloc(self.block_size)
    }

    /// Return a block to the pool, or to the heap if the pool is full.
    ///
    /// A block of a different size than this pool's is a broken invariant
    /// and aborts the process.
    pub fn free(&self, block: Block) {
        if block.size() != self.block_size {
            fatal(format_args!(
                "block of {} bytes released into a pool of {} byte blocks",
                block.size(),
                self.block_size
            ));
        }

        let mut carried = block.into_raw().as_ptr();
        for slot in self.slots.iter() {
            carried = slot.swap(carried, AcqRel);
            if carried.is_null() {
                return;
            }
        }

        self.heap_fallbacks.fetch_add(1, Relaxed);
        trace!(block_size = self.block_size, "pool full, releasing block to the heap");
        if let Some(ptr) = NonNull::new(carried) {
            // Safety: `carried` came out of a slot, so it is an owned block of
            // our size that nobody else can reach any more.
            drop(unsafe { Block::from_raw(ptr, self.block_size) });
        }
    }

    /// Size of every block in this pool.
    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }
}

impl Drop for FixedBufferPool {
    fn drop(&mut self) {
        let block_size = self.block_size;
        for slot in self.slots.iter_mut() {
            if let Some(ptr) = NonNull::new(*slot.get_mut()) {
                // Safety: we have exclusive access and the slot owns the block.
                drop(unsafe { Block::from_raw(ptr, block_size) });
            }
        }
        debug!(
            blocks = self.slots.len(),
            block_size,
            heap_fallbacks = *self.heap_fallbacks.get_mut(),
            "fixed buffer pool dropped"
        );
    }
}

use crate::Core::error::ConfigError;
use crate::Core::fatal::fatal;
use std::alloc::{alloc_zeroed, dealloc, handle_alloc_error, Layout};
use std::ptr::NonNull;
use std::sync::Arc;
mod debug;
mod getters;
mod pool;

pub use pool::FixedBufferPool;

/// Alignment of every block handed out by this module. One cache line, so a
/// chunk header never shares a line with a neighbouring allocation.
pub const BLOCK_ALIGN: usize = 64;

/// An owned, fixed-size, cache-line aligned run of bytes.
///
/// A `Block` is the unit the pool hands out. Its bytes are always
/// initialized: fresh blocks come zeroed from the heap and recycled blocks
/// keep whatever their previous owner wrote. Dropping a block returns it to
/// the heap, never to a pool.
pub struct Block {
    ptr: NonNull<u8>,
    size: usize,
}

// A block is plain owned memory.
unsafe impl Send for Block {}
unsafe impl Sync for Block {}

impl Block {
    /// Allocate a zeroed block straight from the heap.
    ///
    /// Out of memory aborts the process through [`handle_alloc_error`].
    pub fn alloc(size: usize) -> Self {
        let layout = Self::layout(size);
        // Safety: `layout` has a non-zero size, checked by `layout`.
        let ptr = unsafe { alloc_zeroed(layout) };
        match NonNull::new(ptr) {
            Some(ptr) => Self { ptr, size },
            None => handle_alloc_error(layout),
        }
    }

    /// Size in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    pub fn as_bytes(&self) -> &[u8] {
        // Safety: the block owns `size` initialized bytes.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.size) }
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        // Safety: the block owns `size` initialized bytes and we hold it mutably.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.size) }
    }

    /// Give up ownership without freeing.
    #[inline]
    pub(crate) fn into_raw(self) -> NonNull<u8> {
        let ptr = self.ptr;
        std::mem::forget(self);
        ptr
    }

    /// Take back ownership of memory produced by [`Block::into_raw`].
    ///
    /// # Safety
    /// `ptr` must come from `into_raw` on a block of exactly `size` bytes, and
    /// no other owner may exist.
    #[inline]
    pub(crate) unsafe fn from_raw(ptr: NonNull<u8>, size: usize) -> Self {
        Self { ptr, size }
    }

    /// Check that `size` is usable as a block size.
    pub(crate) fn validate_size(size: usize) -> Result<(), ConfigError> {
        if size == 0 {
            return Err(ConfigError::ZeroBlockSize);
        }
        Layout::from_size_align(size, BLOCK_ALIGN)
            .map(|_| ())
            .map_err(|_| ConfigError::BlockTooLarge { block_size: size })
    }

    fn layout(size: usize) -> Layout {
        match Layout::from_size_align(size, BLOCK_ALIGN) {
            Ok(layout) if size > 0 => layout,
            _ => fatal(format_args!("invalid block size {size}")),
        }
    }
}

impl Drop for Block {
    fn drop(&mut self) {
        // Safety: allocated in `Block::alloc` with this exact layout.
        unsafe { dealloc(self.ptr.as_ptr(), Self::layout(self.size)) }
    }
}

/// Where the unbounded queue gets the memory for its chunks.
///
/// Implementations must hand out blocks of exactly [`block_size`] bytes and
/// accept them back from any thread.
///
/// [`block_size`]: BlockSource::block_size
pub trait BlockSource: Send + Sync {
    /// Size of every block this source produces.
    fn block_size(&self) -> usize;

    /// Hand out a block. Never fails; out of memory aborts.
    fn acquire(&self) -> Block;

    /// Take a block back.
    fn release(&self, block: Block);
}

/// Blocks straight from the global allocator, no caching.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct HeapBlocks {
    block_size: usize,
}

impl HeapBlocks {
    pub fn new(block_size: usize) -> Result<Self, ConfigError> {
        Block::validate_size(block_size)?;
        Ok(Self { block_size })
    }
}

impl BlockSource for HeapBlocks {
    fn block_size(&self) -> usize {
        self.block_size
    }

    fn acquire(&self) -> Block {
        Block::alloc(self.block_size)
    }

    fn release(&self, block: Block) {
        drop(block);
    }
}

impl BlockSource for FixedBufferPool {
    fn block_size(&self) -> usize {
        FixedBufferPool::block_size(self)
    }

    fn acquire(&self) -> Block {
        self.alloc()
    }

    fn release(&self, block: Block) {
        self.free(block)
    }
}

impl<S: BlockSource + ?Sized> BlockSource for Arc<S> {
    fn block_size(&self) -> usize {
        (**self).block_size()
    }

    fn acquire(&self) -> Block {
        (**self).acquire()
    }

    fn release(&self, block: Block) {
        (**self).release(block)
    }
}

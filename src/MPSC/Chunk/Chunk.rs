// A chunk of the unbounded queue's virtual infinite array.

use std::marker::PhantomData;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicPtr, AtomicU64};

/// Header at the start of every chunk block.
///
/// The slots follow the header directly in the same block, as
/// `slot_count` consecutive `AtomicPtr<T>` values. A null slot is unwritten;
/// a non-null slot owns a `Box<T>` written by the producer that reserved it.
///
/// ### Concurrency Design:
/// - `next` is set at most once, by whichever producer wins the CAS that
///   extends the chain.
/// - `prev` is only shortened by the consumer while reclaiming. Producers
///   read it when their slot lies before the chunk the tail hint points at.
/// - `release_counter` is stamped by producers with the total number of
///   reserved slots observed right after the chunk became reachable. Once the
///   consumer has taken every slot below it, no producer can still hold a
///   pointer to any earlier chunk.
#[repr(C)]
pub struct ChunkHeader<T> {
    /// Previous chunk, null once everything before it was reclaimed.
    pub(crate) prev: AtomicPtr<ChunkHeader<T>>,

    /// Next chunk, null until a producer needs it.
    pub(crate) next: AtomicPtr<ChunkHeader<T>>,

    /// Id of the first slot in this chunk.
    pub(crate) start_slot: u64,

    /// Number of slots following the header.
    pub(crate) slot_count: u64,

    /// Zero until stamped; see the type docs.
    pub(crate) release_counter: AtomicU64,
}

/// A copyable pointer to a live chunk.
///
/// This is NOT an owner. Whoever holds one relies on the reclamation protocol
/// to keep the chunk alive while it is used.
pub struct ChunkRef<T> {
    pub(crate) ptr: NonNull<ChunkHeader<T>>,
    pub(crate) _marker: PhantomData<*mut T>,
}

impl<T> Clone for ChunkRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ChunkRef<T> {}

impl<T> PartialEq for ChunkRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }
}

impl<T> Eq for ChunkRef<T> {}

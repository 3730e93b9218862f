// Consumer-only FIFO of skipped slots, kept in blocks from the queue's own
// block source so a pool-backed queue never touches the heap for it.

use std::marker::PhantomData;
use std::mem::{align_of, size_of};
use std::ptr::{self, NonNull};

use super::Chunk::ChunkRef;
use crate::Core::alloc::{Block, BlockSource};
use crate::Core::error::ConfigError;

/// A slot the consumer reached before its producer wrote it.
pub(crate) struct SkippedSlot<T> {
    pub(crate) chunk: ChunkRef<T>,
    pub(crate) index: usize,
    pub(crate) id: u64,
}

impl<T> Clone for SkippedSlot<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SkippedSlot<T> {}

/// Header at the start of every segment block. Entries follow it directly.
#[repr(C)]
struct SegmentHeader {
    next: *mut SegmentHeader,
}

/// `None` marks an entry taken out of the middle of the FIFO.
type Entry<T> = Option<SkippedSlot<T>>;

#[inline]
const fn entries_offset<T>() -> usize {
    let header = size_of::<SegmentHeader>();
    let align = align_of::<Entry<T>>();
    (header + align - 1) & !(align - 1)
}

/// Number of skipped slots one block of `block_size` bytes can hold.
pub(crate) fn entries_per_block<T>(block_size: usize) -> Result<usize, ConfigError> {
    let required = entries_offset::<T>() + size_of::<Entry<T>>();
    if block_size < required {
        return Err(ConfigError::BlockTooSmall { block_size, required });
    }
    Ok((block_size - entries_offset::<T>()) / size_of::<Entry<T>>())
}

/// Single-threaded FIFO of [`SkippedSlot`]s over a chain of blocks.
///
/// Segments are taken from the block source as the FIFO grows and handed
/// back as soon as the front moves past them. An empty FIFO holds no block.
pub(crate) struct SkipFifo<T> {
    front: *mut SegmentHeader,
    front_offset: usize,
    back: *mut SegmentHeader,
    back_offset: usize,
    live: usize,
    per_segment: usize,
    block_size: usize,
    _marker: PhantomData<SkippedSlot<T>>,
}

impl<T> SkipFifo<T> {
    pub(crate) fn new(block_size: usize) -> Result<Self, ConfigError> {
        Ok(Self {
            front: ptr::null_mut(),
            front_offset: 0,
            back: ptr::null_mut(),
            back_offset: 0,
            live: 0,
            per_segment: entries_per_block::<T>(block_size)?,
            block_size,
            _marker: PhantomData,
        })
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.live == 0
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.live
    }

    /// Oldest entry still in the FIFO.
    pub(crate) fn front(&self) -> Option<SkippedSlot<T>> {
        // Safety: `find` only returns initialized entries.
        self.find(|_| true).and_then(|entry| unsafe { *entry })
    }

    pub(crate) fn push_back<S: BlockSource>(&mut self, source: &S, slot: SkippedSlot<T>) {
        if self.back.is_null() {
            let segment = self.new_segment(source);
            self.front = segment;
            self.back = segment;
            self.front_offset = 0;
            self.back_offset = 0;
        } else if self.back_offset == self.per_segment {
            let segment = self.new_segment(source);
            // Safety: `back` is a live segment owned by us.
            unsafe { (*self.back).next = segment };
            self.back = segment;
            self.back_offset = 0;
        }

        // Safety: `back_offset < per_segment`, inside the segment block.
        unsafe { self.entry(self.back, self.back_offset).write(Some(slot)) };
        self.back_offset += 1;
        self.live += 1;
    }

    pub(crate) fn pop_front<S: BlockSource>(&mut self, source: &S) -> Option<SkippedSlot<T>> {
        self.take_first(source, |_| true)
    }

    /// Remove and return the oldest entry matching `pred`, keeping the order
    /// of everything else.
    pub(crate) fn take_first<S: BlockSource>(
        &mut self,
        source: &S,
        pred: impl FnMut(&SkippedSlot<T>) -> bool,
    ) -> Option<SkippedSlot<T>> {
        let entry = self.find(pred)?;
        // Safety: `find` returned an initialized entry inside a live segment.
        let slot = unsafe { (*entry).take() };
        self.live -= 1;
        self.discard_taken(source);
        slot
    }

    /// Hand every segment back to `source`.
    pub(crate) fn release_all<S: BlockSource>(&mut self, source: &S) {
        let mut segment = self.front;
        while !segment.is_null() {
            // Safety: segments link only to segments we own.
            let next = unsafe { (*segment).next };
            if let Some(block) = self.segment_block(segment) {
                source.release(block);
            }
            segment = next;
        }
        self.reset();
    }

    fn reset(&mut self) {
        self.front = ptr::null_mut();
        self.back = ptr::null_mut();
        self.front_offset = 0;
        self.back_offset = 0;
        self.live = 0;
    }

    fn new_segment<S: BlockSource>(&self, source: &S) -> *mut SegmentHeader {
        let block = source.acquire();
        let segment = block.into_raw().cast::<SegmentHeader>().as_ptr();
        // Safety: a fresh block of `block_size` bytes, BLOCK_ALIGN aligned.
        unsafe {
            segment.write(SegmentHeader {
                next: ptr::null_mut(),
            })
        };
        segment
    }

    fn segment_block(&self, segment: *mut SegmentHeader) -> Option<Block> {
        // Safety: every segment was laid over a block of `block_size` bytes.
        NonNull::new(segment.cast::<u8>()).map(|ptr| unsafe { Block::from_raw(ptr, self.block_size) })
    }

    #[inline]
    unsafe fn entry(&self, segment: *mut SegmentHeader, offset: usize) -> *mut Entry<T> {
        segment
            .cast::<u8>()
            .add(entries_offset::<T>())
            .cast::<Entry<T>>()
            .add(offset)
    }

    /// First initialized, not yet taken entry matching `pred`, front to back.
    fn find(&self, mut pred: impl FnMut(&SkippedSlot<T>) -> bool) -> Option<*mut Entry<T>> {
        let mut segment = self.front;
        let mut offset = self.front_offset;
        while !segment.is_null() {
            let end = if segment == self.back {
                self.back_offset
            } else {
                self.per_segment
            };
            while offset < end {
                // Safety: entries between the front and back offsets are initialized.
                let entry = unsafe { self.entry(segment, offset) };
                if let Some(slot) = unsafe { &*entry } {
                    if pred(slot) {
                        return Some(entry);
                    }
                }
                offset += 1;
            }
            if segment == self.back {
                break;
            }
            // Safety: a segment before `back` always has a successor.
            segment = unsafe { (*segment).next };
            offset = 0;
        }
        None
    }

    /// Move the front past taken entries, releasing segments left behind.
    fn discard_taken<S: BlockSource>(&mut self, source: &S) {
        if self.live == 0 {
            self.release_all(source);
            return;
        }
        // A live entry lies ahead, so the walk stops before running off the back.
        loop {
            if self.front_offset == self.per_segment {
                let spent = self.front;
                // Safety: `spent` is not the back segment, a live entry follows it.
                self.front = unsafe { (*spent).next };
                self.front_offset = 0;
                if let Some(block) = self.segment_block(spent) {
                    source.release(block);
                }
                continue;
            }
            // Safety: the front entry is initialized.
            if unsafe { (*self.entry(self.front, self.front_offset)).is_some() } {
                return;
            }
            self.front_offset += 1;
        }
    }
}

impl<T> Drop for SkipFifo<T> {
    fn drop(&mut self) {
        // The queue hands segments back to its source before this runs;
        // anything left over goes to the heap.
        let mut segment = self.front;
        while !segment.is_null() {
            // Safety: segments link only to segments we own.
            let next = unsafe { (*segment).next };
            drop(self.segment_block(segment));
            segment = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Core::alloc::FixedBufferPool;
    use crate::MPSC::Chunk::layout::block_size_for_slots;

    fn slot(chunk: ChunkRef<u32>, id: u64) -> SkippedSlot<u32> {
        SkippedSlot {
            chunk,
            index: id as usize % 4,
            id,
        }
    }

    #[test]
    fn fifo_spans_segments_and_returns_them() {
        let chunk_size = block_size_for_slots::<u32>(4).unwrap();
        let pool = FixedBufferPool::new(4, 64).unwrap();
        let chunk = ChunkRef::<u32>::init(Block::alloc(chunk_size), ptr::null_mut(), 0, 4);

        let mut fifo = SkipFifo::<u32>::new(64).unwrap();
        let per_segment = entries_per_block::<u32>(64).unwrap();
        assert!(per_segment >= 1);

        let total = per_segment as u64 * 3 + 1;
        for id in 0..total {
            fifo.push_back(&pool, slot(chunk, id));
        }
        assert_eq!(fifo.len(), total as usize);
        assert_eq!(pool.cached_blocks(), 0);

        for id in 0..total {
            assert_eq!(fifo.pop_front(&pool).map(|s| s.id), Some(id));
        }
        assert!(fifo.is_empty());
        assert_eq!(fifo.front().map(|s| s.id), None);
        assert_eq!(pool.cached_blocks(), 4);
        assert_eq!(pool.heap_fallbacks(), 0);

        drop(unsafe { chunk.into_block(chunk_size) });
    }

    #[test]
    fn taking_from_the_middle_keeps_order() {
        let chunk_size = block_size_for_slots::<u32>(4).unwrap();
        let pool = FixedBufferPool::new(8, 64).unwrap();
        let chunk = ChunkRef::<u32>::init(Block::alloc(chunk_size), ptr::null_mut(), 0, 4);

        let mut fifo = SkipFifo::<u32>::new(64).unwrap();
        for id in 0..10 {
            fifo.push_back(&pool, slot(chunk, id));
        }

        assert_eq!(fifo.take_first(&pool, |s| s.id % 3 == 2).map(|s| s.id), Some(2));
        assert_eq!(fifo.take_first(&pool, |s| s.id == 0).map(|s| s.id), Some(0));
        assert_eq!(fifo.take_first(&pool, |s| s.id == 42).map(|s| s.id), None);
        assert_eq!(fifo.front().map(|s| s.id), Some(1));

        let rest: Vec<u64> = std::iter::from_fn(|| fifo.pop_front(&pool).map(|s| s.id)).collect();
        assert_eq!(rest, vec![1, 3, 4, 5, 6, 7, 8, 9]);
        assert_eq!(pool.cached_blocks(), 8);

        drop(unsafe { chunk.into_block(chunk_size) });
    }

    #[test]
    fn block_must_fit_one_entry() {
        let required = entries_offset::<u32>() + size_of::<Entry<u32>>();
        assert_eq!(
            entries_per_block::<u32>(required - 1),
            Err(ConfigError::BlockTooSmall { block_size: required - 1, required })
        );
        assert_eq!(entries_per_block::<u32>(required), Ok(1));
    }
}

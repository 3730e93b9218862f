use super::*;
use std::sync::atomic::Ordering::Relaxed;

/// Getters on FixedBufferPool
///
/// These exist for debugging and monitoring. Every value is read with relaxed
/// ordering and may be stale by the time the caller looks at it.
impl FixedBufferPool {
    /// Number of entries in the pool's array.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of blocks currently cached.
    ///
    /// Approximate under concurrency: entries are sampled one at a time.
    pub fn cached_blocks(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| !slot.load(Relaxed).is_null())
            .count()
    }

    /// How many allocations and releases went to the heap instead of the pool.
    pub fn heap_fallbacks(&self) -> u64 {
        self.heap_fallbacks.load(Relaxed)
    }
}

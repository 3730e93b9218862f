// Plain configuration records. No atomics, nothing shared.

/// Slots per chunk used when the queue draws its chunks from the heap.
pub const DEFAULT_SLOTS_PER_CHUNK: usize = 16;

/// Construction parameters of an unbounded queue with heap chunks.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct QueueConfig {
    pub slots_per_chunk: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            slots_per_chunk: DEFAULT_SLOTS_PER_CHUNK,
        }
    }
}

impl QueueConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slots_per_chunk(mut self, slots: usize) -> Self {
        self.slots_per_chunk = slots;
        self
    }
}

/// Sizes of everything an event channel owns.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Blocks cached by the channel's buffer pool.
    pub pool_blocks: usize,
    /// Bytes per pool block, and so per queue chunk.
    pub block_size: usize,
    /// Event nodes kept for reuse.
    pub recycle_capacity: usize,
    /// Event nodes allocated into the recycler up front.
    pub prefill: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            pool_blocks: 8,
            block_size: 4080,
            recycle_capacity: 1000,
            prefill: 0,
        }
    }
}

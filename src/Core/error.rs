use thiserror::Error;

/// Rejected construction parameters.
///
/// Only constructors return this. Once a pool, queue or channel exists none
/// of its operations can fail.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("block size must be greater than zero")]
    ZeroBlockSize,

    #[error("block size {block_size} exceeds the allocator's layout limits")]
    BlockTooLarge { block_size: usize },

    #[error("a chunk must hold at least one slot")]
    ZeroSlots,

    #[error("a {block_size} byte block cannot hold a chunk (needs at least {required} bytes)")]
    BlockTooSmall { block_size: usize, required: usize },

    #[error("recycle pool capacity must be greater than zero")]
    ZeroCapacity,

    #[error("cannot pre-fill {prefill} items into a recycle pool of capacity {capacity}")]
    PrefillExceedsCapacity { prefill: usize, capacity: usize },
}

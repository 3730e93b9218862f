mod consumer;
mod debug;
mod producer;
mod queue;
mod run;
mod skipped;
mod tail_swap;

pub use consumer::Consumer;
pub use producer::{Producer, Reservation};
pub use tail_swap::{tail_swap, TailSwapConsumer, TailSwapProducer};

pub(crate) mod Chunk {
    pub mod Chunk;
    pub mod Chunk_impl;
    pub mod layout;
    pub use Chunk::{ChunkHeader, ChunkRef}; // re-export for stable path
}

use std::sync::Arc;

use crate::Core::alloc::{BlockSource, HeapBlocks};
use crate::Core::error::ConfigError;
use crate::Structs::Config_Structs::QueueConfig;
use queue::Shared;

/// Create an unbounded queue whose chunks come straight from the heap.
///
/// # Errors
/// `ConfigError::ZeroSlots` if `config` asks for empty chunks.
pub fn unbounded<T>(config: QueueConfig) -> Result<(Producer<T>, Consumer<T>), ConfigError> {
    let block_size = Chunk::layout::block_size_for_slots::<T>(config.slots_per_chunk)?;
    unbounded_with_source(HeapBlocks::new(block_size)?)
}

/// Create an unbounded queue drawing chunk memory from `source`, typically a
/// shared `FixedBufferPool`. The slots per chunk follow from the block size.
///
/// # Errors
/// `ConfigError::BlockTooSmall` if a block cannot hold a chunk of one slot.
pub fn unbounded_with_source<T, S: BlockSource>(
    source: S,
) -> Result<(Producer<T, S>, Consumer<T, S>), ConfigError> {
    let shared = Arc::new(Shared::new(source)?);
    Ok((Producer::new(Arc::clone(&shared)), Consumer::new(shared)))
}

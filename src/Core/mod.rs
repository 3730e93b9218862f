pub mod alloc;
pub mod error;
pub mod fatal;

pub use alloc::{Block, BlockSource, FixedBufferPool, HeapBlocks, BLOCK_ALIGN};
pub use error::ConfigError;
pub use fatal::fatal;

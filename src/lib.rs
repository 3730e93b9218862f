//! Lock-free messaging core for moving input events from platform threads
//! into a single-threaded game loop.
//!
//! - [`Core`]: block allocation (`FixedBufferPool`), configuration errors and
//!   the fatal-error primitive.
//! - [`MPSC`]: the chunked unbounded multi-producer queue, plus the simpler
//!   intrusive tail swap queue.
//! - [`SPMC`]: the bounded recycle pool.
//! - [`Channel`]: the event channel composing the three.
//!
//! ```
//! let (tx, mut rx) = mtq_events::channel::<u64>().unwrap();
//! tx.push(&42);
//! assert_eq!(rx.pop(), Some(42));
//! ```

// Module naming follows project convention (MPSC = Multi-Producer Single-Consumer)
#[allow(non_snake_case)]
pub mod Core;
#[allow(non_snake_case)]
pub mod MPSC;
#[allow(non_snake_case)]
pub mod SPMC;
#[allow(non_snake_case)]
pub mod Channel;
#[allow(non_snake_case)]
pub mod Structs {
    pub mod Config_Structs;
    pub use Config_Structs::{ChannelConfig, QueueConfig}; // re-export for stable path
}
#[allow(non_snake_case)]
mod Debug {
    pub mod StructDebug;
}

pub use Channel::{channel, ChannelBuilder, EventReceiver, EventSender};
pub use Core::{Block, BlockSource, ConfigError, FixedBufferPool, HeapBlocks};
pub use MPSC::{
    tail_swap, unbounded, unbounded_with_source, Consumer, Producer, Reservation, TailSwapConsumer,
    TailSwapProducer,
};
pub use SPMC::{recycle_pool, recycle_pool_with, RecycleConsumer, RecycleProducer};
pub use Structs::{ChannelConfig, QueueConfig};

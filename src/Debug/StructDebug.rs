use std::fmt;
use std::sync::atomic::Ordering::Relaxed;

use crate::Channel::EventReceiver;
use crate::Core::alloc::{Block, BlockSource, FixedBufferPool};
use crate::MPSC::Consumer;
use crate::SPMC::Buffer::RecycleBuffer;

/// Debug function for FixedBufferPool
///
/// Shows the configured sizes and a relaxed snapshot of the counters.
pub fn debug_fixed_buffer_pool(pool: &FixedBufferPool, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("FixedBufferPool")
        .field("block_size", &pool.block_size())
        .field("capacity", &pool.capacity())
        .field("cached_blocks", &pool.cached_blocks())
        .field("heap_fallbacks", &pool.heap_fallbacks())
        .finish()
}

/// Debug function for Block
///
/// Displays the memory location without dumping the contents.
pub fn debug_block(block: &Block, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Block")
        .field("ptr", &format_args!("{:p}", block.as_ptr()))
        .field("size", &block.size())
        .finish()
}

/// Debug function for the unbounded queue's consumer handle
///
/// Never touches pending items: producers may be writing them.
pub fn debug_queue_consumer<T, S>(consumer: &Consumer<T, S>, f: &mut fmt::Formatter<'_>) -> fmt::Result
where
    S: BlockSource + fmt::Debug,
{
    f.debug_struct("Consumer")
        .field("enqueued", &consumer.enqueued())
        .field("slots_per_chunk", &consumer.slots_per_chunk())
        .field("live_chunks", &consumer.live_chunks())
        .field("pending_slots", &consumer.pending_slots())
        .field("block_source", consumer.block_source())
        .finish_non_exhaustive()
}

pub fn debug_recycle_buffer<T>(buffer: &RecycleBuffer<T>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RecycleBuffer")
        .field("capacity", &buffer.capacity())
        .field("enqueued", &buffer.enqueue_counter.load(Relaxed))
        .field("dequeued", &buffer.dequeue_counter.load(Relaxed))
        .finish_non_exhaustive()
}

/// Debug function for EventReceiver
///
/// Shows the channel configuration, the queue and the recycler fill level.
pub fn debug_event_receiver<E>(receiver: &EventReceiver<E>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("EventReceiver")
        .field("config", &receiver.config)
        .field("queue", &receiver.queue)
        .field("recycled_nodes", &receiver.recycler.len())
        .finish()
}

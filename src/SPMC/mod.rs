mod consumer;
mod debug;
mod producer;

pub use consumer::RecycleConsumer;
pub use producer::RecycleProducer;

pub mod Buffer {
    pub mod Buffer;
    pub mod Buffer_impl;
    pub use Buffer::{RecycleBuffer, RecycleSlot}; // re-export for stable path
    pub(crate) use Buffer::TailCursor;
}

use std::sync::Arc;

use crate::Core::error::ConfigError;
use Buffer::RecycleBuffer;

/// Create a recycle pool holding at most `capacity` items.
///
/// # Errors
/// `ConfigError::ZeroCapacity` for a capacity of zero.
pub fn recycle_pool<T>(capacity: usize) -> Result<(RecycleProducer<T>, RecycleConsumer<T>), ConfigError> {
    let buffer = Arc::new(RecycleBuffer::new(capacity)?);
    Ok((RecycleProducer::new(Arc::clone(&buffer)), RecycleConsumer::new(buffer)))
}

/// Like [`recycle_pool`], with `prefill` items made by `make` stored up front.
///
/// # Errors
/// `ConfigError::PrefillExceedsCapacity` if `prefill > capacity`.
pub fn recycle_pool_with<T>(
    capacity: usize,
    prefill: usize,
    mut make: impl FnMut() -> Box<T>,
) -> Result<(RecycleProducer<T>, RecycleConsumer<T>), ConfigError> {
    if prefill > capacity {
        return Err(ConfigError::PrefillExceedsCapacity { prefill, capacity });
    }
    let (mut producer, consumer) = recycle_pool(capacity)?;
    for _ in 0..prefill {
        if producer.enqueue(make()).is_err() {
            break;
        }
    }
    Ok((producer, consumer))
}

use std::sync::Arc;

use super::Buffer::RecycleBuffer;

/// A taking side of a recycle pool. Clone one per thread that reuses items.
pub struct RecycleConsumer<T> {
    pub(crate) buffer: Arc<RecycleBuffer<T>>,
}

impl<T> RecycleConsumer<T> {
    pub(crate) fn new(buffer: Arc<RecycleBuffer<T>>) -> Self {
        Self { buffer }
    }

    /// Take a stored item, `None` if the pool is empty.
    #[inline]
    pub fn dequeue(&self) -> Option<Box<T>> {
        self.buffer.dequeue()
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Items currently stored. Approximate.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Clone for RecycleConsumer<T> {
    fn clone(&self) -> Self {
        Self {
            buffer: Arc::clone(&self.buffer),
        }
    }
}

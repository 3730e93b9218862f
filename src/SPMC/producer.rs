use std::sync::Arc;

use super::Buffer::{RecycleBuffer, TailCursor};

/// The single filling side of a recycle pool.
///
/// Not `Clone`, and `enqueue` takes `&mut self`: the buffer's algorithm relies
/// on exactly one producer.
pub struct RecycleProducer<T> {
    pub(crate) buffer: Arc<RecycleBuffer<T>>,
    cursor: TailCursor,
}

impl<T> RecycleProducer<T> {
    pub(crate) fn new(buffer: Arc<RecycleBuffer<T>>) -> Self {
        Self {
            buffer,
            cursor: TailCursor::default(),
        }
    }

    /// Offer `item` for reuse.
    ///
    /// # Returns
    /// * `Ok(())` if the pool kept the item
    /// * `Err(item)` if the pool is full; the caller still owns the item
    pub fn enqueue(&mut self, item: Box<T>) -> Result<(), Box<T>> {
        // Safety: the only producer handle, borrowed mutably with its cursor.
        unsafe { self.buffer.enqueue(&mut self.cursor, item) }
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

use crate::Core::alloc::FixedBufferPool;
use crate::MPSC::Producer;
use crate::SPMC::RecycleConsumer;
use std::sync::Arc;

/// Producer side of an event channel.
///
/// Clone one per platform thread. Pushing never blocks and never fails.
pub struct EventSender<E> {
    pub(crate) queue: Producer<E, Arc<FixedBufferPool>>,
    pub(crate) recycled: RecycleConsumer<E>,
}

impl<E: Clone> EventSender<E> {
    pub(crate) fn new(queue: Producer<E, Arc<FixedBufferPool>>, recycled: RecycleConsumer<E>) -> Self {
        Self { queue, recycled }
    }

    /// Copy `event` into a node and queue it for the game loop.
    ///
    /// The node is reused from the recycler when one is available, so a warm
    /// channel pushes without touching the heap.
    pub fn push(&self, event: &E) {
        let node = match self.recycled.dequeue() {
            Some(mut node) => {
                (*node).clone_from(event);
                node
            }
            None => Box::new(event.clone()),
        };
        self.queue.enqueue(node);
    }
}

impl<E> Clone for EventSender<E> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            recycled: self.recycled.clone(),
        }
    }
}

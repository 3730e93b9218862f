use std::sync::Arc;

use crate::Core::alloc::FixedBufferPool;
use crate::Core::fatal::fatal;
use crate::MPSC::Consumer;
use crate::SPMC::RecycleProducer;
use crate::Structs::Config_Structs::ChannelConfig;

/// Consumer side of an event channel, owned by the game loop.
pub struct EventReceiver<E> {
    pub(crate) queue: Consumer<E, Arc<FixedBufferPool>>,
    pub(crate) recycler: RecycleProducer<E>,
    pub(crate) config: ChannelConfig,
}

impl<E: Default + Clone> EventReceiver<E> {
    pub(crate) fn new(
        queue: Consumer<E, Arc<FixedBufferPool>>,
        recycler: RecycleProducer<E>,
        config: ChannelConfig,
    ) -> Self {
        Self {
            queue,
            recycler,
            config,
        }
    }

    /// Copy the next event into `out`.
    ///
    /// # Returns
    /// * `true` if an event was copied into `out`
    /// * `false` if no event is ready; `out` is left untouched
    ///
    /// A missing `out` is a caller bug and aborts the process.
    pub fn pop_into(&mut self, out: Option<&mut E>) -> bool {
        let Some(out) = out else {
            fatal(format_args!("EventReceiver::pop_into called without an output location"));
        };
        match self.queue.dequeue() {
            Some(node) => {
                out.clone_from(&node);
                self.recycle(node);
                true
            }
            None => false,
        }
    }

    /// Take the next event, `None` if no event is ready.
    pub fn pop(&mut self) -> Option<E> {
        let mut node = self.queue.dequeue()?;
        let event = std::mem::take(&mut *node);
        self.recycle(node);
        Some(event)
    }

    /// Drain every ready event into `handle`. Returns how many were handled.
    pub fn drain(&mut self, mut handle: impl FnMut(E)) -> usize {
        let mut handled = 0;
        while let Some(event) = self.pop() {
            handle(event);
            handled += 1;
        }
        handled
    }

    fn recycle(&mut self, node: Box<E>) {
        // Full recycler: the node goes back to the heap.
        let _ = self.recycler.enqueue(node);
    }
}

/// Getters on EventReceiver
impl<E> EventReceiver<E> {
    pub fn config(&self) -> ChannelConfig {
        self.config
    }

    /// The buffer pool backing the queue's chunks.
    pub fn pool(&self) -> &FixedBufferPool {
        self.queue.block_source()
    }

    pub fn live_chunks(&self) -> usize {
        self.queue.live_chunks()
    }

    /// Nodes waiting in the recycler.
    pub fn recycled_nodes(&self) -> usize {
        self.recycler.len()
    }
}

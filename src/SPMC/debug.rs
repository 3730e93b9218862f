use super::*;
use std::fmt;

// Debug proxy implementations that call the standalone debug functions
impl<T> fmt::Debug for RecycleBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::Debug::StructDebug::debug_recycle_buffer(self, f)
    }
}

impl<T> fmt::Debug for RecycleProducer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecycleProducer")
            .field("buffer", &*self.buffer)
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Debug for RecycleConsumer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecycleConsumer")
            .field("buffer", &*self.buffer)
            .finish()
    }
}

use super::*;
use std::fmt;

// Debug proxy implementations that call the standalone debug functions
impl<T, S: BlockSource + fmt::Debug> fmt::Debug for Consumer<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::Debug::StructDebug::debug_queue_consumer(self, f)
    }
}

impl<T, S: BlockSource> fmt::Debug for Producer<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer").finish_non_exhaustive()
    }
}

impl<T> fmt::Debug for TailSwapConsumer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TailSwapConsumer").finish_non_exhaustive()
    }
}

impl<T> fmt::Debug for TailSwapProducer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TailSwapProducer").finish_non_exhaustive()
    }
}

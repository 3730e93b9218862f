use std::sync::Arc;

use tracing::debug;

use super::{EventReceiver, EventSender};
use crate::Core::alloc::FixedBufferPool;
use crate::Core::error::ConfigError;
use crate::MPSC::unbounded_with_source;
use crate::SPMC::recycle_pool_with;
use crate::Structs::Config_Structs::ChannelConfig;

pub struct ChannelBuilder {
    pub(crate) config: ChannelConfig,
}

impl Default for ChannelBuilder {
    fn default() -> Self {
        Self {
            config: ChannelConfig::default(),
        }
    }
}

impl ChannelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pool_blocks(mut self, blocks: usize) -> Self {
        self.config.pool_blocks = blocks;
        self
    }

    pub fn with_block_size(mut self, size: usize) -> Self {
        self.config.block_size = size;
        self
    }

    pub fn with_recycle_capacity(mut self, capacity: usize) -> Self {
        self.config.recycle_capacity = capacity;
        self
    }

    /// Allocate this many default events into the recycler up front.
    pub fn with_prefill(mut self, nodes: usize) -> Self {
        self.config.prefill = nodes;
        self
    }

    pub fn build<E>(self) -> Result<(EventSender<E>, EventReceiver<E>), ConfigError>
    where
        E: Default + Clone,
    {
        let config = self.config;

        let pool = Arc::new(FixedBufferPool::new(config.pool_blocks, config.block_size)?);
        let (queue_tx, queue_rx) = unbounded_with_source::<E, _>(pool)?;
        let (recycler, recycled) =
            recycle_pool_with(config.recycle_capacity, config.prefill, || Box::new(E::default()))?;

        debug!(
            pool_blocks = config.pool_blocks,
            block_size = config.block_size,
            slots_per_chunk = queue_rx.slots_per_chunk(),
            recycle_capacity = config.recycle_capacity,
            prefill = config.prefill,
            "event channel created"
        );

        Ok((
            EventSender::new(queue_tx, recycled),
            EventReceiver::new(queue_rx, recycler, config),
        ))
    }
}

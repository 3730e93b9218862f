mod builder;
mod debug;
mod receiver;
mod sender;

pub use builder::ChannelBuilder;
pub use receiver::EventReceiver;
pub use sender::EventSender;

use crate::Core::error::ConfigError;

/// Create an event channel with the default sizes: 8 pool blocks of 4080
/// bytes and a recycler of 1000 nodes.
pub fn channel<E: Default + Clone>() -> Result<(EventSender<E>, EventReceiver<E>), ConfigError> {
    ChannelBuilder::new().build()
}

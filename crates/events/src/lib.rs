//! Live event fan-out for sealpost.
//!
//! - [`ChannelRegistry`]: per-session push channels keyed by session id,
//!   each bound to one conversation.
//! - [`StreamEvent`]: the wire envelope pushed to subscribers.
//! - [`NotificationDispatcher`]: turns committed message-log mutations into
//!   events and publishes them.
//! - [`sweep`]: the periodic idle-channel sweeper.

pub mod dispatch;
pub mod event;
pub mod registry;
pub mod sweep;

pub use dispatch::NotificationDispatcher;
pub use event::{EventType, StreamEvent};
pub use registry::{
    ChannelHandle, ChannelRegistry, Delivery, DeliveryError, RegistryError, SweepReport,
};

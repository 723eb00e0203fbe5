//! Live fan-out of readings to subscribers.
//!
//! A [`BroadcastHub`] keeps the registry of live viewers. New subscribers get
//! the current history window as their first event, then every reading
//! published after it, exactly once and in order. Each subscriber has its own
//! bounded channel; a subscriber that cannot keep up or went away is dropped
//! without affecting the others.

mod event;
mod hub;
mod subscription;

pub use event::Event;
pub use hub::BroadcastHub;
pub use subscription::{SubscriberId, Subscription};

/// Why an event could not be handed to a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("subscriber buffer full")]
    Full,

    #[error("subscriber disconnected")]
    Closed,
}

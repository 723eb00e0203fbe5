use std::fmt;

use tokio::sync::mpsc;

use crate::event::Event;

/// Opaque handle identifying one subscriber in a hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(pub(crate) u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Receiving side of a subscription.
///
/// The first event is always [`Event::History`]. The stream ends (`recv`
/// returns `None`) once the hub has dropped the subscriber.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    rx: mpsc::Receiver<Event>,
}

impl Subscription {
    pub(crate) fn new(id: SubscriberId, rx: mpsc::Receiver<Event>) -> Self {
        Self { id, rx }
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Waits for the next event.
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Returns the next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<Event> {
        self.rx.try_recv().ok()
    }
}

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use thermowatch_history::HistoryStore;
use thermowatch_protocol::constants::SUBSCRIBER_BUFFER_SIZE;
use thermowatch_protocol::{Fault, Reading};
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::DeliveryError;
use crate::event::Event;
use crate::subscription::{SubscriberId, Subscription};

struct Slot {
    tx: mpsc::Sender<Event>,
    /// Sequence number of the newest reading this subscriber has seen,
    /// either in its history snapshot or live.
    watermark: u64,
}

/// Registry of live subscribers.
///
/// Registration, removal and delivery all happen under one lock that is never
/// held across an await: delivery is a non-blocking `try_send`.
pub struct BroadcastHub {
    store: Arc<HistoryStore>,
    subscribers: Mutex<HashMap<SubscriberId, Slot>>,
    next_id: AtomicU64,
    buffer_size: usize,
}

impl BroadcastHub {
    pub fn new(store: Arc<HistoryStore>) -> Self {
        Self::with_buffer_size(store, SUBSCRIBER_BUFFER_SIZE)
    }

    /// Creates a hub with a custom per-subscriber buffer (minimum 1).
    pub fn with_buffer_size(store: Arc<HistoryStore>, buffer_size: usize) -> Self {
        Self {
            store,
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            buffer_size: buffer_size.max(1),
        }
    }

    /// Registers a new subscriber and queues the current history as its
    /// first event.
    ///
    /// The snapshot is taken while holding the registry lock, so any reading
    /// published afterwards is either in the snapshot or delivered live, never
    /// both.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(self.buffer_size);
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));

        let mut subscribers = self.subscribers.lock();
        let snapshot = self.store.sequenced_snapshot();
        let history_len = snapshot.readings.len();

        if tx.try_send(Event::History(snapshot.readings)).is_ok() {
            subscribers.insert(
                id,
                Slot {
                    tx,
                    watermark: snapshot.last_seq,
                },
            );
            tracing::debug!(%id, history_len, total = subscribers.len(), "subscriber registered");
        } else {
            tracing::warn!(%id, "could not queue history, subscriber not registered");
        }

        Subscription::new(id, rx)
    }

    /// Removes a subscriber. Unknown or already removed ids are ignored.
    ///
    /// Returns `true` if the subscriber was registered.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = self.subscribers.lock().remove(&id).is_some();
        if removed {
            tracing::debug!(%id, "subscriber removed");
        }
        removed
    }

    /// Fans out a reading that was appended to the store as `seq`.
    ///
    /// Must only be called after the append returned. Subscribers whose
    /// snapshot already contains `seq` are skipped. Returns the number of
    /// subscribers the reading was delivered to.
    pub fn publish(&self, seq: u64, reading: Reading) -> usize {
        let mut subscribers = self.subscribers.lock();
        let mut delivered = 0;
        let mut broken = Vec::new();

        for (id, slot) in subscribers.iter_mut() {
            if slot.watermark >= seq {
                continue;
            }
            slot.watermark = seq;
            match deliver(&slot.tx, Event::Reading(reading)) {
                Ok(()) => delivered += 1,
                Err(e) => broken.push((*id, e)),
            }
        }

        drop_broken(&mut subscribers, broken);
        delivered
    }

    /// Fans out a fault notification. The store is not touched.
    pub fn publish_fault(&self, fault: &Fault) -> usize {
        let mut subscribers = self.subscribers.lock();
        let mut delivered = 0;
        let mut broken = Vec::new();

        for (id, slot) in subscribers.iter() {
            match deliver(&slot.tx, Event::Fault(fault.clone())) {
                Ok(()) => delivered += 1,
                Err(e) => broken.push((*id, e)),
            }
        }

        drop_broken(&mut subscribers, broken);
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// The store this hub snapshots from.
    pub fn store(&self) -> &Arc<HistoryStore> {
        &self.store
    }
}

fn deliver(tx: &mpsc::Sender<Event>, event: Event) -> Result<(), DeliveryError> {
    tx.try_send(event).map_err(|e| match e {
        TrySendError::Full(_) => DeliveryError::Full,
        TrySendError::Closed(_) => DeliveryError::Closed,
    })
}

fn drop_broken(
    subscribers: &mut HashMap<SubscriberId, Slot>,
    broken: Vec<(SubscriberId, DeliveryError)>,
) {
    for (id, err) in broken {
        subscribers.remove(&id);
        match err {
            DeliveryError::Closed => tracing::debug!(%id, "dropping disconnected subscriber"),
            DeliveryError::Full => tracing::warn!(%id, "dropping subscriber: {err}"),
        }
    }
}

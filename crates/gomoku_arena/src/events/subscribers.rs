//! Per-session subscriber registry.

use super::SessionEvent;
use crate::ids::SessionId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tracing::{debug, instrument, trace};

/// Identifies one subscriber connection.
pub type SubscriberId = u64;

type Room = HashMap<SubscriberId, mpsc::UnboundedSender<SessionEvent>>;

/// Who is listening to which session.
#[derive(Debug, Default)]
pub struct Subscribers {
    next_id: AtomicU64,
    rooms: Mutex<HashMap<SessionId, Room>>,
}

impl Subscribers {
    /// Creates an empty registry.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn rooms(&self) -> MutexGuard<'_, HashMap<SessionId, Room>> {
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a new listener for `session_id`.
    #[instrument(skip(self), fields(session_id = %session_id))]
    pub fn subscribe(self: &Arc<Self>, session_id: SessionId) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.rooms().entry(session_id).or_default().insert(id, tx);
        debug!(subscriber = id, "Subscribed");
        Subscription {
            subscribers: Arc::clone(self),
            id,
            session_id,
            rx,
        }
    }

    /// Removes one listener from one session. Returns whether it was
    /// registered.
    #[instrument(skip(self), fields(session_id = %session_id))]
    pub fn unsubscribe(&self, session_id: SessionId, subscriber: SubscriberId) -> bool {
        let mut rooms = self.rooms();
        let Some(room) = rooms.get_mut(&session_id) else {
            return false;
        };
        let removed = room.remove(&subscriber).is_some();
        if room.is_empty() {
            rooms.remove(&session_id);
        }
        debug!(subscriber, removed, "Unsubscribed");
        removed
    }

    /// Removes a listener from every session, returning how many
    /// registrations were dropped.
    #[instrument(skip(self))]
    pub fn disconnect(&self, subscriber: SubscriberId) -> usize {
        let mut rooms = self.rooms();
        let mut removed = 0;
        rooms.retain(|_, room| {
            if room.remove(&subscriber).is_some() {
                removed += 1;
            }
            !room.is_empty()
        });
        debug!(removed, "Subscriber disconnected");
        removed
    }

    /// Listeners currently registered for `session_id`.
    pub fn subscriber_count(&self, session_id: SessionId) -> usize {
        self.rooms().get(&session_id).map_or(0, HashMap::len)
    }

    /// Delivers `event` to every listener of its session, pruning listeners
    /// whose receiver is gone. Returns the number of deliveries.
    #[instrument(skip(self, event), fields(session_id = %event.session_id(), event = event.name()))]
    pub fn fan_out(&self, event: &SessionEvent) -> usize {
        let session_id = event.session_id();
        let mut rooms = self.rooms();
        let Some(room) = rooms.get_mut(&session_id) else {
            trace!("No subscribers");
            return 0;
        };
        room.retain(|_, tx| tx.send(event.clone()).is_ok());
        let delivered = room.len();
        if room.is_empty() {
            rooms.remove(&session_id);
        }
        trace!(delivered, "Event delivered");
        delivered
    }
}

/// A live listener. Unsubscribes itself when dropped.
#[derive(Debug)]
pub struct Subscription {
    subscribers: Arc<Subscribers>,
    id: SubscriberId,
    session_id: SessionId,
    rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl Subscription {
    /// This listener's id.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Session being listened to.
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Waits for the next event. `None` once the registry dropped this
    /// listener.
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        self.rx.recv().await
    }

    /// Next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<SessionEvent> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.subscribers.unsubscribe(self.session_id, self.id);
    }
}

//! Engine-facing event queue and the task that drains it.

use super::{SessionEvent, Subscribers};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, instrument, trace};

/// Enqueues events without blocking.
///
/// Cloning yields another handle to the same queue.
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

/// Drains the queue into the subscriber registry.
///
/// Run it on the async runtime with [`FanOut::run`]. It stops once every
/// [`EventDispatcher`] handle has been dropped.
#[derive(Debug)]
pub struct FanOut {
    rx: mpsc::UnboundedReceiver<SessionEvent>,
    subscribers: Arc<Subscribers>,
}

impl EventDispatcher {
    /// Creates a queue feeding `subscribers`.
    #[instrument(skip(subscribers))]
    pub fn new(subscribers: Arc<Subscribers>) -> (Self, FanOut) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, FanOut { rx, subscribers })
    }

    /// Enqueues `event`. If the fan-out task is gone the event is dropped.
    pub fn dispatch(&self, event: SessionEvent) {
        let session_id = event.session_id();
        if self.tx.send(event).is_err() {
            trace!(session_id = %session_id, "Fan-out stopped; event dropped");
        }
    }
}

impl FanOut {
    /// Delivers queued events in order until the queue closes.
    #[instrument(skip(self))]
    pub async fn run(mut self) {
        info!("Event fan-out started");
        while let Some(event) = self.rx.recv().await {
            self.subscribers.fan_out(&event);
        }
        info!("Event fan-out stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{AccountId, SessionId};
    use crate::session::Session;
    use chrono::Utc;

    #[tokio::test]
    async fn test_events_arrive_in_dispatch_order() {
        let subscribers = Subscribers::new();
        let (dispatcher, fan_out) = EventDispatcher::new(Arc::clone(&subscribers));
        let task = tokio::spawn(fan_out.run());

        let session = Session::open(SessionId::generate(), AccountId::from("alice"), 10, 5, 3, Utc::now());
        let mut sub = subscribers.subscribe(*session.id());

        dispatcher.dispatch(SessionEvent::Joined(session.view()));
        dispatcher.dispatch(SessionEvent::Move(session.view()));
        dispatcher.dispatch(SessionEvent::StatusChanged(session.view()));

        let names: Vec<String> = [
            sub.recv().await.unwrap(),
            sub.recv().await.unwrap(),
            sub.recv().await.unwrap(),
        ]
        .iter()
        .map(|e| e.name().to_string())
        .collect();
        assert_eq!(names, ["joined", "move", "status_changed"]);

        drop(dispatcher);
        task.await.unwrap();
    }

    #[test]
    fn test_dispatch_without_fan_out_is_silent() {
        let (dispatcher, fan_out) = EventDispatcher::new(Subscribers::new());
        drop(fan_out);
        let session = Session::open(SessionId::generate(), AccountId::from("alice"), 10, 5, 3, Utc::now());
        dispatcher.dispatch(SessionEvent::Move(session.view()));
    }
}

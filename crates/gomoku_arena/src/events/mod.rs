//! Session events and their delivery to subscribers.
//!
//! Every committed transition produces one [`SessionEvent`] carrying the
//! full session snapshot. The engine enqueues it on the [`EventDispatcher`]
//! while still holding the session lock, so per-session commit order is
//! the delivery order. A single [`FanOut`] task drains the queue into the
//! [`Subscribers`] registry. Delivery is at-most-once and never blocks the
//! engine.

mod dispatcher;
mod subscribers;

pub use dispatcher::{EventDispatcher, FanOut};
pub use subscribers::{SubscriberId, Subscribers, Subscription};

use crate::ids::SessionId;
use crate::session::SessionView;
use serde::Serialize;

/// A committed transition, tagged by kind.
///
/// Serializes as `{"event": "<kind>", "session": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, strum::AsRefStr)]
#[serde(tag = "event", content = "session", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SessionEvent {
    /// The second seat was filled and play began.
    Joined(SessionView),
    /// A stone was placed and play continues.
    Move(SessionView),
    /// The session finished or was cancelled.
    StatusChanged(SessionView),
}

impl SessionEvent {
    /// Snapshot carried by the event.
    pub fn session(&self) -> &SessionView {
        match self {
            Self::Joined(view) | Self::Move(view) | Self::StatusChanged(view) => view,
        }
    }

    /// Session the event belongs to.
    pub fn session_id(&self) -> SessionId {
        self.session().id
    }

    /// Wire name of the event kind.
    pub fn name(&self) -> &str {
        self.as_ref()
    }
}

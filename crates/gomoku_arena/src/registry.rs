//! Session registry.
//!
//! Sessions are keyed by id, each behind its own mutex. The map lock is
//! held only long enough to find or insert a slot, so work on different
//! sessions never contends; all mutation of one session happens under its
//! slot's lock and is therefore strictly ordered.

use crate::ids::SessionId;
use crate::session::{Session, SessionStatus};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tracing::{debug, info, instrument};

/// Shared handle to one session's serialized state.
pub type SessionSlot = Arc<Mutex<Session>>;

/// Locks a slot, recovering the state if a previous holder panicked.
pub fn lock_slot(slot: &SessionSlot) -> MutexGuard<'_, Session> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// All sessions known to the process.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, SessionSlot>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating session registry");
        Self::default()
    }

    /// Adds a session, replacing any previous slot with the same id.
    #[instrument(skip(self, session), fields(session_id = %session.id()))]
    pub fn insert(&self, session: Session) -> SessionSlot {
        let id = *session.id();
        let slot = Arc::new(Mutex::new(session));
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::clone(&slot));
        debug!("Session registered");
        slot
    }

    /// The slot for `id`, if registered.
    pub fn slot(&self, id: &SessionId) -> Option<SessionSlot> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// A consistent copy of one session.
    pub fn snapshot(&self, id: &SessionId) -> Option<Session> {
        self.slot(id).map(|slot| lock_slot(&slot).clone())
    }

    /// Copies of every session, oldest first.
    pub fn snapshots(&self) -> Vec<Session> {
        let slots: Vec<SessionSlot> = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        let mut sessions: Vec<Session> = slots.iter().map(|slot| lock_slot(slot).clone()).collect();
        sessions.sort_by_key(|s| *s.created_at());
        sessions
    }

    /// Copies of sessions in `status`, oldest first.
    pub fn with_status(&self, status: SessionStatus) -> Vec<Session> {
        self.snapshots()
            .into_iter()
            .filter(|s| *s.status() == status)
            .collect()
    }

    /// Number of registered sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// True if no session is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

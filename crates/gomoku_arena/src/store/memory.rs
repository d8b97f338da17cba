//! In-process session store.

use super::{SessionStore, StoreError, StoredSession};
use crate::ids::SessionId;
use crate::session::Session;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, instrument};

/// Session store backed by a map; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: Mutex<HashMap<SessionId, StoredSession>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a record as-is, bypassing the engine.
    pub fn insert(&self, stored: StoredSession) {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(stored.id, stored);
    }

    /// Number of stored sessions.
    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// True if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemoryStore {
    #[instrument(skip(self, session), fields(session_id = %session.id()))]
    fn save_session(&self, session: &Session) -> Result<(), StoreError> {
        debug!("Saving session in memory");
        self.insert(StoredSession::from(session));
        Ok(())
    }

    #[instrument(skip(self))]
    fn load_sessions(&self) -> Result<Vec<StoredSession>, StoreError> {
        let sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let mut loaded: Vec<_> = sessions.values().cloned().collect();
        loaded.sort_by_key(|s| s.created_at);
        debug!(count = loaded.len(), "Loaded sessions from memory");
        Ok(loaded)
    }
}

//! Session persistence collaborator.
//!
//! The engine hands every committed session to a [`SessionStore`] and reads
//! them back on restart. The storage technology is the implementor's
//! business: [`MemoryStore`] keeps records in process, the SQLite
//! [`Repository`](crate::Repository) writes them to disk.

mod error;
mod memory;

pub use error::StoreError;
pub use memory::MemoryStore;

use crate::ids::{AccountId, SessionId};
use crate::session::{MoveRecord, Session, SessionResult, SessionStatus};
use chrono::{DateTime, Utc};
use gomoku_board::{Board, Seat};

/// Durable sink and source of sessions.
pub trait SessionStore: Send + Sync + std::fmt::Debug {
    /// Writes the session and any moves not yet stored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    fn save_session(&self, session: &Session) -> Result<(), StoreError>;

    /// Reads every stored session with its move log in order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the read fails.
    fn load_sessions(&self) -> Result<Vec<StoredSession>, StoreError>;
}

/// A session as it sits in storage, not yet checked against its move log.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSession {
    /// Session id.
    pub id: SessionId,
    /// Stake per seat.
    pub stake: i64,
    /// Persisted status.
    pub status: SessionStatus,
    /// Persisted result.
    pub result: Option<SessionResult>,
    /// Persisted winner.
    pub winner_id: Option<AccountId>,
    /// Board side length.
    pub board_size: usize,
    /// Run length needed to win.
    pub win_condition: usize,
    /// Creator.
    pub player1_id: AccountId,
    /// Joiner.
    pub player2_id: Option<AccountId>,
    /// Persisted turn.
    pub current_turn: Seat,
    /// Persisted board.
    pub board: Board,
    /// Move log ordered by sequence.
    pub moves: Vec<MoveRecord>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last transition time.
    pub updated_at: DateTime<Utc>,
}

impl From<&Session> for StoredSession {
    fn from(session: &Session) -> Self {
        Self {
            id: *session.id(),
            stake: *session.stake(),
            status: *session.status(),
            result: *session.result(),
            winner_id: session.winner_id().clone(),
            board_size: session.board_size(),
            win_condition: *session.win_condition(),
            player1_id: session.player1_id().clone(),
            player2_id: session.player2_id().clone(),
            current_turn: *session.current_turn(),
            board: session.board().clone(),
            moves: session.moves().clone(),
            created_at: *session.created_at(),
            updated_at: *session.updated_at(),
        }
    }
}

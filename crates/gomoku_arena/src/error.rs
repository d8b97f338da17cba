//! Engine error types.
//!
//! Every failure the engine reports is an [`ArenaError`]: a specific
//! [`ArenaErrorKind`] plus the source location that raised it. Each kind
//! belongs to exactly one [`ErrorClass`], which is what callers see at the
//! request boundary. All classes are recoverable by the caller.

use crate::ids::{AccountId, SessionId};
use derive_more::{Display, Error};
use serde::Serialize;
use tracing::instrument;

/// Client-visible failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorClass {
    /// A session or account does not exist.
    NotFound,
    /// The session is in the wrong status for the request.
    InvalidState,
    /// Coordinates, parameters or participants are malformed.
    InvalidInput,
    /// The caller may not perform this action now.
    Unauthorized,
    /// The account cannot cover the stake.
    InsufficientFunds,
    /// Storage failure; not caused by the caller.
    Internal,
}

/// Specific reason an operation was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum ArenaErrorKind {
    /// No session with this id.
    #[display("Session {_0} not found")]
    SessionNotFound(SessionId),

    /// No account with this id.
    #[display("Account {_0} not found")]
    AccountNotFound(AccountId),

    /// An account with this id is already open.
    #[display("Account {_0} already exists")]
    AccountExists(AccountId),

    /// Join attempted on a session that is not waiting for a second player.
    #[display("Session {_0} is not available for joining")]
    SessionNotJoinable(SessionId),

    /// Move attempted on a session that is not being played.
    #[display("Session {_0} is not in playing state")]
    SessionNotPlayable(SessionId),

    /// Cancel attempted on a session that already started or ended.
    #[display("Session {_0} can no longer be cancelled")]
    SessionNotCancellable(SessionId),

    /// The creator tried to join their own session.
    #[display("Cannot join your own session")]
    SelfJoin,

    /// Coordinates fall outside the board.
    #[display("Cell ({row}, {col}) is outside the board")]
    OutOfBounds {
        /// Requested row.
        row: i32,
        /// Requested column.
        col: i32,
    },

    /// The target cell already holds a stone.
    #[display("Cell ({row}, {col}) is already occupied")]
    CellOccupied {
        /// Requested row.
        row: i32,
        /// Requested column.
        col: i32,
    },

    /// Stake is zero or negative.
    #[display("Stake must be positive, got {_0}")]
    InvalidStake(i64),

    /// Board size outside the configured limits.
    #[display("Board size {size} must be between {min} and {max}")]
    InvalidBoardSize {
        /// Requested size.
        size: usize,
        /// Smallest allowed size.
        min: usize,
        /// Largest allowed size.
        max: usize,
    },

    /// Win condition longer than the board or too short to be meaningful.
    #[display("Win condition {win_condition} must be between 3 and {board_size}")]
    InvalidWinCondition {
        /// Requested run length.
        win_condition: usize,
        /// Board size it was requested for.
        board_size: usize,
    },

    /// The caller holds neither seat of the session.
    #[display("Account {_0} is not a player in this session")]
    NotAParticipant(AccountId),

    /// The caller's seat is not the one to move.
    #[display("Not your turn")]
    NotYourTurn,

    /// Balance below the required stake.
    #[display("Insufficient balance: {required} required, {available} available")]
    InsufficientBalance {
        /// Amount the operation needs.
        required: i64,
        /// Amount on the account.
        available: i64,
    },

    /// Persistence collaborator failed.
    #[display("Storage failure: {_0}")]
    Storage(String),

    /// A persisted record could not be interpreted.
    #[display("Corrupt record: {_0}")]
    CorruptRecord(String),
}

impl ArenaErrorKind {
    /// The client-visible class of this kind.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::SessionNotFound(_) | Self::AccountNotFound(_) => ErrorClass::NotFound,
            Self::AccountExists(_)
            | Self::SessionNotJoinable(_)
            | Self::SessionNotPlayable(_)
            | Self::SessionNotCancellable(_) => ErrorClass::InvalidState,
            Self::SelfJoin
            | Self::OutOfBounds { .. }
            | Self::CellOccupied { .. }
            | Self::InvalidStake(_)
            | Self::InvalidBoardSize { .. }
            | Self::InvalidWinCondition { .. } => ErrorClass::InvalidInput,
            Self::NotAParticipant(_) | Self::NotYourTurn => ErrorClass::Unauthorized,
            Self::InsufficientBalance { .. } => ErrorClass::InsufficientFunds,
            Self::Storage(_) | Self::CorruptRecord(_) => ErrorClass::Internal,
        }
    }
}

/// Engine error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Arena error: {} at {}:{}", kind, file, line)]
pub struct ArenaError {
    /// What went wrong.
    pub kind: ArenaErrorKind,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ArenaError {
    /// Creates a new error with caller location tracking.
    #[track_caller]
    #[instrument(skip(kind), fields(kind = %kind))]
    pub fn new(kind: ArenaErrorKind) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// The client-visible class.
    pub fn class(&self) -> ErrorClass {
        self.kind.class()
    }
}

impl From<ArenaErrorKind> for ArenaError {
    #[track_caller]
    fn from(kind: ArenaErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<gomoku_board::BoardError> for ArenaError {
    #[track_caller]
    fn from(err: gomoku_board::BoardError) -> Self {
        use gomoku_board::BoardError;
        let kind = match err {
            BoardError::OutOfBounds { row, col } => ArenaErrorKind::OutOfBounds { row, col },
            BoardError::CellOccupied { row, col } => ArenaErrorKind::CellOccupied { row, col },
            other => ArenaErrorKind::CorruptRecord(other.to_string()),
        };
        Self::new(kind)
    }
}

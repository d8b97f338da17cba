//! Gomoku Arena - staked two-player gomoku session engine
//!
//! Players escrow a stake, alternate stones on a square board, and the
//! first to complete a straight run of the configured length takes the
//! pot. A full board without a run is a draw and refunds both stakes.
//!
//! # Architecture
//!
//! - **Arena**: the engine; serializes every transition per session
//! - **Ledger**: balances and statistics behind [`LedgerGateway`]
//! - **Store**: session persistence behind [`SessionStore`]
//! - **Events**: per-session subscribers fed by one fan-out task
//! - **HTTP**: axum routes and a server-sent-event stream
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use gomoku_arena::{AccountId, Arena, LedgerGateway, MemoryLedger, RuleLimits, SessionStatus};
//!
//! # fn main() -> Result<(), gomoku_arena::ArenaError> {
//! let ledger = Arc::new(MemoryLedger::new());
//! let alice = AccountId::from("alice");
//! let bob = AccountId::from("bob");
//! ledger.open_account(&alice, None, 1000)?;
//! ledger.open_account(&bob, None, 1000)?;
//!
//! let (arena, _fan_out) = Arena::new(ledger.clone(), None, RuleLimits::default());
//! let session = arena.create_session(&alice, 100, None, None)?;
//! let session = arena.join_session(session.id, &bob)?;
//! assert_eq!(session.status, SessionStatus::Playing);
//! assert_eq!(ledger.balance(&bob)?, 900);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod arena;
mod config;
mod db;
mod error;
mod events;
mod http;
mod ids;
mod ledger;
mod registry;
mod session;
mod settlement;
mod store;

// Crate-level exports - Engine
pub use arena::{Arena, ReconcileReport};

// Crate-level exports - Configuration
pub use config::{ArenaConfig, CONFIG_ENV, ConfigError, MIN_WIN_CONDITION, RuleLimits};

// Crate-level exports - Errors
pub use error::{ArenaError, ArenaErrorKind, ErrorClass};

// Crate-level exports - Identifiers
pub use ids::{AccountId, SessionId};

// Crate-level exports - Session model
pub use session::{
    ActorHoldsTurn, ActorIsParticipant, CellInBounds, CellIsEmpty, DistinctSeatsInvariant,
    LogMatchesBoardInvariant, MoveAttempt, MoveOutcome, MoveRecord, PlayingHasBothSeatsInvariant,
    Precondition, Replay, Session, SessionInvariants, SessionIsPlayable, SessionResult,
    SessionStatus, SessionStoneBalanceInvariant, SessionView, TerminalHasResultInvariant,
    WaitingBoardEmptyInvariant, validate_move,
};

// Crate-level exports - Ledger
pub use ledger::{Account, GameOutcome, LedgerGateway, MemoryLedger, Standing};
pub use settlement::{DRAW_XP, LOSS_XP, STAKE_PER_BONUS_XP, Settlement, WIN_BASE_XP, win_xp};

// Crate-level exports - Persistence
pub use db::Repository;
pub use store::{MemoryStore, SessionStore, StoreError, StoredSession};

// Crate-level exports - Registry and events
pub use events::{EventDispatcher, FanOut, SessionEvent, SubscriberId, Subscribers, Subscription};
pub use registry::{SessionRegistry, SessionSlot, lock_slot};

// Crate-level exports - HTTP
pub use http::{
    ActorRequest, AppState, CreateSessionRequest, DEFAULT_LEADERBOARD_LIMIT, ErrorBody,
    LeaderboardQuery, MAX_LEADERBOARD_LIMIT, MoveRequest, OpenAccountRequest, router, status_for,
};

// Board types used in session views
pub use gomoku_board::{Board, Cell, Seat};

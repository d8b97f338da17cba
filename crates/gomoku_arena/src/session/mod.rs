//! Game sessions: data model, legal-move preconditions and invariants.

mod invariants;
mod model;
mod replay;
mod validator;

pub use invariants::{
    DistinctSeatsInvariant, LogMatchesBoardInvariant, PlayingHasBothSeatsInvariant,
    SessionInvariants, SessionStoneBalanceInvariant, TerminalHasResultInvariant,
    WaitingBoardEmptyInvariant,
};
pub use model::{MoveOutcome, MoveRecord, Session, SessionResult, SessionStatus, SessionView};
pub use replay::Replay;
pub use validator::{
    ActorHoldsTurn, ActorIsParticipant, CellInBounds, CellIsEmpty, MoveAttempt, Precondition,
    SessionIsPlayable, validate_move,
};

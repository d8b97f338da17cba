//! Move preconditions.
//!
//! Each precondition is a named check over a session snapshot and a
//! proposed move. [`validate_move`] runs them in a fixed order and stops at
//! the first failure. Nothing here mutates state.

use super::model::{Session, SessionStatus};
use crate::error::{ArenaError, ArenaErrorKind};
use crate::ids::{AccountId, SessionId};
use gomoku_board::Seat;
use tracing::{instrument, warn};

/// A proposed move, before validation.
#[derive(Debug, Clone, Copy)]
pub struct MoveAttempt<'a> {
    /// Account submitting the move.
    pub actor: &'a AccountId,
    /// Target row.
    pub row: i32,
    /// Target column.
    pub col: i32,
}

/// A named check that must pass before a move reaches the board.
pub trait Precondition {
    /// Returns an error if the precondition fails.
    fn check(session: &Session, attempt: &MoveAttempt<'_>) -> Result<(), ArenaError>;
}

/// Precondition: the session is being played.
pub struct SessionIsPlayable;

impl Precondition for SessionIsPlayable {
    fn check(session: &Session, _attempt: &MoveAttempt<'_>) -> Result<(), ArenaError> {
        if *session.status() == SessionStatus::Playing {
            Ok(())
        } else {
            Err(ArenaErrorKind::SessionNotPlayable(*session.id()).into())
        }
    }
}

/// Precondition: the actor holds one of the two seats.
pub struct ActorIsParticipant;

impl Precondition for ActorIsParticipant {
    fn check(session: &Session, attempt: &MoveAttempt<'_>) -> Result<(), ArenaError> {
        match session.seat_of(attempt.actor) {
            Some(_) => Ok(()),
            None => Err(ArenaErrorKind::NotAParticipant(attempt.actor.clone()).into()),
        }
    }
}

/// Precondition: the actor's seat is the one to move.
pub struct ActorHoldsTurn;

impl Precondition for ActorHoldsTurn {
    fn check(session: &Session, attempt: &MoveAttempt<'_>) -> Result<(), ArenaError> {
        if session.seat_of(attempt.actor) == Some(*session.current_turn()) {
            Ok(())
        } else {
            Err(ArenaErrorKind::NotYourTurn.into())
        }
    }
}

/// Precondition: the target lies on the board.
pub struct CellInBounds;

impl Precondition for CellInBounds {
    fn check(session: &Session, attempt: &MoveAttempt<'_>) -> Result<(), ArenaError> {
        if session.board().is_in_bounds(attempt.row, attempt.col) {
            Ok(())
        } else {
            Err(ArenaErrorKind::OutOfBounds {
                row: attempt.row,
                col: attempt.col,
            }
            .into())
        }
    }
}

/// Precondition: the target holds no stone.
pub struct CellIsEmpty;

impl Precondition for CellIsEmpty {
    fn check(session: &Session, attempt: &MoveAttempt<'_>) -> Result<(), ArenaError> {
        if session.board().is_empty(attempt.row, attempt.col) {
            Ok(())
        } else {
            Err(ArenaErrorKind::CellOccupied {
                row: attempt.row,
                col: attempt.col,
            }
            .into())
        }
    }
}

/// Decides whether `attempt` is legal on `session`, returning the mover's
/// seat.
///
/// Checks, in order: the session exists, is playing, the actor is seated,
/// it is their turn, the cell is on the board, the cell is empty.
#[instrument(skip(session, attempt), fields(actor = %attempt.actor, row = attempt.row, col = attempt.col))]
pub fn validate_move(
    session_id: SessionId,
    session: Option<&Session>,
    attempt: &MoveAttempt<'_>,
) -> Result<Seat, ArenaError> {
    let session = session.ok_or_else(|| ArenaError::new(ArenaErrorKind::SessionNotFound(session_id)))?;

    let checks: [fn(&Session, &MoveAttempt<'_>) -> Result<(), ArenaError>; 5] = [
        SessionIsPlayable::check,
        ActorIsParticipant::check,
        ActorHoldsTurn::check,
        CellInBounds::check,
        CellIsEmpty::check,
    ];
    for check in checks {
        if let Err(err) = check(session, attempt) {
            warn!(session_id = %session_id, error = %err.kind, "Move rejected");
            return Err(err);
        }
    }

    // ActorHoldsTurn passed, so the actor sits in the seat to move.
    Ok(*session.current_turn())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn playing() -> Session {
        let mut session = Session::open(
            SessionId::generate(),
            AccountId::from("alice"),
            10,
            15,
            5,
            Utc::now(),
        );
        session.seat_second_player(AccountId::from("bob"), Utc::now());
        session
    }

    fn attempt(actor: &AccountId, row: i32, col: i32) -> MoveAttempt<'_> {
        MoveAttempt { actor, row, col }
    }

    #[test]
    fn test_missing_session() {
        let alice = AccountId::from("alice");
        let err = validate_move(SessionId::generate(), None, &attempt(&alice, 0, 0)).unwrap_err();
        assert!(matches!(err.kind, ArenaErrorKind::SessionNotFound(_)));
    }

    #[test]
    fn test_waiting_session_not_playable() {
        let session = Session::open(
            SessionId::generate(),
            AccountId::from("alice"),
            10,
            15,
            5,
            Utc::now(),
        );
        let alice = AccountId::from("alice");
        let err = validate_move(*session.id(), Some(&session), &attempt(&alice, 0, 0)).unwrap_err();
        assert!(matches!(err.kind, ArenaErrorKind::SessionNotPlayable(_)));
    }

    #[test]
    fn test_stranger_rejected_before_turn_check() {
        let session = playing();
        let carol = AccountId::from("carol");
        let err = validate_move(*session.id(), Some(&session), &attempt(&carol, 99, 99)).unwrap_err();
        assert!(matches!(err.kind, ArenaErrorKind::NotAParticipant(_)));
    }

    #[test]
    fn test_wrong_turn_rejected_before_bounds() {
        let session = playing();
        let bob = AccountId::from("bob");
        let err = validate_move(*session.id(), Some(&session), &attempt(&bob, -1, 0)).unwrap_err();
        assert_eq!(err.kind, ArenaErrorKind::NotYourTurn);
    }

    #[test]
    fn test_out_of_bounds_then_occupied() {
        let mut session = playing();
        let alice = AccountId::from("alice");
        let err = validate_move(*session.id(), Some(&session), &attempt(&alice, 15, 0)).unwrap_err();
        assert_eq!(err.kind, ArenaErrorKind::OutOfBounds { row: 15, col: 0 });

        session.place_stone(Seat::Player1, alice.clone(), 4, 4, Utc::now()).unwrap();
        let bob = AccountId::from("bob");
        let err = validate_move(*session.id(), Some(&session), &attempt(&bob, 4, 4)).unwrap_err();
        assert_eq!(err.kind, ArenaErrorKind::CellOccupied { row: 4, col: 4 });
    }

    #[test]
    fn test_legal_move_returns_seat() {
        let mut session = playing();
        let alice = AccountId::from("alice");
        assert_eq!(
            validate_move(*session.id(), Some(&session), &attempt(&alice, 7, 7)).unwrap(),
            Seat::Player1
        );
        session.place_stone(Seat::Player1, alice, 7, 7, Utc::now()).unwrap();
        let bob = AccountId::from("bob");
        assert_eq!(
            validate_move(*session.id(), Some(&session), &attempt(&bob, 7, 8)).unwrap(),
            Seat::Player2
        );
    }
}

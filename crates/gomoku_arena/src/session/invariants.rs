//! Session invariants, checked in debug builds after every committed
//! transition.

use super::model::{Session, SessionStatus};
use gomoku_board::{Invariant, StoneBalanceInvariant};

/// Invariant: the two seats are held by different accounts.
pub struct DistinctSeatsInvariant;

impl Invariant<Session> for DistinctSeatsInvariant {
    fn holds(session: &Session) -> bool {
        session.player2_id().as_ref() != Some(session.player1_id())
    }

    fn description() -> &'static str {
        "Player1 and player2 are different accounts"
    }
}

/// Invariant: player1 has as many stones as player2, or one more.
pub struct SessionStoneBalanceInvariant;

impl Invariant<Session> for SessionStoneBalanceInvariant {
    fn holds(session: &Session) -> bool {
        StoneBalanceInvariant::holds(session.board())
    }

    fn description() -> &'static str {
        StoneBalanceInvariant::description()
    }
}

/// Invariant: a playing session has both seats filled.
pub struct PlayingHasBothSeatsInvariant;

impl Invariant<Session> for PlayingHasBothSeatsInvariant {
    fn holds(session: &Session) -> bool {
        *session.status() != SessionStatus::Playing || session.player2_id().is_some()
    }

    fn description() -> &'static str {
        "Playing sessions have both seats filled"
    }
}

/// Invariant: result is set exactly when the session is terminal.
pub struct TerminalHasResultInvariant;

impl Invariant<Session> for TerminalHasResultInvariant {
    fn holds(session: &Session) -> bool {
        session.status().is_terminal() == session.result().is_some()
    }

    fn description() -> &'static str {
        "Result is set iff the session is finished or cancelled"
    }
}

/// Invariant: a waiting session has an empty board.
pub struct WaitingBoardEmptyInvariant;

impl Invariant<Session> for WaitingBoardEmptyInvariant {
    fn holds(session: &Session) -> bool {
        *session.status() != SessionStatus::Waiting || session.board().stones() == 0
    }

    fn description() -> &'static str {
        "Waiting sessions have an empty board"
    }
}

/// Invariant: one logged move per stone on the board.
pub struct LogMatchesBoardInvariant;

impl Invariant<Session> for LogMatchesBoardInvariant {
    fn holds(session: &Session) -> bool {
        session.moves().len() == session.board().stones()
    }

    fn description() -> &'static str {
        "Move log length equals stones on the board"
    }
}

/// All session invariants as a composable set.
pub type SessionInvariants = (
    DistinctSeatsInvariant,
    SessionStoneBalanceInvariant,
    PlayingHasBothSeatsInvariant,
    TerminalHasResultInvariant,
    WaitingBoardEmptyInvariant,
    LogMatchesBoardInvariant,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{AccountId, SessionId};
    use chrono::Utc;
    use gomoku_board::{InvariantSet, Seat};

    #[test]
    fn test_invariants_hold_through_lifecycle() {
        let mut session = Session::open(
            SessionId::generate(),
            AccountId::from("alice"),
            20,
            15,
            5,
            Utc::now(),
        );
        assert!(SessionInvariants::check_all(&session).is_ok());

        session.seat_second_player(AccountId::from("bob"), Utc::now());
        assert!(SessionInvariants::check_all(&session).is_ok());

        session
            .place_stone(Seat::Player1, AccountId::from("alice"), 0, 0, Utc::now())
            .unwrap();
        assert!(SessionInvariants::check_all(&session).is_ok());
    }

    #[test]
    fn test_self_seat_is_detected() {
        let mut session = Session::open(
            SessionId::generate(),
            AccountId::from("alice"),
            20,
            15,
            5,
            Utc::now(),
        );
        session.seat_second_player(AccountId::from("alice"), Utc::now());
        let violations = SessionInvariants::check_all(&session).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].description, DistinctSeatsInvariant::description());
    }

    #[test]
    fn test_cancelled_session_has_result() {
        let mut session = Session::open(
            SessionId::generate(),
            AccountId::from("alice"),
            20,
            15,
            5,
            Utc::now(),
        );
        session.cancel(Utc::now());
        assert!(TerminalHasResultInvariant::holds(&session));
        assert!(SessionInvariants::check_all(&session).is_ok());
    }
}

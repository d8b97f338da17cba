//! Rebuilding a session from its persisted move log.
//!
//! The move log is authoritative: the board and the turn are recomputed by
//! replaying every logged move in order. Differences from the persisted
//! board are reported, not trusted.

use super::model::{MoveOutcome, Session, SessionStatus};
use crate::error::{ArenaError, ArenaErrorKind};
use crate::store::StoredSession;
use gomoku_board::{Board, Seat};
use tracing::{instrument, warn};

/// A session rebuilt from storage, with what the replay found.
#[derive(Debug, Clone)]
pub struct Replay {
    /// The rebuilt session.
    pub session: Session,
    /// The persisted board disagreed with the move log.
    pub board_repaired: bool,
    /// The log ends in a win or draw but the session is still playing, so
    /// settlement may never have happened.
    pub unsettled: bool,
}

fn corrupt(stored: &StoredSession, reason: impl std::fmt::Display) -> ArenaError {
    ArenaError::new(ArenaErrorKind::CorruptRecord(format!("session {}: {}", stored.id, reason)))
}

impl Replay {
    /// Replays `stored.moves` onto an empty board.
    ///
    /// # Errors
    ///
    /// [`ArenaErrorKind::CorruptRecord`] when the log breaks turn order,
    /// repeats a cell, continues past a terminal move, or contradicts the
    /// persisted status.
    #[instrument(skip(stored), fields(session_id = %stored.id, moves = stored.moves.len()))]
    pub fn run(stored: StoredSession) -> Result<Self, ArenaError> {
        if stored.player2_id.as_ref() == Some(&stored.player1_id) {
            return Err(corrupt(&stored, "both seats held by one account"));
        }
        if stored.board.size() != stored.board_size {
            return Err(corrupt(&stored, "board size mismatch"));
        }
        if matches!(stored.status, SessionStatus::Playing | SessionStatus::Finished)
            && stored.player2_id.is_none()
        {
            let reason = format!("{} without a second player", stored.status.as_ref());
            return Err(corrupt(&stored, reason));
        }

        let mut board = Board::new(stored.board_size);
        let mut turn = Seat::Player1;
        let mut outcome = MoveOutcome::Continues;

        for (index, mv) in stored.moves.iter().enumerate() {
            if outcome.is_terminal() {
                return Err(corrupt(&stored, "moves logged after the session ended"));
            }
            if *mv.seq() as usize != index {
                return Err(corrupt(&stored, format!("move {index} has sequence {}", mv.seq())));
            }
            if *mv.actor() != turn {
                return Err(corrupt(&stored, format!("move {index} played out of turn")));
            }
            board
                .place(*mv.row(), *mv.col(), turn)
                .map_err(|e| corrupt(&stored, e))?;

            outcome = if board.check_win(*mv.row(), *mv.col(), turn, stored.win_condition) {
                MoveOutcome::Won(turn)
            } else if board.is_full() {
                MoveOutcome::Drawn
            } else {
                MoveOutcome::Continues
            };
            turn = turn.opponent();
        }

        let status = stored.status;
        match (status, outcome) {
            (SessionStatus::Finished, MoveOutcome::Continues) => {
                return Err(corrupt(&stored, "finished without a terminal move"));
            }
            (SessionStatus::Waiting | SessionStatus::Cancelled, _) if !stored.moves.is_empty() => {
                return Err(corrupt(&stored, "moves logged before play started"));
            }
            _ => {}
        }

        let board_repaired = board != stored.board;
        let unsettled = status == SessionStatus::Playing && outcome.is_terminal();
        if board_repaired {
            warn!("Persisted board differs from move log; using replayed board");
        }
        if unsettled {
            warn!(outcome = ?outcome, "Move log ends the session but it is still playing");
        }

        let current_turn = if status == SessionStatus::Playing || status == SessionStatus::Finished {
            turn
        } else {
            Seat::Player1
        };

        let session = Session::from_parts(
            stored.id,
            stored.stake,
            status,
            stored.result,
            stored.winner_id,
            stored.win_condition,
            stored.player1_id,
            stored.player2_id,
            current_turn,
            board,
            stored.moves,
            stored.created_at,
            stored.updated_at,
        );

        Ok(Self {
            session,
            board_repaired,
            unsettled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{AccountId, SessionId};
    use crate::session::MoveRecord;
    use chrono::Utc;
    use uuid::Uuid;

    fn stored_with(moves: &[(i32, i32)]) -> StoredSession {
        let id = SessionId::generate();
        let now = Utc::now();
        let mut board = Board::new(15);
        let mut seat = Seat::Player1;
        let mut records = Vec::new();
        for (seq, &(row, col)) in moves.iter().enumerate() {
            board.place(row, col, seat).unwrap();
            let user = AccountId::from(if seat == Seat::Player1 { "alice" } else { "bob" });
            records.push(MoveRecord::new(Uuid::new_v4(), id, user, seq as u32, row, col, seat, now));
            seat = seat.opponent();
        }
        StoredSession {
            id,
            stake: 10,
            status: SessionStatus::Playing,
            result: None,
            winner_id: None,
            board_size: 15,
            win_condition: 5,
            player1_id: AccountId::from("alice"),
            player2_id: Some(AccountId::from("bob")),
            current_turn: seat,
            board,
            moves: records,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_replay_matches_clean_record() {
        let replay = Replay::run(stored_with(&[(7, 7), (0, 0), (7, 8)])).unwrap();
        assert!(!replay.board_repaired);
        assert!(!replay.unsettled);
        assert_eq!(*replay.session.current_turn(), Seat::Player2);
        assert_eq!(replay.session.board().stones(), 3);
    }

    #[test]
    fn test_replay_repairs_stale_board() {
        let mut stored = stored_with(&[(7, 7), (0, 0)]);
        stored.board = Board::new(15);
        let replay = Replay::run(stored).unwrap();
        assert!(replay.board_repaired);
        assert_eq!(replay.session.board().stones(), 2);
    }

    #[test]
    fn test_replay_flags_unsettled_win() {
        let stored = stored_with(&[
            (7, 0),
            (0, 0),
            (7, 1),
            (0, 1),
            (7, 2),
            (0, 2),
            (7, 3),
            (0, 3),
            (7, 4),
        ]);
        let replay = Replay::run(stored).unwrap();
        assert!(replay.unsettled);
        assert_eq!(*replay.session.status(), SessionStatus::Playing);
        assert_eq!(*replay.session.current_turn(), Seat::Player2);
    }

    #[test]
    fn test_replay_rejects_playing_without_second_player() {
        let mut stored = stored_with(&[(7, 7)]);
        stored.player2_id = None;
        let err = Replay::run(stored).unwrap_err();
        assert!(matches!(err.kind, ArenaErrorKind::CorruptRecord(_)));

        let mut finished = stored_with(&[]);
        finished.status = SessionStatus::Finished;
        finished.player2_id = None;
        let err = Replay::run(finished).unwrap_err();
        assert!(matches!(err.kind, ArenaErrorKind::CorruptRecord(_)));
    }

    #[test]
    fn test_replay_rejects_out_of_turn_log() {
        let mut stored = stored_with(&[(7, 7), (0, 0)]);
        let first = stored.moves[0].clone();
        stored.moves[1] = MoveRecord::new(
            Uuid::new_v4(),
            stored.id,
            AccountId::from("alice"),
            1,
            3,
            3,
            *first.actor(),
            Utc::now(),
        );
        let err = Replay::run(stored).unwrap_err();
        assert!(matches!(err.kind, ArenaErrorKind::CorruptRecord(_)));
    }
}

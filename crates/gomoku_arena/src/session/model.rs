//! Session data model and its state transitions.
//!
//! A [`Session`] moves forward through `Waiting → Playing → Finished` or
//! `Waiting → Cancelled` and never regresses. The transitions here are pure
//! state changes; preconditions, ledger settlement and event dispatch are
//! the engine's job.

use crate::ids::{AccountId, SessionId};
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use derive_new::new;
use gomoku_board::{Board, BoardError, Seat};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

/// Lifecycle status of a session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::AsRefStr, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SessionStatus {
    /// One seat filled, waiting for an opponent.
    Waiting,
    /// Both seats filled, moves accepted.
    Playing,
    /// A win or draw was reached.
    Finished,
    /// Abandoned before an opponent joined.
    Cancelled,
}

impl SessionStatus {
    /// True for `Finished` and `Cancelled`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Cancelled)
    }
}

/// Final result of a session; set exactly once.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::AsRefStr, strum::EnumString,
)]
pub enum SessionResult {
    /// Player1 completed a run.
    #[serde(rename = "player1_win")]
    #[strum(serialize = "player1_win")]
    Player1Win,
    /// Player2 completed a run.
    #[serde(rename = "player2_win")]
    #[strum(serialize = "player2_win")]
    Player2Win,
    /// Board filled with no run.
    #[serde(rename = "draw")]
    #[strum(serialize = "draw")]
    Draw,
    /// Session cancelled before play.
    #[serde(rename = "cancelled")]
    #[strum(serialize = "cancelled")]
    Cancelled,
}

impl SessionResult {
    /// The win result for `seat`.
    pub fn win_for(seat: Seat) -> Self {
        match seat {
            Seat::Player1 => Self::Player1Win,
            Seat::Player2 => Self::Player2Win,
        }
    }
}

/// What an accepted move did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// No terminal condition; the other seat moves next.
    Continues,
    /// The mover completed a run.
    Won(Seat),
    /// The board is full without a run.
    Drawn,
}

impl MoveOutcome {
    /// True if the move ended the session.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Continues)
    }
}

/// Append-only log entry for one accepted move.
///
/// Refers back to its session by id only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct MoveRecord {
    id: Uuid,
    session_id: SessionId,
    user_id: AccountId,
    seq: u32,
    row: i32,
    col: i32,
    actor: Seat,
    created_at: DateTime<Utc>,
}

/// One match: stake, seats, board, move log and lifecycle.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct Session {
    id: SessionId,
    stake: i64,
    status: SessionStatus,
    result: Option<SessionResult>,
    winner_id: Option<AccountId>,
    win_condition: usize,
    player1_id: AccountId,
    player2_id: Option<AccountId>,
    current_turn: Seat,
    board: Board,
    moves: Vec<MoveRecord>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Session {
    /// Opens a waiting session with an empty board and player1 to move.
    #[instrument(skip(now))]
    pub(crate) fn open(
        id: SessionId,
        creator: AccountId,
        stake: i64,
        board_size: usize,
        win_condition: usize,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            stake,
            status: SessionStatus::Waiting,
            result: None,
            winner_id: None,
            win_condition,
            player1_id: creator,
            player2_id: None,
            current_turn: Seat::Player1,
            board: Board::new(board_size),
            moves: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Reassembles a session from already-checked parts.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        id: SessionId,
        stake: i64,
        status: SessionStatus,
        result: Option<SessionResult>,
        winner_id: Option<AccountId>,
        win_condition: usize,
        player1_id: AccountId,
        player2_id: Option<AccountId>,
        current_turn: Seat,
        board: Board,
        moves: Vec<MoveRecord>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            stake,
            status,
            result,
            winner_id,
            win_condition,
            player1_id,
            player2_id,
            current_turn,
            board,
            moves,
            created_at,
            updated_at,
        }
    }

    /// Side length of the board.
    pub fn board_size(&self) -> usize {
        self.board.size()
    }

    /// Seat held by `account`, if any.
    pub fn seat_of(&self, account: &AccountId) -> Option<Seat> {
        if &self.player1_id == account {
            Some(Seat::Player1)
        } else if self.player2_id.as_ref() == Some(account) {
            Some(Seat::Player2)
        } else {
            None
        }
    }

    /// Account holding `seat`, if filled.
    pub fn account_in(&self, seat: Seat) -> Option<&AccountId> {
        match seat {
            Seat::Player1 => Some(&self.player1_id),
            Seat::Player2 => self.player2_id.as_ref(),
        }
    }

    /// Fills seat two and starts play with player1 to move.
    #[instrument(skip(self, now), fields(session_id = %self.id))]
    pub(crate) fn seat_second_player(&mut self, joiner: AccountId, now: DateTime<Utc>) {
        debug!(joiner = %joiner, "Seating second player");
        self.player2_id = Some(joiner);
        self.status = SessionStatus::Playing;
        self.current_turn = Seat::Player1;
        self.updated_at = now;
    }

    /// Places a stone for `seat`, logs the move and evaluates terminal
    /// conditions: a completed run first, then a full board.
    ///
    /// The turn passes to the other seat before the terminal checks, so a
    /// finished session points at the seat that would have moved next.
    ///
    /// # Errors
    ///
    /// Propagates [`BoardError`] with the session unchanged.
    #[instrument(skip(self, user, now), fields(session_id = %self.id))]
    pub(crate) fn place_stone(
        &mut self,
        seat: Seat,
        user: AccountId,
        row: i32,
        col: i32,
        now: DateTime<Utc>,
    ) -> Result<MoveOutcome, BoardError> {
        self.board.place(row, col, seat)?;

        let seq = self.moves.len() as u32;
        self.moves
            .push(MoveRecord::new(Uuid::new_v4(), self.id, user.clone(), seq, row, col, seat, now));
        self.updated_at = now;
        self.current_turn = seat.opponent();

        let outcome = if self.board.check_win(row, col, seat, self.win_condition) {
            self.status = SessionStatus::Finished;
            self.result = Some(SessionResult::win_for(seat));
            self.winner_id = Some(user);
            MoveOutcome::Won(seat)
        } else if self.board.is_full() {
            self.status = SessionStatus::Finished;
            self.result = Some(SessionResult::Draw);
            MoveOutcome::Drawn
        } else {
            MoveOutcome::Continues
        };

        debug!(row, col, seat = %seat, outcome = ?outcome, "Stone placed");
        Ok(outcome)
    }

    /// Marks the session cancelled.
    #[instrument(skip(self, now), fields(session_id = %self.id))]
    pub(crate) fn cancel(&mut self, now: DateTime<Utc>) {
        self.status = SessionStatus::Cancelled;
        self.result = Some(SessionResult::Cancelled);
        self.updated_at = now;
    }

    /// Full snapshot, the shape returned by queries and carried by events.
    pub fn view(&self) -> SessionView {
        SessionView {
            id: self.id,
            stake: self.stake,
            status: self.status,
            result: self.result,
            winner_id: self.winner_id.clone(),
            board_size: self.board.size(),
            win_condition: self.win_condition,
            player1_id: self.player1_id.clone(),
            player2_id: self.player2_id.clone(),
            current_turn: self.current_turn,
            board: self.board.clone(),
            moves: self.moves.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Serializable snapshot of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    /// Session id.
    pub id: SessionId,
    /// Stake escrowed per seat.
    pub stake: i64,
    /// Lifecycle status.
    pub status: SessionStatus,
    /// Final result, once terminal.
    pub result: Option<SessionResult>,
    /// Winning account, for wins only.
    pub winner_id: Option<AccountId>,
    /// Board side length.
    pub board_size: usize,
    /// Run length needed to win.
    pub win_condition: usize,
    /// Creator.
    pub player1_id: AccountId,
    /// Joiner, once seated.
    pub player2_id: Option<AccountId>,
    /// Seat to move.
    pub current_turn: Seat,
    /// Rows of cell codes.
    pub board: Board,
    /// Accepted moves in order.
    pub moves: Vec<MoveRecord>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last transition time.
    pub updated_at: DateTime<Utc>,
}

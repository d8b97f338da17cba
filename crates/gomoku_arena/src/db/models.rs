//! Row types and their conversion to domain values.

use chrono::{DateTime, NaiveDateTime, Utc};
use derive_getters::Getters;
use diesel::prelude::*;
use gomoku_board::{Board, Seat};
use std::str::FromStr;
use tracing::instrument;
use uuid::Uuid;

use crate::db::schema;
use crate::ids::{AccountId, SessionId};
use crate::ledger::Account;
use crate::session::{MoveRecord, Session, SessionResult, SessionStatus};
use crate::store::{StoreError, StoredSession};

/// Account row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, Getters)]
#[diesel(table_name = schema::accounts)]
pub struct AccountRow {
    id: String,
    username: Option<String>,
    balance: i64,
    xp: i64,
    wins: i64,
    losses: i64,
    draws: i64,
    created_at: NaiveDateTime,
}

impl AccountRow {
    /// Row for a freshly opened account.
    pub fn opened(account: &AccountId, username: Option<String>, balance: i64) -> Self {
        Self {
            id: account.as_str().to_string(),
            username,
            balance,
            xp: 0,
            wins: 0,
            losses: 0,
            draws: 0,
            created_at: Utc::now().naive_utc(),
        }
    }
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Account::new(
            AccountId::from(row.id),
            row.username,
            row.balance,
            row.xp,
            row.wins,
            row.losses,
            row.draws,
        )
    }
}

/// Session row; the board is a JSON array of rows.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, Getters)]
#[diesel(table_name = schema::sessions)]
pub struct SessionRow {
    id: String,
    stake: i64,
    status: String,
    result: Option<String>,
    winner_id: Option<String>,
    board_size: i32,
    win_condition: i32,
    player1_id: String,
    player2_id: Option<String>,
    current_turn: String,
    board: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

/// Move row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, Getters)]
#[diesel(table_name = schema::moves)]
pub struct MoveRow {
    id: String,
    session_id: String,
    user_id: String,
    seq: i32,
    row_index: i32,
    col_index: i32,
    actor: String,
    created_at: NaiveDateTime,
}

#[track_caller]
fn to_i32(value: usize, field: &str) -> Result<i32, StoreError> {
    i32::try_from(value).map_err(|_| StoreError::new(format!("{field} {value} does not fit the column")))
}

#[track_caller]
fn to_usize(value: i32, field: &str) -> Result<usize, StoreError> {
    usize::try_from(value).map_err(|_| StoreError::new(format!("Negative {field}: {value}")))
}

#[track_caller]
fn parse<T: FromStr>(value: &str, field: &str) -> Result<T, StoreError> {
    value
        .parse()
        .map_err(|_| StoreError::new(format!("Invalid {field}: '{value}'")))
}

fn utc(naive: NaiveDateTime) -> DateTime<Utc> {
    naive.and_utc()
}

impl SessionRow {
    /// Encodes a session for storage.
    #[instrument(skip(session), fields(session_id = %session.id()))]
    pub fn encode(session: &Session) -> Result<Self, StoreError> {
        Ok(Self {
            id: session.id().to_string(),
            stake: *session.stake(),
            status: session.status().as_ref().to_string(),
            result: session.result().as_ref().map(|r| r.as_ref().to_string()),
            winner_id: session.winner_id().as_ref().map(|w| w.as_str().to_string()),
            board_size: to_i32(session.board_size(), "board_size")?,
            win_condition: to_i32(*session.win_condition(), "win_condition")?,
            player1_id: session.player1_id().as_str().to_string(),
            player2_id: session.player2_id().as_ref().map(|p| p.as_str().to_string()),
            current_turn: session.current_turn().as_ref().to_string(),
            board: serde_json::to_string(session.board())?,
            created_at: session.created_at().naive_utc(),
            updated_at: session.updated_at().naive_utc(),
        })
    }

    /// Decodes a row and its ordered move rows.
    #[instrument(skip(self, moves), fields(session_id = %self.id, moves = moves.len()))]
    pub fn decode(self, moves: Vec<MoveRow>) -> Result<StoredSession, StoreError> {
        let board: Board = serde_json::from_str(&self.board)?;
        Ok(StoredSession {
            id: parse(&self.id, "session id")?,
            stake: self.stake,
            status: parse::<SessionStatus>(&self.status, "status")?,
            result: self
                .result
                .as_deref()
                .map(|r| parse::<SessionResult>(r, "result"))
                .transpose()?,
            winner_id: self.winner_id.map(AccountId::from),
            board_size: to_usize(self.board_size, "board_size")?,
            win_condition: to_usize(self.win_condition, "win_condition")?,
            player1_id: AccountId::from(self.player1_id),
            player2_id: self.player2_id.map(AccountId::from),
            current_turn: parse::<Seat>(&self.current_turn, "current_turn")?,
            board,
            moves: moves
                .into_iter()
                .map(MoveRow::decode)
                .collect::<Result<_, _>>()?,
            created_at: utc(self.created_at),
            updated_at: utc(self.updated_at),
        })
    }
}

impl MoveRow {
    /// Encodes a logged move.
    pub fn encode(record: &MoveRecord) -> Result<Self, StoreError> {
        Ok(Self {
            id: record.id().to_string(),
            session_id: record.session_id().to_string(),
            user_id: record.user_id().as_str().to_string(),
            seq: i32::try_from(*record.seq())
                .map_err(|_| StoreError::new(format!("Move sequence {} too large", record.seq())))?,
            row_index: *record.row(),
            col_index: *record.col(),
            actor: record.actor().as_ref().to_string(),
            created_at: record.created_at().naive_utc(),
        })
    }

    /// Decodes a stored move.
    pub fn decode(self) -> Result<MoveRecord, StoreError> {
        let seq = u32::try_from(self.seq).map_err(|_| StoreError::new(format!("Negative move sequence {}", self.seq)))?;
        Ok(MoveRecord::new(
            parse::<Uuid>(&self.id, "move id")?,
            parse::<SessionId>(&self.session_id, "session id")?,
            AccountId::from(self.user_id),
            seq,
            self.row_index,
            self.col_index,
            parse::<Seat>(&self.actor, "actor")?,
            utc(self.created_at),
        ))
    }
}

//! SQLite repository backing both the ledger and the session store.

use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

use crate::db::models::{AccountRow, MoveRow, SessionRow};
use crate::db::schema;
use crate::error::{ArenaError, ArenaErrorKind};
use crate::ids::AccountId;
use crate::ledger::{Account, GameOutcome, LedgerGateway, Standing};
use crate::session::Session;
use crate::settlement::Settlement;
use crate::store::{SessionStore, StoreError, StoredSession};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Database repository for accounts and sessions.
///
/// A connection is opened per call, so the repository is cheap to clone
/// and share.
#[derive(Debug, Clone)]
pub struct Repository {
    db_path: String,
}

fn not_found(account: &AccountId) -> ArenaError {
    ArenaError::new(ArenaErrorKind::AccountNotFound(account.clone()))
}

impl Repository {
    /// Creates a repository for the database at `db_path`.
    ///
    /// Every call opens its own connection, so `":memory:"` would give each
    /// call a fresh empty database; use a file.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn new(db_path: String) -> Self {
        info!(path = %db_path, "Creating Repository");
        Self { db_path }
    }

    /// Establishes a database connection.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, StoreError> {
        debug!(path = %self.db_path, "Establishing connection");
        SqliteConnection::establish(&self.db_path)
            .map_err(|e| StoreError::new(format!("Failed to connect to '{}': {}", self.db_path, e)))
    }

    /// Applies pending schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if a migration fails.
    #[instrument(skip(self))]
    pub fn run_migrations(&self) -> Result<(), StoreError> {
        let mut conn = self.connection()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| StoreError::new(format!("Migration failed: {}", e)))?;
        info!(applied = applied.len(), "Migrations applied");
        Ok(())
    }

    fn balance_on(conn: &mut SqliteConnection, account: &AccountId) -> Result<Option<i64>, ArenaError> {
        use schema::accounts::dsl;
        Ok(dsl::accounts
            .filter(dsl::id.eq(account.as_str()))
            .select(dsl::balance)
            .first::<i64>(conn)
            .optional()?)
    }

    fn credit_on(conn: &mut SqliteConnection, account: &AccountId, amount: i64) -> Result<i64, ArenaError> {
        use schema::accounts::dsl;
        let updated = diesel::update(dsl::accounts.filter(dsl::id.eq(account.as_str())))
            .set(dsl::balance.eq(dsl::balance + amount))
            .execute(conn)?;
        if updated == 0 {
            return Err(not_found(account));
        }
        let balance = Self::balance_on(conn, account)?.ok_or_else(|| not_found(account))?;
        debug!(account = %account, balance, "Credited");
        Ok(balance)
    }

    fn record_on(
        conn: &mut SqliteConnection,
        account: &AccountId,
        outcome: GameOutcome,
        xp: i64,
    ) -> Result<(), ArenaError> {
        use schema::accounts::dsl;
        let target = dsl::accounts.filter(dsl::id.eq(account.as_str()));
        let updated = match outcome {
            GameOutcome::Win => diesel::update(target)
                .set((dsl::xp.eq(dsl::xp + xp), dsl::wins.eq(dsl::wins + 1)))
                .execute(conn)?,
            GameOutcome::Loss => diesel::update(target)
                .set((dsl::xp.eq(dsl::xp + xp), dsl::losses.eq(dsl::losses + 1)))
                .execute(conn)?,
            GameOutcome::Draw => diesel::update(target)
                .set((dsl::xp.eq(dsl::xp + xp), dsl::draws.eq(dsl::draws + 1)))
                .execute(conn)?,
        };
        if updated == 0 {
            return Err(not_found(account));
        }
        debug!(account = %account, outcome = outcome.as_ref(), xp, "Outcome recorded");
        Ok(())
    }
}

impl LedgerGateway for Repository {
    #[instrument(skip(self))]
    fn balance(&self, account: &AccountId) -> Result<i64, ArenaError> {
        let mut conn = self.connection()?;
        Self::balance_on(&mut conn, account)?.ok_or_else(|| not_found(account))
    }

    #[instrument(skip(self))]
    fn set_balance(&self, account: &AccountId, balance: i64) -> Result<(), ArenaError> {
        use schema::accounts::dsl;
        let mut conn = self.connection()?;
        let updated = diesel::update(dsl::accounts.filter(dsl::id.eq(account.as_str())))
            .set(dsl::balance.eq(balance))
            .execute(&mut conn)?;
        if updated == 0 {
            return Err(not_found(account));
        }
        Ok(())
    }

    /// One conditional update: the row changes only if it covers `amount`.
    #[instrument(skip(self))]
    fn debit(&self, account: &AccountId, amount: i64) -> Result<i64, ArenaError> {
        use schema::accounts::dsl;
        let mut conn = self.connection()?;
        conn.transaction::<_, ArenaError, _>(|conn| {
            let updated = diesel::update(
                dsl::accounts
                    .filter(dsl::id.eq(account.as_str()))
                    .filter(dsl::balance.ge(amount)),
            )
            .set(dsl::balance.eq(dsl::balance - amount))
            .execute(conn)?;

            let balance = Self::balance_on(conn, account)?.ok_or_else(|| not_found(account))?;
            if updated == 0 {
                warn!(available = balance, required = amount, "Debit refused");
                return Err(ArenaError::new(ArenaErrorKind::InsufficientBalance {
                    required: amount,
                    available: balance,
                }));
            }
            debug!(balance, "Debited");
            Ok(balance)
        })
    }

    #[instrument(skip(self))]
    fn credit(&self, account: &AccountId, amount: i64) -> Result<i64, ArenaError> {
        let mut conn = self.connection()?;
        conn.transaction::<_, ArenaError, _>(|conn| Self::credit_on(conn, account, amount))
    }

    #[instrument(skip(self))]
    fn record_outcome(&self, account: &AccountId, outcome: GameOutcome, xp: i64) -> Result<(), ArenaError> {
        let mut conn = self.connection()?;
        Self::record_on(&mut conn, account, outcome, xp)
    }

    /// Every credit and record runs in one transaction; any failure rolls
    /// all of them back.
    #[instrument(skip(self, settlement), fields(payouts = settlement.payouts.len()))]
    fn settle(&self, settlement: &Settlement) -> Result<(), ArenaError> {
        let mut conn = self.connection()?;
        conn.transaction::<_, ArenaError, _>(|conn| {
            for (account, amount) in &settlement.payouts {
                Self::credit_on(conn, account, *amount)?;
            }
            for (account, outcome, xp) in &settlement.records {
                Self::record_on(conn, account, *outcome, *xp)?;
            }
            Ok(())
        })
    }

    #[instrument(skip(self))]
    fn account(&self, account: &AccountId) -> Result<Account, ArenaError> {
        use schema::accounts::dsl;
        let mut conn = self.connection()?;
        dsl::accounts
            .filter(dsl::id.eq(account.as_str()))
            .select(AccountRow::as_select())
            .first::<AccountRow>(&mut conn)
            .optional()?
            .map(Account::from)
            .ok_or_else(|| not_found(account))
    }

    #[instrument(skip(self, username))]
    fn open_account(
        &self,
        account: &AccountId,
        username: Option<String>,
        balance: i64,
    ) -> Result<Account, ArenaError> {
        let mut conn = self.connection()?;
        conn.transaction::<_, ArenaError, _>(|conn| {
            if Self::balance_on(conn, account)?.is_some() {
                warn!("Account already open");
                return Err(ArenaError::new(ArenaErrorKind::AccountExists(account.clone())));
            }
            let row = AccountRow::opened(account, username, balance);
            diesel::insert_into(schema::accounts::table)
                .values(&row)
                .execute(conn)?;
            info!(balance, "Account opened");
            Ok(Account::from(row))
        })
    }

    #[instrument(skip(self))]
    fn standings(&self, limit: usize) -> Result<Vec<Standing>, ArenaError> {
        use schema::accounts::dsl;
        let mut conn = self.connection()?;
        let rows = dsl::accounts
            .order((dsl::xp.desc(), dsl::wins.desc(), dsl::id.asc()))
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .select(AccountRow::as_select())
            .load::<AccountRow>(&mut conn)?;
        debug!(count = rows.len(), "Standings loaded");
        Ok(Standing::rank_all(rows.into_iter().map(Account::from)))
    }
}

impl SessionStore for Repository {
    /// Replaces the session row and appends moves not stored yet, in one
    /// transaction.
    #[instrument(skip(self, session), fields(session_id = %session.id(), moves = session.moves().len()))]
    fn save_session(&self, session: &Session) -> Result<(), StoreError> {
        let row = SessionRow::encode(session)?;
        let moves = session
            .moves()
            .iter()
            .map(MoveRow::encode)
            .collect::<Result<Vec<_>, _>>()?;

        let mut conn = self.connection()?;
        conn.transaction::<_, StoreError, _>(|conn| {
            diesel::replace_into(schema::sessions::table)
                .values(&row)
                .execute(conn)?;
            for mv in &moves {
                diesel::insert_or_ignore_into(schema::moves::table)
                    .values(mv)
                    .execute(conn)?;
            }
            Ok(())
        })?;
        debug!("Session saved");
        Ok(())
    }

    #[instrument(skip(self))]
    fn load_sessions(&self) -> Result<Vec<StoredSession>, StoreError> {
        let mut conn = self.connection()?;
        let rows = schema::sessions::table
            .order(schema::sessions::created_at.asc())
            .select(SessionRow::as_select())
            .load::<SessionRow>(&mut conn)?;
        let move_rows = schema::moves::table
            .order((schema::moves::session_id.asc(), schema::moves::seq.asc()))
            .select(MoveRow::as_select())
            .load::<MoveRow>(&mut conn)?;

        let mut logs: HashMap<String, Vec<MoveRow>> = HashMap::new();
        for mv in move_rows {
            logs.entry(mv.session_id().clone()).or_default().push(mv);
        }

        let sessions = rows
            .into_iter()
            .map(|row| {
                let log = logs.remove(row.id()).unwrap_or_default();
                row.decode(log)
            })
            .collect::<Result<Vec<_>, _>>()?;
        info!(count = sessions.len(), "Sessions loaded");
        Ok(sessions)
    }
}

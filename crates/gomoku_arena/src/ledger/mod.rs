//! Account ledger gateway.
//!
//! The engine reads, debits and credits balances and records match
//! outcomes through [`LedgerGateway`]. Every balance change is one atomic
//! read-modify-write with respect to other changes on the same account, so
//! two sessions settling at once for one account never lose an update. A
//! settlement lands as a unit: a session never finishes half paid.

mod account;
mod memory;
mod outcome;

pub use account::{Account, Standing};
pub use memory::MemoryLedger;
pub use outcome::GameOutcome;

use crate::error::ArenaError;
use crate::ids::AccountId;
use crate::settlement::Settlement;

/// Balance and statistics operations the engine depends on.
///
/// Unknown accounts fail with
/// [`AccountNotFound`](crate::ArenaErrorKind::AccountNotFound) on every
/// operation.
pub trait LedgerGateway: Send + Sync + std::fmt::Debug {
    /// Current balance.
    fn balance(&self, account: &AccountId) -> Result<i64, ArenaError>;

    /// Overwrites the balance.
    fn set_balance(&self, account: &AccountId, balance: i64) -> Result<(), ArenaError>;

    /// Subtracts `amount` if the balance covers it, returning the new
    /// balance.
    ///
    /// # Errors
    ///
    /// [`InsufficientBalance`](crate::ArenaErrorKind::InsufficientBalance)
    /// with the balance untouched when it is below `amount`.
    fn debit(&self, account: &AccountId, amount: i64) -> Result<i64, ArenaError>;

    /// Adds `amount`, returning the new balance.
    fn credit(&self, account: &AccountId, amount: i64) -> Result<i64, ArenaError>;

    /// Adds one win, loss or draw and `xp` experience.
    fn record_outcome(&self, account: &AccountId, outcome: GameOutcome, xp: i64) -> Result<(), ArenaError>;

    /// Applies every credit and outcome record in `settlement`, or none.
    ///
    /// # Errors
    ///
    /// Any failure leaves every balance and statistic as it was.
    fn settle(&self, settlement: &Settlement) -> Result<(), ArenaError>;

    /// Full account view.
    fn account(&self, account: &AccountId) -> Result<Account, ArenaError>;

    /// Opens a new account with an initial balance.
    ///
    /// # Errors
    ///
    /// [`AccountExists`](crate::ArenaErrorKind::AccountExists) if the id is
    /// taken.
    fn open_account(
        &self,
        account: &AccountId,
        username: Option<String>,
        balance: i64,
    ) -> Result<Account, ArenaError>;

    /// Top `limit` accounts by experience, then wins.
    fn standings(&self, limit: usize) -> Result<Vec<Standing>, ArenaError>;
}

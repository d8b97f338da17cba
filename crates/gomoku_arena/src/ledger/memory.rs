//! In-process ledger.

use super::{Account, GameOutcome, LedgerGateway, Standing};
use crate::error::{ArenaError, ArenaErrorKind};
use crate::ids::AccountId;
use crate::settlement::Settlement;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, instrument, warn};

/// Ledger held in memory.
///
/// One mutex guards the account map, so every read-modify-write is atomic
/// with respect to every other ledger operation.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    accounts: Mutex<HashMap<AccountId, Account>>,
}

impl MemoryLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<AccountId, Account>> {
        self.accounts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_account<T>(
        &self,
        account: &AccountId,
        f: impl FnOnce(&mut Account) -> Result<T, ArenaError>,
    ) -> Result<T, ArenaError> {
        let mut accounts = self.lock();
        let entry = accounts
            .get_mut(account)
            .ok_or_else(|| ArenaError::new(ArenaErrorKind::AccountNotFound(account.clone())))?;
        f(entry)
    }
}

impl LedgerGateway for MemoryLedger {
    #[instrument(skip(self))]
    fn balance(&self, account: &AccountId) -> Result<i64, ArenaError> {
        self.with_account(account, |a| Ok(*a.balance()))
    }

    #[instrument(skip(self))]
    fn set_balance(&self, account: &AccountId, balance: i64) -> Result<(), ArenaError> {
        self.with_account(account, |a| {
            a.set_balance(balance);
            Ok(())
        })
    }

    #[instrument(skip(self))]
    fn debit(&self, account: &AccountId, amount: i64) -> Result<i64, ArenaError> {
        self.with_account(account, |a| {
            let available = *a.balance();
            if available < amount {
                warn!(available, required = amount, "Debit refused");
                return Err(ArenaError::new(ArenaErrorKind::InsufficientBalance {
                    required: amount,
                    available,
                }));
            }
            a.set_balance(available - amount);
            debug!(balance = *a.balance(), "Debited");
            Ok(*a.balance())
        })
    }

    #[instrument(skip(self))]
    fn credit(&self, account: &AccountId, amount: i64) -> Result<i64, ArenaError> {
        self.with_account(account, |a| {
            a.set_balance(*a.balance() + amount);
            debug!(balance = *a.balance(), "Credited");
            Ok(*a.balance())
        })
    }

    #[instrument(skip(self))]
    fn record_outcome(&self, account: &AccountId, outcome: GameOutcome, xp: i64) -> Result<(), ArenaError> {
        self.with_account(account, |a| {
            a.record(outcome, xp);
            Ok(())
        })
    }

    /// Checks every account under the lock before touching any of them.
    #[instrument(skip(self, settlement), fields(payouts = settlement.payouts.len()))]
    fn settle(&self, settlement: &Settlement) -> Result<(), ArenaError> {
        let mut accounts = self.lock();
        let involved = settlement
            .payouts
            .iter()
            .map(|(id, _)| id)
            .chain(settlement.records.iter().map(|(id, _, _)| id));
        for id in involved {
            if !accounts.contains_key(id) {
                return Err(ArenaError::new(ArenaErrorKind::AccountNotFound(id.clone())));
            }
        }
        for (id, amount) in &settlement.payouts {
            if let Some(entry) = accounts.get_mut(id) {
                entry.set_balance(*entry.balance() + amount);
            }
        }
        for (id, outcome, xp) in &settlement.records {
            if let Some(entry) = accounts.get_mut(id) {
                entry.record(*outcome, *xp);
            }
        }
        debug!(total = settlement.total_paid(), "Settled");
        Ok(())
    }

    #[instrument(skip(self))]
    fn account(&self, account: &AccountId) -> Result<Account, ArenaError> {
        self.with_account(account, |a| Ok(a.clone()))
    }

    #[instrument(skip(self))]
    fn open_account(
        &self,
        account: &AccountId,
        username: Option<String>,
        balance: i64,
    ) -> Result<Account, ArenaError> {
        let mut accounts = self.lock();
        if accounts.contains_key(account) {
            return Err(ArenaError::new(ArenaErrorKind::AccountExists(account.clone())));
        }
        let opened = Account::opened(account.clone(), username, balance);
        accounts.insert(account.clone(), opened.clone());
        info!(balance, "Account opened");
        Ok(opened)
    }

    #[instrument(skip(self))]
    fn standings(&self, limit: usize) -> Result<Vec<Standing>, ArenaError> {
        let mut accounts: Vec<Account> = self.lock().values().cloned().collect();
        accounts.sort_by(|a, b| {
            b.xp()
                .cmp(a.xp())
                .then_with(|| b.wins().cmp(a.wins()))
                .then_with(|| a.id().cmp(b.id()))
        });
        accounts.truncate(limit);
        Ok(Standing::rank_all(accounts))
    }
}

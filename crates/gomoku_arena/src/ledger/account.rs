//! Account and leaderboard views.

use super::GameOutcome;
use crate::ids::AccountId;
use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};

/// Balance and match statistics of one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct Account {
    id: AccountId,
    username: Option<String>,
    balance: i64,
    xp: i64,
    wins: i64,
    losses: i64,
    draws: i64,
}

impl Account {
    /// A fresh account with no games played.
    pub fn opened(id: AccountId, username: Option<String>, balance: i64) -> Self {
        Self::new(id, username, balance, 0, 0, 0, 0)
    }

    /// Percentage of decisive games won, rounded; 0 with no decisive games.
    pub fn win_rate(&self) -> u32 {
        let decisive = self.wins + self.losses;
        if decisive == 0 {
            0
        } else {
            ((self.wins as f64 / decisive as f64) * 100.0).round() as u32
        }
    }

    pub(crate) fn set_balance(&mut self, balance: i64) {
        self.balance = balance;
    }

    pub(crate) fn record(&mut self, outcome: GameOutcome, xp: i64) {
        self.xp += xp;
        match outcome {
            GameOutcome::Win => self.wins += 1,
            GameOutcome::Loss => self.losses += 1,
            GameOutcome::Draw => self.draws += 1,
        }
    }
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    /// 1-based position.
    pub rank: usize,
    /// The ranked account.
    #[serde(flatten)]
    pub account: Account,
    /// Rounded win percentage over decisive games.
    pub win_rate: u32,
}

impl Standing {
    /// Ranks accounts already sorted best first.
    pub fn rank_all(accounts: impl IntoIterator<Item = Account>) -> Vec<Self> {
        accounts
            .into_iter()
            .enumerate()
            .map(|(index, account)| Standing {
                rank: index + 1,
                win_rate: account.win_rate(),
                account,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_win_rate_rounds() {
        let account = Account::new(AccountId::from("a"), None, 0, 0, 2, 1, 5);
        assert_eq!(account.win_rate(), 67);
        let fresh = Account::opened(AccountId::from("b"), None, 0);
        assert_eq!(fresh.win_rate(), 0);
    }

    #[test]
    fn test_record_touches_one_counter() {
        let mut account = Account::opened(AccountId::from("a"), None, 0);
        account.record(GameOutcome::Draw, 50);
        assert_eq!((*account.wins(), *account.losses(), *account.draws()), (0, 0, 1));
        assert_eq!(*account.xp(), 50);
    }
}

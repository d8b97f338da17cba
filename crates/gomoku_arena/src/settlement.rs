//! Stake settlement for terminal sessions.
//!
//! Each seat escrows `stake` when it takes its seat. On a win the winner is
//! credited the whole pot (`2 × stake`); on a draw each seat gets its stake
//! back; a cancelled waiting session refunds the creator. Settlement never
//! creates or destroys money beyond what was escrowed.

use crate::error::ArenaError;
use crate::ids::AccountId;
use crate::ledger::{GameOutcome, LedgerGateway};
use crate::session::{MoveOutcome, Session};
use tracing::{error, info, instrument};

/// Base experience for a win.
pub const WIN_BASE_XP: i64 = 100;
/// One bonus experience point per this many staked units.
pub const STAKE_PER_BONUS_XP: i64 = 10;
/// Experience for a loss.
pub const LOSS_XP: i64 = 10;
/// Experience for each seat on a draw.
pub const DRAW_XP: i64 = 50;

/// Experience awarded to a winner at `stake`.
pub fn win_xp(stake: i64) -> i64 {
    WIN_BASE_XP + stake.div_euclid(STAKE_PER_BONUS_XP)
}

/// Ledger changes that close a session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Settlement {
    /// Credits to apply.
    pub payouts: Vec<(AccountId, i64)>,
    /// Outcome statistics to record, with experience.
    pub records: Vec<(AccountId, GameOutcome, i64)>,
}

impl Settlement {
    /// Winner takes the pot.
    pub fn for_win(winner: &AccountId, loser: &AccountId, stake: i64) -> Self {
        Self {
            payouts: vec![(winner.clone(), 2 * stake)],
            records: vec![
                (winner.clone(), GameOutcome::Win, win_xp(stake)),
                (loser.clone(), GameOutcome::Loss, LOSS_XP),
            ],
        }
    }

    /// Both stakes are returned.
    pub fn for_draw(player1: &AccountId, player2: &AccountId, stake: i64) -> Self {
        Self {
            payouts: vec![(player1.clone(), stake), (player2.clone(), stake)],
            records: vec![
                (player1.clone(), GameOutcome::Draw, DRAW_XP),
                (player2.clone(), GameOutcome::Draw, DRAW_XP),
            ],
        }
    }

    /// The creator's stake is returned; no statistics change.
    pub fn for_cancel(creator: &AccountId, stake: i64) -> Self {
        Self {
            payouts: vec![(creator.clone(), stake)],
            records: Vec::new(),
        }
    }

    /// Settlement owed after `outcome` was applied to `session`, if any.
    pub fn for_outcome(session: &Session, outcome: MoveOutcome) -> Option<Self> {
        let stake = *session.stake();
        match outcome {
            MoveOutcome::Continues => None,
            MoveOutcome::Won(seat) => {
                let winner = session.account_in(seat)?;
                let loser = session.account_in(seat.opponent())?;
                Some(Self::for_win(winner, loser, stake))
            }
            MoveOutcome::Drawn => {
                let player2 = session.player2_id().as_ref()?;
                Some(Self::for_draw(session.player1_id(), player2, stake))
            }
        }
    }

    /// Sum of all credits.
    pub fn total_paid(&self) -> i64 {
        self.payouts.iter().map(|(_, amount)| amount).sum()
    }

    /// Hands the whole settlement to the ledger as one unit.
    ///
    /// # Errors
    ///
    /// Returns the ledger failure; nothing was credited or recorded.
    #[instrument(skip(self, ledger), fields(payouts = self.payouts.len(), total = self.total_paid()))]
    pub fn apply(&self, ledger: &dyn LedgerGateway) -> Result<(), ArenaError> {
        if let Err(err) = ledger.settle(self) {
            error!(payouts = ?self.payouts, records = ?self.records, error = %err, "Settlement failed");
            return Err(err);
        }
        info!("Settlement applied");
        Ok(())
    }
}

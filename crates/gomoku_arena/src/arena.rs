//! The game session engine.
//!
//! [`Arena`] owns the session registry and coordinates the ledger, the
//! session store and the event dispatcher. Every mutating operation on a
//! session runs under that session's lock: validation, the state
//! transition, settlement, persistence and event enqueueing happen as one
//! step, so concurrent requests on one session are strictly ordered and a
//! losing request sees the winner's result.

use crate::config::RuleLimits;
use crate::error::{ArenaError, ArenaErrorKind};
use crate::events::{EventDispatcher, FanOut, SessionEvent, Subscribers, Subscription};
use crate::ids::{AccountId, SessionId};
use crate::ledger::{Account, LedgerGateway, Standing};
use crate::registry::{lock_slot, SessionRegistry, SessionSlot};
use crate::session::{
    validate_move, MoveAttempt, Replay, Session, SessionInvariants, SessionStatus, SessionView,
};
use crate::settlement::Settlement;
use crate::store::SessionStore;
use chrono::{Duration, Utc};
use gomoku_board::InvariantSet;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// What [`Arena::restore`] found in storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Sessions loaded into the registry.
    pub restored: usize,
    /// Sessions whose persisted board disagreed with the move log.
    pub repaired: Vec<SessionId>,
    /// Playing sessions whose log already ends in a win or draw.
    pub unsettled: Vec<SessionId>,
    /// Waiting or playing sessions idle beyond the liveness window.
    pub stale: Vec<SessionId>,
    /// Records that could not be replayed, with the reason.
    pub corrupt: Vec<String>,
}

impl ReconcileReport {
    /// True if nothing needs an operator's attention.
    pub fn is_clean(&self) -> bool {
        self.repaired.is_empty()
            && self.unsettled.is_empty()
            && self.stale.is_empty()
            && self.corrupt.is_empty()
    }
}

/// Game session engine.
#[derive(Debug)]
pub struct Arena {
    registry: SessionRegistry,
    ledger: Arc<dyn LedgerGateway>,
    store: Option<Arc<dyn SessionStore>>,
    subscribers: Arc<Subscribers>,
    dispatcher: EventDispatcher,
    limits: RuleLimits,
}

impl Arena {
    /// Creates an engine over `ledger`, optionally persisting to `store`.
    ///
    /// The returned [`FanOut`] delivers events to subscribers; spawn
    /// [`FanOut::run`] on the runtime, or drop it if nobody listens.
    #[instrument(skip(ledger, store))]
    pub fn new(
        ledger: Arc<dyn LedgerGateway>,
        store: Option<Arc<dyn SessionStore>>,
        limits: RuleLimits,
    ) -> (Self, FanOut) {
        let subscribers = Subscribers::new();
        let (dispatcher, fan_out) = EventDispatcher::new(Arc::clone(&subscribers));
        info!(persistent = store.is_some(), "Creating arena");
        let arena = Self {
            registry: SessionRegistry::new(),
            ledger,
            store,
            subscribers,
            dispatcher,
            limits,
        };
        (arena, fan_out)
    }

    /// The ledger this engine settles against.
    pub fn ledger(&self) -> &Arc<dyn LedgerGateway> {
        &self.ledger
    }

    /// Session parameter limits.
    pub fn limits(&self) -> &RuleLimits {
        &self.limits
    }

    fn slot(&self, session_id: SessionId) -> Result<SessionSlot, ArenaError> {
        self.registry
            .slot(&session_id)
            .ok_or_else(|| ArenaError::new(ArenaErrorKind::SessionNotFound(session_id)))
    }

    /// Persists a committed session. Storage failures are logged, not
    /// propagated; the in-memory state stays authoritative.
    fn persist(&self, session: &Session) {
        debug_assert!(
            <SessionInvariants as InvariantSet<Session>>::check_all(session).is_ok(),
            "session invariants violated: {:?}",
            <SessionInvariants as InvariantSet<Session>>::check_all(session)
        );
        if let Some(store) = &self.store {
            if let Err(e) = store.save_session(session) {
                error!(session_id = %session.id(), error = %e, "Failed to persist session");
            }
        }
    }

    /// Persists, then enqueues the event built from the committed snapshot.
    /// Must be called with the session lock held.
    fn commit(&self, session: &Session, event: fn(SessionView) -> SessionEvent) -> SessionView {
        self.persist(session);
        let view = session.view();
        self.dispatcher.dispatch(event(view.clone()));
        view
    }

    /// Opens a waiting session and escrows the creator's stake.
    ///
    /// # Errors
    ///
    /// `InvalidStake`, `InvalidBoardSize`, `InvalidWinCondition`,
    /// `AccountNotFound` or `InsufficientBalance`. No session exists after
    /// a failure.
    #[instrument(skip(self), fields(creator = %creator))]
    pub fn create_session(
        &self,
        creator: &AccountId,
        stake: i64,
        board_size: Option<usize>,
        win_condition: Option<usize>,
    ) -> Result<SessionView, ArenaError> {
        if stake <= 0 {
            warn!(stake, "Rejected non-positive stake");
            return Err(ArenaError::new(ArenaErrorKind::InvalidStake(stake)));
        }
        let (size, win) = self.limits.resolve(board_size, win_condition)?;

        self.ledger.debit(creator, stake)?;

        let session = Session::open(SessionId::generate(), creator.clone(), stake, size, win, Utc::now());
        let slot = self.registry.insert(session);
        let session = lock_slot(&slot);
        self.persist(&session);
        info!(session_id = %session.id(), stake, board_size = size, win_condition = win, "Session created");
        Ok(session.view())
    }

    /// Seats `joiner` as player2, escrows their stake and starts play.
    ///
    /// # Errors
    ///
    /// Checked in order: `SessionNotFound`, `SessionNotJoinable`,
    /// `SelfJoin`, then the ledger's `AccountNotFound` or
    /// `InsufficientBalance`.
    #[instrument(skip(self), fields(session_id = %session_id, joiner = %joiner))]
    pub fn join_session(&self, session_id: SessionId, joiner: &AccountId) -> Result<SessionView, ArenaError> {
        let slot = self.slot(session_id)?;
        let mut session = lock_slot(&slot);

        if *session.status() != SessionStatus::Waiting {
            warn!(status = session.status().as_ref(), "Join rejected");
            return Err(ArenaError::new(ArenaErrorKind::SessionNotJoinable(session_id)));
        }
        if session.player1_id() == joiner {
            warn!("Creator tried to join own session");
            return Err(ArenaError::new(ArenaErrorKind::SelfJoin));
        }

        self.ledger.debit(joiner, *session.stake())?;
        session.seat_second_player(joiner.clone(), Utc::now());

        info!("Second player joined");
        Ok(self.commit(&session, SessionEvent::Joined))
    }

    /// Places `actor`'s stone at `(row, col)`.
    ///
    /// On a win or draw the session finishes and the ledger is settled
    /// before the new state becomes visible. If settlement fails the
    /// session is left as it was before the move.
    ///
    /// # Errors
    ///
    /// The move validator's rejections, in its order, or a ledger failure
    /// during settlement.
    #[instrument(skip(self), fields(session_id = %session_id, actor = %actor))]
    pub fn apply_move(
        &self,
        session_id: SessionId,
        actor: &AccountId,
        row: i32,
        col: i32,
    ) -> Result<SessionView, ArenaError> {
        let slot = self.slot(session_id)?;
        let mut session = lock_slot(&slot);

        let attempt = MoveAttempt { actor, row, col };
        let seat = validate_move(session_id, Some(&*session), &attempt)?;

        let mut next = session.clone();
        let outcome = next.place_stone(seat, actor.clone(), row, col, Utc::now())?;

        if let Some(settlement) = Settlement::for_outcome(&next, outcome) {
            settlement.apply(self.ledger.as_ref())?;
        }
        *session = next;

        if outcome.is_terminal() {
            info!(outcome = ?outcome, moves = session.moves().len(), "Session finished");
            Ok(self.commit(&session, SessionEvent::StatusChanged))
        } else {
            debug!(row, col, seat = %seat, "Move applied");
            Ok(self.commit(&session, SessionEvent::Move))
        }
    }

    /// Cancels a waiting session and refunds the creator.
    ///
    /// # Errors
    ///
    /// `SessionNotFound`, `SessionNotCancellable` when it already started
    /// or ended, `NotAParticipant` when `requester` is not the creator.
    #[instrument(skip(self), fields(session_id = %session_id, requester = %requester))]
    pub fn cancel_session(&self, session_id: SessionId, requester: &AccountId) -> Result<SessionView, ArenaError> {
        let slot = self.slot(session_id)?;
        let mut session = lock_slot(&slot);

        if *session.status() != SessionStatus::Waiting {
            warn!(status = session.status().as_ref(), "Cancel rejected");
            return Err(ArenaError::new(ArenaErrorKind::SessionNotCancellable(session_id)));
        }
        if session.player1_id() != requester {
            warn!("Cancel by non-creator rejected");
            return Err(ArenaError::new(ArenaErrorKind::NotAParticipant(requester.clone())));
        }

        Settlement::for_cancel(session.player1_id(), *session.stake()).apply(self.ledger.as_ref())?;
        session.cancel(Utc::now());

        info!("Session cancelled");
        Ok(self.commit(&session, SessionEvent::StatusChanged))
    }

    /// Full snapshot including the move log.
    #[instrument(skip(self))]
    pub fn get_session(&self, session_id: SessionId) -> Result<SessionView, ArenaError> {
        self.registry
            .snapshot(&session_id)
            .map(|s| s.view())
            .ok_or_else(|| ArenaError::new(ArenaErrorKind::SessionNotFound(session_id)))
    }

    /// Waiting sessions, oldest first.
    #[instrument(skip(self))]
    pub fn list_waiting_sessions(&self) -> Vec<SessionView> {
        self.registry
            .with_status(SessionStatus::Waiting)
            .iter()
            .map(Session::view)
            .collect()
    }

    /// Waiting or playing sessions not updated within `window`.
    #[instrument(skip(self))]
    pub fn stale_sessions(&self, window: Duration) -> Vec<SessionView> {
        let cutoff = Utc::now() - window;
        self.registry
            .snapshots()
            .iter()
            .filter(|s| !s.status().is_terminal() && *s.updated_at() < cutoff)
            .map(Session::view)
            .collect()
    }

    /// Starts listening to a session's events.
    ///
    /// # Errors
    ///
    /// `SessionNotFound`.
    #[instrument(skip(self))]
    pub fn subscribe(&self, session_id: SessionId) -> Result<Subscription, ArenaError> {
        self.slot(session_id)?;
        Ok(self.subscribers.subscribe(session_id))
    }

    /// The subscriber registry.
    pub fn subscribers(&self) -> &Arc<Subscribers> {
        &self.subscribers
    }

    /// Loads every persisted session, replaying its move log, into the
    /// registry. Nothing is settled or refunded automatically.
    ///
    /// # Errors
    ///
    /// `Storage` when the store cannot be read. Individual unreadable
    /// records are reported, not fatal.
    #[instrument(skip(self))]
    pub fn restore(&self, liveness_window: Duration) -> Result<ReconcileReport, ArenaError> {
        let mut report = ReconcileReport::default();
        let Some(store) = &self.store else {
            debug!("No store configured; nothing to restore");
            return Ok(report);
        };

        let cutoff = Utc::now() - liveness_window;
        for stored in store.load_sessions()? {
            let id = stored.id;
            let replay = match Replay::run(stored) {
                Ok(replay) => replay,
                Err(e) => {
                    error!(session_id = %id, error = %e.kind, "Skipping corrupt session");
                    report.corrupt.push(e.kind.to_string());
                    continue;
                }
            };
            if replay.board_repaired {
                report.repaired.push(id);
            }
            if replay.unsettled {
                report.unsettled.push(id);
            }
            let session = replay.session;
            if !session.status().is_terminal() && *session.updated_at() < cutoff {
                report.stale.push(id);
            }
            self.registry.insert(session);
            report.restored += 1;
        }

        info!(
            restored = report.restored,
            repaired = report.repaired.len(),
            unsettled = report.unsettled.len(),
            stale = report.stale.len(),
            corrupt = report.corrupt.len(),
            "Sessions restored"
        );
        Ok(report)
    }

    /// Opens an account with `balance`.
    #[instrument(skip(self, username))]
    pub fn open_account(
        &self,
        account: &AccountId,
        username: Option<String>,
        balance: i64,
    ) -> Result<Account, ArenaError> {
        self.ledger.open_account(account, username, balance)
    }

    /// Account view.
    #[instrument(skip(self))]
    pub fn account(&self, account: &AccountId) -> Result<Account, ArenaError> {
        self.ledger.account(account)
    }

    /// Leaderboard, best first.
    #[instrument(skip(self))]
    pub fn leaderboard(&self, limit: usize) -> Result<Vec<Standing>, ArenaError> {
        self.ledger.standings(limit)
    }
}

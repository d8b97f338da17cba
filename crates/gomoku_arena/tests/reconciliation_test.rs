//! Tests for restoring sessions from storage by replaying move logs.

use std::sync::Arc;

use chrono::{Duration, Utc};
use gomoku_arena::{
    AccountId, Arena, ArenaErrorKind, Board, LedgerGateway, MemoryLedger, MemoryStore, RuleLimits,
    Seat, SessionId, SessionStatus, SessionStore, StoredSession,
};

struct Fixture {
    ledger: Arc<MemoryLedger>,
    store: Arc<MemoryStore>,
}

impl Fixture {
    fn new() -> Self {
        let ledger = Arc::new(MemoryLedger::new());
        for name in ["alice", "bob"] {
            ledger.open_account(&AccountId::from(name), None, 1000).unwrap();
        }
        Self {
            ledger,
            store: Arc::new(MemoryStore::new()),
        }
    }

    fn arena(&self) -> Arena {
        let store: Arc<dyn SessionStore> = self.store.clone();
        let (arena, _fan_out) = Arena::new(self.ledger.clone(), Some(store), RuleLimits::default());
        arena
    }

    /// Plays `moves` alternately from alice on a fresh 9x9 session and
    /// returns its stored record.
    fn stored_after(&self, moves: &[(i32, i32)]) -> StoredSession {
        let arena = self.arena();
        let alice = AccountId::from("alice");
        let bob = AccountId::from("bob");
        let id = arena.create_session(&alice, 10, Some(9), Some(4)).unwrap().id;
        arena.join_session(id, &bob).unwrap();
        for (index, &(row, col)) in moves.iter().enumerate() {
            let actor = if index % 2 == 0 { &alice } else { &bob };
            arena.apply_move(id, actor, row, col).unwrap();
        }
        self.record(id)
    }

    fn record(&self, id: SessionId) -> StoredSession {
        self.store
            .load_sessions()
            .unwrap()
            .into_iter()
            .find(|s| s.id == id)
            .expect("session stored")
    }
}

#[test]
fn test_clean_store_restores_everything() {
    let fixture = Fixture::new();
    let stored = fixture.stored_after(&[(4, 4), (0, 0), (4, 5)]);

    let arena = fixture.arena();
    let report = arena.restore(Duration::hours(1)).unwrap();
    assert_eq!(report.restored, 1);
    assert!(report.is_clean());

    let view = arena.get_session(stored.id).unwrap();
    assert_eq!(view.board, stored.board);
    assert_eq!(view.current_turn, Seat::Player2);
}

#[test]
fn test_board_drift_is_repaired_from_log() {
    let fixture = Fixture::new();
    let mut stored = fixture.stored_after(&[(4, 4), (0, 0)]);
    let id = stored.id;
    let replayed = stored.board.clone();
    let mut drifted = Board::new(9);
    drifted.place(8, 8, Seat::Player1).unwrap();
    stored.board = drifted;
    fixture.store.insert(stored);

    let arena = fixture.arena();
    let report = arena.restore(Duration::hours(1)).unwrap();
    assert_eq!(report.repaired, vec![id]);

    let view = arena.get_session(id).unwrap();
    assert_eq!(view.board, replayed);
    // The restored session keeps playing from the replayed position.
    arena.apply_move(id, &AccountId::from("alice"), 8, 8).unwrap();
}

#[test]
fn test_playing_session_with_finished_log_is_unsettled() {
    let fixture = Fixture::new();
    let mut stored = fixture.stored_after(&[(0, 0), (5, 0), (0, 1), (5, 1), (0, 2), (5, 2)]);
    let id = stored.id;

    // Append alice's winning stone without the status change, as if the
    // process stopped between logging and settling.
    let last = stored.moves.last().unwrap().clone();
    stored.moves.push(gomoku_arena::MoveRecord::new(
        uuid::Uuid::new_v4(),
        id,
        AccountId::from("alice"),
        *last.seq() + 1,
        0,
        3,
        Seat::Player1,
        Utc::now(),
    ));
    stored.board.place(0, 3, Seat::Player1).unwrap();
    fixture.store.insert(stored);

    let arena = fixture.arena();
    let report = arena.restore(Duration::hours(1)).unwrap();
    assert_eq!(report.unsettled, vec![id]);
    // Nothing is paid out automatically.
    assert_eq!(fixture.ledger.balance(&AccountId::from("alice")).unwrap(), 990);
}

#[test]
fn test_out_of_turn_log_is_corrupt_and_skipped() {
    let fixture = Fixture::new();
    let mut stored = fixture.stored_after(&[(4, 4), (0, 0)]);
    let id = stored.id;
    // Replace bob's reply with a second stone from alice.
    let first = stored.moves[0].clone();
    stored.moves[1] = gomoku_arena::MoveRecord::new(
        uuid::Uuid::new_v4(),
        id,
        first.user_id().clone(),
        1,
        0,
        0,
        Seat::Player1,
        *first.created_at(),
    );
    fixture.store.insert(stored);

    let arena = fixture.arena();
    let report = arena.restore(Duration::hours(1)).unwrap();
    assert_eq!(report.restored, 0);
    assert_eq!(report.corrupt.len(), 1);
    let err = arena.get_session(id).unwrap_err();
    assert!(matches!(err.kind, ArenaErrorKind::SessionNotFound(_)));
}

#[test]
fn test_idle_sessions_are_reported_stale() {
    let fixture = Fixture::new();
    let arena = fixture.arena();
    let id = arena.create_session(&AccountId::from("alice"), 10, None, None).unwrap().id;
    let mut stored = fixture.record(id);
    stored.updated_at = Utc::now() - Duration::hours(3);
    fixture.store.insert(stored);

    let restored = fixture.arena();
    let report = restored.restore(Duration::hours(1)).unwrap();
    assert_eq!(report.stale, vec![id]);
    assert_eq!(restored.get_session(id).unwrap().status, SessionStatus::Waiting);
    assert_eq!(restored.stale_sessions(Duration::hours(1)).len(), 1);
}

//! Tests for the HTTP routes and the event stream.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use gomoku_arena::{AccountId, AppState, Arena, MemoryLedger, RuleLimits, SessionId, router};

fn app() -> (Router, Arc<Arena>) {
    let (arena, fan_out) = Arena::new(Arc::new(MemoryLedger::new()), None, RuleLimits::default());
    tokio::spawn(fan_out.run());
    let arena = Arc::new(arena);
    (router(AppState::new(Arc::clone(&arena), 1000)), arena)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(match body {
            Some(json) => Body::from(json.to_string()),
            None => Body::empty(),
        })
        .expect("Failed to build request");
    let response = app.clone().oneshot(request).await.expect("Request failed");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Body is not JSON")
    };
    (status, value)
}

async fn open(app: &Router, id: &str) {
    let (status, _) = send(app, "POST", "/accounts", Some(json!({ "account_id": id }))).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_open_account_grants_starting_balance() {
    let (app, _) = app();
    let (status, body) = send(
        &app,
        "POST",
        "/accounts",
        Some(json!({ "account_id": "alice", "username": "Alice" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["balance"], 1000);

    let (status, body) = send(&app, "GET", "/accounts/alice", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "Alice");

    let (status, body) = send(&app, "POST", "/accounts", Some(json!({ "account_id": "alice" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "invalid_state");
}

#[tokio::test]
async fn test_full_game_over_http() {
    let (app, _) = app();
    open(&app, "alice").await;
    open(&app, "bob").await;

    let (status, session) = send(
        &app,
        "POST",
        "/sessions",
        Some(json!({ "account_id": "alice", "stake": 100, "board_size": 5, "win_condition": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(session["status"], "waiting");
    let id = session["id"].as_str().expect("id").to_string();

    let (_, waiting) = send(&app, "GET", "/sessions/waiting", None).await;
    assert_eq!(waiting.as_array().map(Vec::len), Some(1));

    let (status, joined) = send(
        &app,
        "POST",
        &format!("/sessions/{id}/join"),
        Some(json!({ "account_id": "bob" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(joined["status"], "playing");
    assert_eq!(joined["current_turn"], "player1");

    let moves = [("alice", 0, 0), ("bob", 1, 0), ("alice", 0, 1), ("bob", 1, 1), ("alice", 0, 2)];
    let mut last = Value::Null;
    for (who, row, col) in moves {
        let (status, body) = send(
            &app,
            "POST",
            &format!("/sessions/{id}/moves"),
            Some(json!({ "account_id": who, "row": row, "col": col })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        last = body;
    }
    assert_eq!(last["status"], "finished");
    assert_eq!(last["result"], "player1_win");
    assert_eq!(last["winner_id"], "alice");
    assert_eq!(last["board"][0], json!([1, 1, 1, 0, 0]));
    assert_eq!(last["board"][1], json!([2, 2, 0, 0, 0]));

    let (_, fetched) = send(&app, "GET", &format!("/sessions/{id}"), None).await;
    assert_eq!(fetched["moves"].as_array().map(Vec::len), Some(5));

    let (_, board) = send(&app, "GET", "/leaderboard?limit=5", None).await;
    assert_eq!(board[0]["id"], "alice");
    assert_eq!(board[0]["rank"], 1);
    assert_eq!(board[0]["xp"], 110);
    assert_eq!(board[0]["win_rate"], 100);
}

#[tokio::test]
async fn test_errors_map_to_status_codes() {
    let (app, _) = app();
    open(&app, "alice").await;
    open(&app, "bob").await;

    let missing = SessionId::generate();
    let (status, body) = send(&app, "GET", &format!("/sessions/{missing}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, _) = send(
        &app,
        "POST",
        "/sessions",
        Some(json!({ "account_id": "alice", "stake": 5000 })),
    )
    .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);

    let (status, body) = send(
        &app,
        "POST",
        "/sessions",
        Some(json!({ "account_id": "alice", "stake": 10, "board_size": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_input");

    let (_, session) = send(
        &app,
        "POST",
        "/sessions",
        Some(json!({ "account_id": "alice", "stake": 10 })),
    )
    .await;
    let id = session["id"].as_str().expect("id").to_string();

    let (status, _) = send(
        &app,
        "POST",
        &format!("/sessions/{id}/moves"),
        Some(json!({ "account_id": "alice", "row": 0, "col": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    send(&app, "POST", &format!("/sessions/{id}/join"), Some(json!({ "account_id": "bob" }))).await;
    let (status, body) = send(
        &app,
        "POST",
        &format!("/sessions/{id}/moves"),
        Some(json!({ "account_id": "bob", "row": 0, "col": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Not your turn");
}

#[tokio::test]
async fn test_cancel_over_http_refunds() {
    let (app, arena) = app();
    open(&app, "alice").await;
    let (_, session) = send(
        &app,
        "POST",
        "/sessions",
        Some(json!({ "account_id": "alice", "stake": 250 })),
    )
    .await;
    let id = session["id"].as_str().expect("id").to_string();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/sessions/{id}/cancel"),
        Some(json!({ "account_id": "alice" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");
    assert_eq!(*arena.account(&AccountId::from("alice")).unwrap().balance(), 1000);
}

#[tokio::test]
async fn test_subscribers_see_transitions_in_order() {
    let (_, arena) = app();
    let alice = AccountId::from("alice");
    let bob = AccountId::from("bob");
    arena.open_account(&alice, None, 1000).unwrap();
    arena.open_account(&bob, None, 1000).unwrap();

    let id = arena.create_session(&alice, 10, Some(5), Some(3)).unwrap().id;
    let mut watcher = arena.subscribe(id).unwrap();
    let mut bystander = arena
        .subscribe(arena.create_session(&bob, 10, None, None).unwrap().id)
        .unwrap();

    arena.join_session(id, &bob).unwrap();
    arena.apply_move(id, &alice, 0, 0).unwrap();
    arena.apply_move(id, &bob, 1, 0).unwrap();
    arena.apply_move(id, &alice, 0, 1).unwrap();
    arena.apply_move(id, &bob, 1, 1).unwrap();
    arena.apply_move(id, &alice, 0, 2).unwrap();

    let mut names = Vec::new();
    for _ in 0..6 {
        let event = tokio::time::timeout(Duration::from_secs(5), watcher.recv())
            .await
            .expect("event timed out")
            .expect("stream closed");
        assert_eq!(event.session_id(), id);
        names.push(event.name().to_string());
    }
    assert_eq!(names, ["joined", "move", "move", "move", "move", "status_changed"]);
    assert!(bystander.try_recv().is_none());

    let unknown = arena.subscribe(SessionId::generate()).unwrap_err();
    assert!(matches!(unknown.kind, gomoku_arena::ArenaErrorKind::SessionNotFound(_)));
}

#[tokio::test]
async fn test_event_stream_responds_with_sse() {
    let (app, arena) = app();
    arena.open_account(&AccountId::from("alice"), None, 1000).unwrap();
    let id = arena.create_session(&AccountId::from("alice"), 10, None, None).unwrap().id;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/sessions/{id}/events"))
                .body(Body::empty())
                .expect("Failed to build request"),
        )
        .await
        .expect("Request failed");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()),
        Some("text/event-stream")
    );
    assert_eq!(arena.subscribers().subscriber_count(id), 1);

    drop(response);
    assert_eq!(arena.subscribers().subscriber_count(id), 0);
}

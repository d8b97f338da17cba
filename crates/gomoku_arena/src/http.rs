//! HTTP and server-sent-event surface over the engine.
//!
//! Callers name themselves with `account_id` in the request body; identity
//! is established upstream.

use crate::arena::Arena;
use crate::error::{ArenaError, ErrorClass};
use crate::events::Subscription;
use crate::ids::{AccountId, SessionId};
use crate::ledger::{Account, Standing};
use crate::session::SessionView;
use axum::{
    Json, Router,
    body::Body,
    extract::{Path, Query, State},
    http::{Request, StatusCode},
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tower::ServiceBuilder;
use tracing::{debug, error, info, instrument, warn};

/// Leaderboard rows returned when no limit is given.
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 10;
/// Largest leaderboard page served.
pub const MAX_LEADERBOARD_LIMIT: usize = 100;

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    arena: Arc<Arena>,
    starting_balance: i64,
}

impl AppState {
    /// State over `arena`; accounts opened through the API get
    /// `starting_balance`.
    pub fn new(arena: Arc<Arena>, starting_balance: i64) -> Self {
        Self { arena, starting_balance }
    }
}

/// Body of `POST /accounts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAccountRequest {
    /// Account to open.
    pub account_id: AccountId,
    /// Display name.
    #[serde(default)]
    pub username: Option<String>,
}

/// Body of `POST /sessions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    /// Creator.
    pub account_id: AccountId,
    /// Stake per seat.
    pub stake: i64,
    /// Board side length; configured default when absent.
    #[serde(default)]
    pub board_size: Option<usize>,
    /// Run length to win; configured default when absent.
    #[serde(default)]
    pub win_condition: Option<usize>,
}

/// Body of join and cancel requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorRequest {
    /// Caller.
    pub account_id: AccountId,
}

/// Body of `POST /sessions/{id}/moves`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveRequest {
    /// Caller.
    pub account_id: AccountId,
    /// Zero-based row.
    pub row: i32,
    /// Zero-based column.
    pub col: i32,
}

/// Query of `GET /leaderboard`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeaderboardQuery {
    /// Maximum rows.
    pub limit: Option<usize>,
}

/// JSON error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Failure class.
    pub error: String,
    /// Human-readable reason.
    pub message: String,
}

/// HTTP status for a failure class.
pub fn status_for(class: ErrorClass) -> StatusCode {
    match class {
        ErrorClass::NotFound => StatusCode::NOT_FOUND,
        ErrorClass::InvalidState => StatusCode::CONFLICT,
        ErrorClass::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorClass::Unauthorized => StatusCode::FORBIDDEN,
        ErrorClass::InsufficientFunds => StatusCode::PAYMENT_REQUIRED,
        ErrorClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ArenaError {
    fn into_response(self) -> Response {
        let class = self.class();
        let status = status_for(class);
        if class == ErrorClass::Internal {
            error!(error = %self, "Request failed");
        } else {
            debug!(error = %self, status = status.as_u16(), "Request rejected");
        }
        let body = ErrorBody {
            error: class.as_ref().to_string(),
            message: self.kind.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Builds the router.
#[instrument(skip(state))]
pub fn router(state: AppState) -> Router {
    info!("Building HTTP routes");
    Router::new()
        .route("/accounts", post(open_account))
        .route("/accounts/{id}", get(get_account))
        .route("/leaderboard", get(leaderboard))
        .route("/sessions", post(create_session))
        .route("/sessions/waiting", get(list_waiting))
        .route("/sessions/{id}", get(get_session))
        .route("/sessions/{id}/join", post(join_session))
        .route("/sessions/{id}/moves", post(apply_move))
        .route("/sessions/{id}/cancel", post(cancel_session))
        .route("/sessions/{id}/events", get(session_events))
        .layer(ServiceBuilder::new().map_request(|req: Request<Body>| {
            debug!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
            req
        }))
        .with_state(state)
}

#[instrument(skip(state, body), fields(account_id = %body.account_id))]
async fn open_account(
    State(state): State<AppState>,
    Json(body): Json<OpenAccountRequest>,
) -> Result<(StatusCode, Json<Account>), ArenaError> {
    let account = state
        .arena
        .open_account(&body.account_id, body.username, state.starting_balance)?;
    Ok((StatusCode::CREATED, Json(account)))
}

#[instrument(skip(state))]
async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<AccountId>,
) -> Result<Json<Account>, ArenaError> {
    Ok(Json(state.arena.account(&id)?))
}

#[instrument(skip(state))]
async fn leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<Standing>>, ArenaError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LEADERBOARD_LIMIT)
        .min(MAX_LEADERBOARD_LIMIT);
    Ok(Json(state.arena.leaderboard(limit)?))
}

#[instrument(skip(state, body), fields(account_id = %body.account_id, stake = body.stake))]
async fn create_session(
    State(state): State<AppState>,
    Json(body): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionView>), ArenaError> {
    let view = state
        .arena
        .create_session(&body.account_id, body.stake, body.board_size, body.win_condition)?;
    Ok((StatusCode::CREATED, Json(view)))
}

#[instrument(skip(state))]
async fn list_waiting(State(state): State<AppState>) -> Json<Vec<SessionView>> {
    Json(state.arena.list_waiting_sessions())
}

#[instrument(skip(state))]
async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> Result<Json<SessionView>, ArenaError> {
    Ok(Json(state.arena.get_session(id)?))
}

#[instrument(skip(state, body), fields(account_id = %body.account_id))]
async fn join_session(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    Json(body): Json<ActorRequest>,
) -> Result<Json<SessionView>, ArenaError> {
    Ok(Json(state.arena.join_session(id, &body.account_id)?))
}

#[instrument(skip(state, body), fields(account_id = %body.account_id, row = body.row, col = body.col))]
async fn apply_move(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    Json(body): Json<MoveRequest>,
) -> Result<Json<SessionView>, ArenaError> {
    Ok(Json(state.arena.apply_move(id, &body.account_id, body.row, body.col)?))
}

#[instrument(skip(state, body), fields(account_id = %body.account_id))]
async fn cancel_session(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    Json(body): Json<ActorRequest>,
) -> Result<Json<SessionView>, ArenaError> {
    Ok(Json(state.arena.cancel_session(id, &body.account_id)?))
}

#[instrument(skip(state))]
async fn session_events(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ArenaError> {
    let subscription = state.arena.subscribe(id)?;
    info!(subscriber = subscription.id(), "Event stream opened");
    Ok(Sse::new(event_stream(subscription)).keep_alive(KeepAlive::default()))
}

/// Turns a subscription into SSE frames named after the event kind. The
/// subscription, and with it the registration, is dropped with the stream.
fn event_stream(subscription: Subscription) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold(subscription, |mut subscription| async move {
        let event = subscription.recv().await?;
        let frame = match Event::default().event(event.name()).json_data(&event) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Failed to encode event");
                Event::default().event("error").data(e.to_string())
            }
        };
        Some((Ok(frame), subscription))
    })
}

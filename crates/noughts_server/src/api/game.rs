//! Handlers for the live session: join, state, move, reset.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use noughts_game::{Board, RejectReason, Symbol, Winner};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, instrument, warn};

use crate::api::{ApiError, AppState};
use crate::session::StateSnapshot;

/// `POST /api/join` body. Accepts `email`/`nick` as aliases.
#[derive(Debug, Clone, Deserialize)]
pub struct JoinRequest {
    #[serde(default, alias = "email")]
    identity: Option<String>,
    #[serde(default, alias = "nick")]
    name: Option<String>,
}

/// `POST /api/join` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinResponse {
    /// Assigned symbol.
    pub symbol: Symbol,
}

/// `GET /api/state` response.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum StateResponse {
    /// Fewer than two players.
    Waiting {
        /// Always false.
        started: bool,
        /// Registered players.
        players: usize,
    },
    /// Match running or finished.
    Playing {
        /// Always true.
        started: bool,
        /// Board tokens.
        board: Board,
        /// Symbol to move.
        turn: Symbol,
        /// True after a win or draw.
        over: bool,
        /// Winner, if any.
        winner: Option<Winner>,
        /// Display name per symbol.
        nicks: HashMap<Symbol, String>,
    },
}

impl From<StateSnapshot> for StateResponse {
    fn from(snapshot: StateSnapshot) -> Self {
        match snapshot {
            StateSnapshot::NotStarted { player_count } => StateResponse::Waiting {
                started: false,
                players: player_count,
            },
            StateSnapshot::Started {
                board,
                turn,
                terminal,
                winner,
                names,
            } => StateResponse::Playing {
                started: true,
                board,
                turn,
                over: terminal,
                winner,
                nicks: names,
            },
        }
    }
}

/// `POST /api/move` body. Accepts `pos` as an alias.
#[derive(Debug, Clone, Deserialize)]
pub struct MoveRequest {
    symbol: Symbol,
    #[serde(alias = "pos")]
    position: usize,
}

/// Accepted move.
#[derive(Debug, Clone, Serialize)]
pub struct MoveResponse {
    ok: bool,
    board: Board,
    turn: Symbol,
    over: bool,
    winner: Option<Winner>,
}

/// Refused move.
#[derive(Debug, Clone, Serialize)]
pub struct MoveFailure {
    ok: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<RejectReason>,
}

impl MoveFailure {
    fn new(error: impl Into<String>, reason: Option<RejectReason>) -> (StatusCode, Json<Self>) {
        (
            StatusCode::BAD_REQUEST,
            Json(Self {
                ok: false,
                error: error.into(),
                reason,
            }),
        )
    }
}

/// Plain acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ack {
    /// Always true.
    pub ok: bool,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `POST /api/join`
#[instrument(skip_all)]
pub async fn join(
    State(state): State<AppState>,
    payload: Result<Json<JoinRequest>, JsonRejection>,
) -> Result<Json<JoinResponse>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let (Some(identity), Some(name)) = (non_empty(req.identity), non_empty(req.name)) else {
        warn!("Join without identity or name");
        return Err(ApiError::bad_request("missing identity or name"));
    };

    let symbol = state
        .session()
        .register_player(identity, name)
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    Ok(Json(JoinResponse { symbol }))
}

/// `GET /api/state`
#[instrument(skip_all)]
pub async fn get_state(State(state): State<AppState>) -> Json<StateResponse> {
    Json(state.session().read_state().into())
}

/// `POST /api/move`
#[instrument(skip_all)]
pub async fn make_move(
    State(state): State<AppState>,
    payload: Result<Json<MoveRequest>, JsonRejection>,
) -> Result<Json<MoveResponse>, (StatusCode, Json<MoveFailure>)> {
    let Json(req) = payload.map_err(|e| {
        debug!(error = %e, "Malformed move request");
        MoveFailure::new(format!("malformed request: {}", e.body_text()), None)
    })?;

    let snapshot = state
        .session()
        .submit_move(req.symbol, req.position)
        .map_err(|e| MoveFailure::new(e.to_string(), e.reason()))?;

    Ok(Json(MoveResponse {
        ok: true,
        board: snapshot.board().clone(),
        turn: *snapshot.turn(),
        over: *snapshot.terminal(),
        winner: *snapshot.winner(),
    }))
}

/// `POST /api/reset`
#[instrument(skip_all)]
pub async fn reset(State(state): State<AppState>) -> Json<Ack> {
    state.session().reset();
    Json(Ack { ok: true })
}

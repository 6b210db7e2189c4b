//! CRUD over stored game records.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use noughts_game::{Board, Winner};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::api::game::Ack;
use crate::api::{ApiError, AppState};
use crate::db::{
    DbError, GameRecordChanges, GameRecordView, GameRepository, GameStats, NewGameRecord,
    RecordStatus,
};

/// Largest accepted page size.
pub const MAX_PER_PAGE: i64 = 100;
const DEFAULT_PER_PAGE: i64 = 10;

/// Pagination query for `GET /api/games`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    page: Option<i64>,
    per_page: Option<i64>,
}

/// One page of records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
    /// Records, newest first.
    pub games: Vec<GameRecordView>,
    /// Records in the store.
    pub total: i64,
    /// Page returned (from 1).
    pub page: i64,
    /// Page size used.
    pub per_page: i64,
    /// Number of pages.
    pub pages: i64,
}

/// `POST /api/games` body.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRecordRequest {
    player_x_email: String,
    player_x_nick: String,
    player_o_email: String,
    player_o_nick: String,
    #[serde(default)]
    board: Board,
    #[serde(default)]
    winner: Option<Winner>,
    #[serde(default)]
    status: RecordStatus,
}

/// `PUT /api/games/{id}` body. Absent fields stay unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRecordRequest {
    #[serde(default)]
    board: Option<Board>,
    #[serde(default)]
    winner: Option<Winner>,
    #[serde(default)]
    status: Option<RecordStatus>,
}

/// Runs a repository call on the blocking pool.
async fn blocking<T, F>(repository: &GameRepository, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&GameRepository) -> Result<T, DbError> + Send + 'static,
{
    let repository = repository.clone();
    tokio::task::spawn_blocking(move || f(&repository))
        .await
        .map_err(|e| ApiError::internal(format!("Database task failed: {e}")))?
        .map_err(ApiError::from)
}

fn not_found(id: i32) -> ApiError {
    ApiError::not_found(format!("game {id} not found"))
}

/// `GET /api/games`
#[instrument(skip(state))]
pub async fn list_games(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query
        .per_page
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE);

    let listed = blocking(state.repository(), move |repo| repo.list_games(page, per_page)).await?;
    let games = listed
        .records()
        .iter()
        .map(|record| record.to_view())
        .collect::<Result<Vec<_>, _>>()?;
    let total = *listed.total();

    Ok(Json(ListResponse {
        games,
        total,
        page,
        per_page,
        pages: (total + per_page - 1) / per_page,
    }))
}

/// `POST /api/games`
#[instrument(skip_all)]
pub async fn create_game(
    State(state): State<AppState>,
    payload: Result<Json<CreateRecordRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<GameRecordView>), ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let names = [
        &req.player_x_email,
        &req.player_x_nick,
        &req.player_o_email,
        &req.player_o_nick,
    ];
    if names.iter().any(|field| field.trim().is_empty()) {
        return Err(ApiError::bad_request("player emails and nicks are required"));
    }

    let record = NewGameRecord::new(
        req.player_x_email,
        req.player_x_nick,
        req.player_o_email,
        req.player_o_nick,
        serde_json::to_string(&req.board).map_err(|e| ApiError::bad_request(e.to_string()))?,
        req.winner.map(|w| w.as_ref().to_string()),
        req.status.as_ref().to_string(),
    );
    let created = blocking(state.repository(), move |repo| repo.create_game(record)).await?;
    info!(game_id = created.id(), "Game record created via API");
    Ok((StatusCode::CREATED, Json(created.to_view()?)))
}

/// `GET /api/games/{id}`
#[instrument(skip(state))]
pub async fn get_game(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<GameRecordView>, ApiError> {
    let found = blocking(state.repository(), move |repo| repo.get_game(id)).await?;
    let record = found.ok_or_else(|| not_found(id))?;
    Ok(Json(record.to_view()?))
}

/// `PUT /api/games/{id}`
#[instrument(skip(state, payload))]
pub async fn update_game(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    payload: Result<Json<UpdateRecordRequest>, JsonRejection>,
) -> Result<Json<GameRecordView>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let changes = GameRecordChanges::new(
        req.board.as_ref(),
        req.winner.map(|w| w.as_ref().to_string()),
        req.status,
    )?;

    let updated = blocking(state.repository(), move |repo| repo.update_game(id, changes)).await?;
    let record = updated.ok_or_else(|| not_found(id))?;
    Ok(Json(record.to_view()?))
}

/// `DELETE /api/games/{id}`
#[instrument(skip(state))]
pub async fn delete_game(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Ack>, ApiError> {
    if blocking(state.repository(), move |repo| repo.delete_game(id)).await? {
        Ok(Json(Ack { ok: true }))
    } else {
        Err(not_found(id))
    }
}

/// `GET /api/games/stats`
#[instrument(skip(state))]
pub async fn game_stats(State(state): State<AppState>) -> Result<Json<GameStats>, ApiError> {
    Ok(Json(blocking(state.repository(), GameRepository::stats).await?))
}

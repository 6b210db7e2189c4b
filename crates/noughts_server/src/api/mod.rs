//! REST API.
//!
//! - `POST /api/join`, `GET /api/state`, `POST /api/move`, `POST /api/reset`
//!   drive the live session.
//! - `/api/games` exposes stored records.
//! - `GET /api/quote` proxies the configured quote service.

mod error;
mod game;
mod quote;
mod records;

use axum::Router;
use axum::body::Body;
use axum::http::Request;
use axum::routing::{get, post};
use derive_getters::Getters;
use std::sync::Arc;
use tower::ServiceBuilder;
use tracing::info;

use crate::db::GameRepository;
use crate::session::Session;

pub use error::ApiError;
pub use game::{Ack, JoinResponse};
pub use quote::QuoteClient;
pub use records::{ListResponse, MAX_PER_PAGE};

/// Shared state handed to every handler.
#[derive(Debug, Clone, Getters)]
pub struct AppState {
    session: Arc<Session>,
    repository: GameRepository,
    quotes: QuoteClient,
}

impl AppState {
    /// Bundles the session and the outer collaborators.
    pub fn new(session: Arc<Session>, repository: GameRepository, quotes: QuoteClient) -> Self {
        Self {
            session,
            repository,
            quotes,
        }
    }
}

fn log_request(req: Request<Body>) -> Request<Body> {
    info!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
    req
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/join", post(game::join))
        .route("/api/state", get(game::get_state))
        .route("/api/move", post(game::make_move))
        .route("/api/reset", post(game::reset))
        .route(
            "/api/games",
            get(records::list_games).post(records::create_game),
        )
        .route("/api/games/stats", get(records::game_stats))
        .route(
            "/api/games/{id}",
            get(records::get_game)
                .put(records::update_game)
                .delete(records::delete_game),
        )
        .route("/api/quote", get(quote::get_quote))
        .with_state(state)
        .layer(ServiceBuilder::new().map_request(log_request))
}

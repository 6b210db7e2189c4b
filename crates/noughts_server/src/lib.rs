//! Noughts server library - one shared match behind a REST API.
//!
//! # Architecture
//!
//! - **Session**: the single live session (players + match) behind one lock
//! - **Dispatch**: background worker running the end-of-match collaborators
//! - **Collaborators**: SMTP notifier, database persister, game-log writer
//! - **API**: axum router for the game contract, stored records and quotes
//!
//! # Example
//!
//! ```no_run
//! use noughts_server::{Collaborators, LogNotifier, Session, spawn_finish_worker};
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let (sink, _worker) = spawn_finish_worker(Collaborators::new(Arc::new(LogNotifier), vec![]));
//! let session = Session::new(sink);
//! session.register_player("ann@example.com", "Ann").unwrap();
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod api;
mod config;
mod db;
mod dispatch;
mod game_log;
mod notify;
mod session;

// Crate-level exports - HTTP API
pub use api::{Ack, ApiError, AppState, JoinResponse, ListResponse, MAX_PER_PAGE, QuoteClient, router};

// Crate-level exports - Configuration
pub use config::{ConfigError, ServerConfig, SmtpConfig};

// Crate-level exports - Persistence
pub use db::{
    DbError, DbErrorKind, DbPersister, GamePage, GameRecord, GameRecordChanges, GameRecordView,
    GameRepository, GameStats, MIGRATIONS, NewGameRecord, PlayerView, RecordStatus,
};

// Crate-level exports - Finish dispatch and collaborators
pub use dispatch::{CollaboratorError, Collaborators, Notifier, Persister, spawn_finish_worker};
pub use game_log::GameLogWriter;
pub use notify::{LogNotifier, SmtpNotifier, compose};

// Crate-level exports - Session management
pub use session::{
    FinishSink, FinishedMatch, JoinRejection, MAX_PLAYERS, MoveRejection, MoveSnapshot, Player,
    Session, StateSnapshot,
};

// Crate-level exports - Game types
pub use noughts_game::{Board, Match, MoveOutcome, Position, RejectReason, Square, Symbol, Winner};

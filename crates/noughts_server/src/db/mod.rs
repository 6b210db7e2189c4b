//! Durable store of finished games.

mod error;
mod models;
mod persister;
mod repository;
mod schema; // Diesel generated schema - internal use only

use diesel_migrations::{EmbeddedMigrations, embed_migrations};

pub use error::{DbError, DbErrorKind};
pub use models::{
    GamePage, GameRecord, GameRecordChanges, GameRecordView, GameStats, NewGameRecord,
    PlayerView, RecordStatus,
};
pub use persister::DbPersister;
pub use repository::GameRepository;

/// Schema migrations compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

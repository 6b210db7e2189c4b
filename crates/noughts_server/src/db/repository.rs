//! Database repository for finished game records.

use diesel::prelude::*;
use diesel_migrations::MigrationHarness;
use tracing::{debug, info, instrument};

use crate::db::{
    DbError, DbErrorKind, GamePage, GameRecord, GameRecordChanges, GameStats, MIGRATIONS,
    NewGameRecord, schema,
};

/// Database repository for game records.
#[derive(Debug, Clone)]
pub struct GameRepository {
    db_path: String,
}

impl GameRepository {
    /// Creates a new repository for the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the path is empty.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn new(db_path: String) -> Result<Self, DbError> {
        if db_path.trim().is_empty() {
            return Err(DbError::new(DbErrorKind::Config, "Database path is empty"));
        }
        info!(path = %db_path, "Creating GameRepository");
        Ok(Self { db_path })
    }

    /// Establishes a database connection.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, DbError> {
        debug!(path = %self.db_path, "Establishing connection");
        SqliteConnection::establish(&self.db_path)
            .map_err(|e| {
                DbError::new(
                    DbErrorKind::Connection,
                    format!("Failed to connect to '{}': {}", self.db_path, e),
                )
            })
    }

    /// Applies any pending schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a migration fails.
    #[instrument(skip(self))]
    pub fn run_migrations(&self) -> Result<(), DbError> {
        let mut conn = self.connection()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| DbError::new(DbErrorKind::Migration, e.to_string()))?;
        info!(count = applied.len(), "Migrations applied");
        Ok(())
    }

    /// Inserts a record.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self, record), fields(player_x = %record.player_x_nick(), player_o = %record.player_o_nick()))]
    pub fn create_game(&self, record: NewGameRecord) -> Result<GameRecord, DbError> {
        debug!("Inserting game record");
        let mut conn = self.connection()?;

        let game = diesel::insert_into(schema::games::table)
            .values(&record)
            .returning(GameRecord::as_returning())
            .get_result(&mut conn)?;

        info!(game_id = game.id(), "Game record created");
        Ok(game)
    }

    /// Gets a record by id. Returns `None` if not found.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get_game(&self, id: i32) -> Result<Option<GameRecord>, DbError> {
        let mut conn = self.connection()?;

        let game = schema::games::table
            .find(id)
            .select(GameRecord::as_select())
            .first(&mut conn)
            .optional()?;

        debug!(found = game.is_some(), "Looked up game record");
        Ok(game)
    }

    /// Lists records newest first. `page` starts at 1; pages past the end are empty.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn list_games(&self, page: i64, per_page: i64) -> Result<GamePage, DbError> {
        let mut conn = self.connection()?;
        let offset = (page.max(1) - 1).saturating_mul(per_page.max(1));

        let total = schema::games::table.count().get_result::<i64>(&mut conn)?;
        let records = schema::games::table
            .select(GameRecord::as_select())
            .order((schema::games::created_at.desc(), schema::games::id.desc()))
            .limit(per_page)
            .offset(offset)
            .load(&mut conn)?;

        info!(total, returned = records.len(), "Game records listed");
        Ok(GamePage::new(records, total))
    }

    /// Applies a partial update. Returns `None` if the record does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self, changes))]
    pub fn update_game(
        &self,
        id: i32,
        changes: GameRecordChanges,
    ) -> Result<Option<GameRecord>, DbError> {
        let mut conn = self.connection()?;

        let game = diesel::update(schema::games::table.find(id))
            .set(&changes)
            .returning(GameRecord::as_returning())
            .get_result(&mut conn)
            .optional()?;

        info!(updated = game.is_some(), "Game record update");
        Ok(game)
    }

    /// Deletes a record. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn delete_game(&self, id: i32) -> Result<bool, DbError> {
        let mut conn = self.connection()?;
        let removed = diesel::delete(schema::games::table.find(id)).execute(&mut conn)?;
        info!(removed, "Game record delete");
        Ok(removed > 0)
    }

    /// Counts records by outcome.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn stats(&self) -> Result<GameStats, DbError> {
        use schema::games::dsl::{games, status, winner};
        let mut conn = self.connection()?;

        let total = games.count().get_result::<i64>(&mut conn)?;
        let x_wins = games.filter(winner.eq("X")).count().get_result::<i64>(&mut conn)?;
        let o_wins = games.filter(winner.eq("O")).count().get_result::<i64>(&mut conn)?;
        let draws = games.filter(winner.eq("DRAW")).count().get_result::<i64>(&mut conn)?;
        let completed = games
            .filter(status.eq("completed"))
            .count()
            .get_result::<i64>(&mut conn)?;

        let stats = GameStats::new(total, x_wins, o_wins, draws, completed);
        info!(?stats, "Game stats computed");
        Ok(stats)
    }
}

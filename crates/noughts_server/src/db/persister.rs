//! Saves finished matches as game records.

use async_trait::async_trait;
use tracing::instrument;

use crate::db::{GameRepository, NewGameRecord};
use crate::dispatch::{CollaboratorError, Persister};
use crate::session::FinishedMatch;

/// [`Persister`] backed by the SQLite repository.
#[derive(Debug, Clone)]
pub struct DbPersister {
    repository: GameRepository,
}

impl DbPersister {
    /// Creates a persister writing through `repository`.
    pub fn new(repository: GameRepository) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl Persister for DbPersister {
    fn name(&self) -> &'static str {
        "database"
    }

    #[instrument(skip(self, finished))]
    async fn save(&self, finished: &FinishedMatch) -> Result<(), CollaboratorError> {
        let record = NewGameRecord::from_finished(finished)
            .map_err(|e| CollaboratorError::new(e.to_string()))?;
        let repository = self.repository.clone();

        tokio::task::spawn_blocking(move || repository.create_game(record))
            .await
            .map_err(|e| CollaboratorError::new(format!("Persist task failed: {e}")))?
            .map_err(|e| CollaboratorError::new(e.to_string()))?;
        Ok(())
    }
}

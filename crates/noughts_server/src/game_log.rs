//! Plain-text log file per finished match.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

use crate::dispatch::{CollaboratorError, Persister};
use crate::session::FinishedMatch;

/// Writes `game_<timestamp>.txt` into a directory, creating it on demand.
#[derive(Debug, Clone)]
pub struct GameLogWriter {
    dir: PathBuf,
}

impl GameLogWriter {
    /// Creates a writer for the given directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Target directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name for a finished match.
    pub fn file_name(finished: &FinishedMatch) -> String {
        format!(
            "game_{}.txt",
            finished.finished_at().format("%Y%m%d_%H%M%S_%3f")
        )
    }

    /// Log contents for a finished match.
    pub fn render(finished: &FinishedMatch) -> String {
        format!(
            "Date: {}\nResult: {}\nBoard: {:?}\n",
            finished.finished_at().format("%Y-%m-%d %H:%M:%S"),
            finished.winner().summary(),
            finished.board().tokens(),
        )
    }
}

#[async_trait]
impl Persister for GameLogWriter {
    fn name(&self) -> &'static str {
        "game_log"
    }

    #[instrument(skip(self, finished), fields(dir = %self.dir.display()))]
    async fn save(&self, finished: &FinishedMatch) -> Result<(), CollaboratorError> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            CollaboratorError::new(format!("Failed to create {}: {e}", self.dir.display()))
        })?;

        let path = self.dir.join(Self::file_name(finished));
        tokio::fs::write(&path, Self::render(finished))
            .await
            .map_err(|e| CollaboratorError::new(format!("Failed to write {}: {e}", path.display())))?;

        info!(path = %path.display(), "Game log written");
        Ok(())
    }
}

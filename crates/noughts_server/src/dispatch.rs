//! Background worker that runs the end-of-match collaborators.

use async_trait::async_trait;
use derive_more::{Display, Error};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{debug, error, info, instrument, warn};

use crate::session::FinishedMatch;

/// Collaborator failure with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Collaborator error: {} at {}:{}", message, file, line)]
pub struct CollaboratorError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl CollaboratorError {
    /// Creates a new collaborator error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// Tells participants how a match ended.
#[async_trait]
pub trait Notifier: std::fmt::Debug + Send + Sync {
    /// Sends the result to every recipient. Best effort.
    async fn notify(
        &self,
        finished: &FinishedMatch,
        recipients: &[String],
    ) -> Result<(), CollaboratorError>;
}

/// Stores a durable copy of a finished match.
#[async_trait]
pub trait Persister: std::fmt::Debug + Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Saves the match. Best effort.
    async fn save(&self, finished: &FinishedMatch) -> Result<(), CollaboratorError>;
}

/// Everything that runs when a match finishes.
#[derive(Debug, Clone)]
pub struct Collaborators {
    notifier: Arc<dyn Notifier>,
    persisters: Vec<Arc<dyn Persister>>,
}

impl Collaborators {
    /// Creates the collaborator set.
    pub fn new(notifier: Arc<dyn Notifier>, persisters: Vec<Arc<dyn Persister>>) -> Self {
        Self {
            notifier,
            persisters,
        }
    }

    /// Spawns one task per collaborator into `tasks`. Failures are logged only.
    #[instrument(skip(self, finished, tasks), fields(winner = %finished.winner()))]
    pub fn spawn_all(&self, finished: Arc<FinishedMatch>, tasks: &mut JoinSet<()>) {
        let notifier = Arc::clone(&self.notifier);
        let match_for_mail = Arc::clone(&finished);
        tasks.spawn(async move {
            let recipients = match_for_mail.recipients();
            match notifier.notify(&match_for_mail, &recipients).await {
                Ok(()) => info!(?recipients, "Participants notified"),
                Err(e) => warn!(error = %e, "Notification failed"),
            }
        });

        for persister in &self.persisters {
            let persister = Arc::clone(persister);
            let finished = Arc::clone(&finished);
            tasks.spawn(async move {
                match persister.save(&finished).await {
                    Ok(()) => info!(persister = persister.name(), "Finished match saved"),
                    Err(e) => error!(persister = persister.name(), error = %e, "Persisting failed"),
                }
            });
        }
    }
}

fn log_join(result: Result<(), JoinError>) {
    if let Err(e) = result {
        error!(error = %e, "Collaborator task panicked or was cancelled");
    }
}

/// Starts the finish worker.
///
/// Returns the sender half to hand to the session and the worker handle.
/// Once every sender is dropped the worker waits for the collaborator tasks
/// still in flight, then stops. Awaiting the handle therefore means every
/// finished match has been notified and persisted (or failed trying).
#[instrument(skip(collaborators))]
pub fn spawn_finish_worker(
    collaborators: Collaborators,
) -> (mpsc::UnboundedSender<FinishedMatch>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<FinishedMatch>();
    let handle = tokio::spawn(async move {
        info!("Finish worker started");
        let mut tasks = JoinSet::new();
        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Some(finished) => {
                        debug!(winner = %finished.winner(), "Dispatching finished match");
                        collaborators.spawn_all(Arc::new(finished), &mut tasks);
                    }
                    None => break,
                },
                Some(result) = tasks.join_next(), if !tasks.is_empty() => log_join(result),
            }
        }

        debug!(pending = tasks.len(), "Channel closed, draining collaborator tasks");
        while let Some(result) = tasks.join_next().await {
            log_join(result);
        }
        info!("Finish worker stopped");
    });
    (tx, handle)
}

//! Errors raised by the game store.

use derive_more::{Display, Error};
use tracing::instrument;

/// Which step of a store call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum DbErrorKind {
    /// Bad repository settings, e.g. an empty path.
    #[display("config")]
    Config,
    /// The SQLite file could not be opened.
    #[display("connection")]
    Connection,
    /// Schema migrations failed.
    #[display("migration")]
    Migration,
    /// A statement failed.
    #[display("query")]
    Query,
    /// A board column could not be encoded or decoded.
    #[display("board encoding")]
    Encoding,
}

impl DbErrorKind {
    /// True when the store itself is unreachable rather than a single call failing.
    pub fn is_unavailable(self) -> bool {
        matches!(self, DbErrorKind::Connection | DbErrorKind::Migration)
    }
}

/// Game store failure, tagged with its kind and the call site that raised it.
#[derive(Debug, Clone, Display, Error)]
#[display("Game store {} error: {} ({}:{})", kind, message, file, line)]
pub struct DbError {
    /// Failing step.
    pub kind: DbErrorKind,
    /// Detail.
    pub message: String,
    /// Line that raised the error.
    pub line: u32,
    /// File that raised the error.
    pub file: &'static str,
}

impl DbError {
    /// Creates an error of the given kind at the caller's location.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(kind: DbErrorKind, message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<diesel::result::Error> for DbError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        Self::new(DbErrorKind::Query, err.to_string())
    }
}

impl From<diesel::ConnectionError> for DbError {
    #[track_caller]
    fn from(err: diesel::ConnectionError) -> Self {
        Self::new(DbErrorKind::Connection, err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Self::new(DbErrorKind::Encoding, err.to_string())
    }
}

//! Error types for pomotrack.

use thiserror::Error;

use crate::sync::SyncError;

/// Errors surfaced by the record store, configuration, and command layer.
#[derive(Error, Debug)]
pub enum PomotrackError {
    /// `SQLite` failure (open, migrate, query, transaction).
    #[error("Database error: {0}")]
    Database(String),

    /// Configuration or path resolution failure.
    #[error("Config error: {0}")]
    Config(String),

    /// Filesystem failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A record addressed by id does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// JSON encoding or decoding failure outside the sync codec.
    #[error("Parse error: {0}")]
    Parse(String),

    /// User-supplied value was rejected.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Push or pull failed.
    #[error(transparent)]
    Sync(#[from] SyncError),
}

impl From<serde_json::Error> for PomotrackError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<rusqlite::Error> for PomotrackError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}

//! Error types for snapshot sync.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Which collection a rejected record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Session,
    Task,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Session => write!(f, "session"),
            Self::Task => write!(f, "task"),
        }
    }
}

/// Why a downloaded snapshot was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Not JSON, or not an object with `sessions` and `tasks` arrays.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// A single entry failed required-field validation.
    #[error("invalid {kind} record at index {index}: {reason}")]
    InvalidRecord {
        kind: RecordKind,
        index: usize,
        reason: String,
    },
}

/// Failure talking to the remote blob store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The object does not exist.
    #[error("object '{0}' not found")]
    NotFound(String),

    /// Credentials were rejected.
    #[error("access denied: {0}")]
    Unauthorized(String),

    /// The store answered with an error status.
    #[error("remote returned {status}: {detail}")]
    Remote { status: u16, detail: String },

    /// The request never completed (DNS, TLS, connection, timeout).
    #[error("network error: {0}")]
    Network(String),

    /// Local filesystem failure in a directory-backed store.
    #[error("io error: {0}")]
    Io(String),
}

/// Errors that end a push or pull.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Network, auth, or remote-side failure during put or get.
    #[error("remote transport error: {0}")]
    RemoteTransport(#[from] TransportError),

    /// Downloaded snapshot failed validation; the local store was not touched.
    #[error("invalid sync payload: {0}")]
    InvalidSyncPayload(#[from] DecodeError),

    /// Credentials are incomplete.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Reading or replacing local records failed.
    #[error("local store error: {0}")]
    Store(String),

    /// The background worker running the exchange panicked or was cancelled.
    #[error("sync task failed: {0}")]
    Task(String),
}

impl SyncError {
    /// Whether retrying the whole operation could succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RemoteTransport(TransportError::Network(_) | TransportError::Remote { .. })
        )
    }
}

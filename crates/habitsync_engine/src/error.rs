//! Error types for the sync engine and its collaborators.

use habitsync_core::{HabitId, ModelError};
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Result type for local store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for remote service operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Errors surfaced to callers of the engine.
///
/// Remote failures never appear here: the remote is a best-effort mirror.
#[derive(Error, Debug)]
pub enum EngineError {
    /// No habit with this id exists in the local store.
    #[error("habit not found: {0}")]
    NotFound(HabitId),

    /// The local store failed. Fatal to the operation.
    #[error("local store error: {0}")]
    Store(#[from] StoreError),

    /// A stored record could not be converted back into a habit.
    #[error("corrupt local record for habit {id}: {source}")]
    CorruptRecord {
        /// Id of the unreadable record.
        id: HabitId,
        /// Conversion failure.
        #[source]
        source: ModelError,
    },

    /// The habit was rejected before reaching the store.
    #[error("invalid habit: {0}")]
    InvalidHabit(String),
}

impl EngineError {
    /// Returns true if this is the recoverable not-found condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::NotFound(_))
    }
}

/// Errors raised by a local habit store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot could not be encoded or decoded.
    #[error("snapshot encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// Snapshot is readable but not usable.
    #[error("corrupt snapshot: {0}")]
    Corrupt(String),

    /// The store refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised by the remote habit service.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Network or transport error.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// Response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Request body could not be encoded.
    #[error("encode error: {0}")]
    Encode(String),

    /// Timeout.
    #[error("operation timed out")]
    Timeout,

    /// Not connected.
    #[error("not connected to remote service")]
    NotConnected,
}

impl RemoteError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if this error could succeed on a later attempt.
    ///
    /// The engine never retries; this only classifies failures for logs.
    pub fn is_retryable(&self) -> bool {
        match self {
            RemoteError::Transport { retryable, .. } => *retryable,
            RemoteError::Timeout | RemoteError::NotConnected => true,
            RemoteError::Decode(_) | RemoteError::Encode(_) => false,
        }
    }
}

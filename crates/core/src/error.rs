//! Errors at the collaborator boundaries

use thiserror::Error;

/// Durable storage write failures
///
/// The store treats every variant the same way: the batch is not
/// persisted and is demoted to the garbage sink.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend could not be reached
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    /// Backend rejected the batch
    #[error("storage write rejected: {0}")]
    Rejected(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// External record update failures
#[derive(Debug, Error)]
pub enum RecordError {
    /// No record for the event
    #[error("record not found: {0}")]
    NotFound(String),

    /// Backend failure
    #[error("record backend error: {0}")]
    Backend(String),
}

//! Unified error type for the event log facade.
//!
//! Ingestion and command submission never fail. Errors only come out of
//! building the event log and of explicit garbage flushes.

use eventlog_durability::GarbageError;
use eventlog_engine::ConfigError;
use thiserror::Error;

/// All event log errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded or is invalid
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A required collaborator was not supplied to the builder
    #[error("missing collaborator: {0}")]
    MissingCollaborator(&'static str),

    /// No Tokio runtime to run the background loops on
    #[error("runtime unavailable: {0}")]
    Runtime(String),

    /// Garbage store error
    #[error("garbage error: {0}")]
    Garbage(#[from] GarbageError),
}

/// Result type for event log operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this is a configuration error.
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    /// Check if the builder was missing a collaborator.
    pub fn is_missing_collaborator(&self) -> bool {
        matches!(self, Error::MissingCollaborator(_))
    }
}

//! Garbage sink errors

use std::path::PathBuf;
use thiserror::Error;

/// Errors writing garbage messages to their fallback target
#[derive(Debug, Error)]
pub enum GarbageError {
    /// Appending to the garbage file failed
    #[error("failed to append garbage file {path}: {source}")]
    Append {
        /// Target file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Fallback target cannot accept writes
    #[error("garbage store unavailable: {0}")]
    Unavailable(String),
}

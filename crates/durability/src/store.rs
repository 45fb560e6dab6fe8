//! Append targets for garbage messages

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use eventlog_core::Message;
use serde::Deserialize;

use crate::error::GarbageError;

/// Render one garbage line: `(<step>-<level>) <time>: <message>\n`
pub fn format_line(message: &Message) -> String {
    format!("{}\n", message)
}

/// Fallback target for messages that missed durable storage
pub trait GarbageStore: Send + Sync {
    /// Append a batch in order.
    fn save(&self, batch: &[Message]) -> Result<(), GarbageError>;
}

/// Strategy selector for the garbage store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GarbageSaveType {
    /// Append to a local text file
    #[default]
    File,
}

impl GarbageSaveType {
    /// Build the configured store.
    pub fn build(self, path: impl Into<PathBuf>) -> Arc<dyn GarbageStore> {
        match self {
            GarbageSaveType::File => Arc::new(FileGarbageStore::new(path)),
        }
    }
}

/// Appends garbage lines to a text file
///
/// No header, no rotation. Parent directories are created on first write.
#[derive(Debug, Clone)]
pub struct FileGarbageStore {
    path: PathBuf,
}

impl FileGarbageStore {
    /// Create a store appending to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Target file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, content: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(content.as_bytes())?;
        file.flush()
    }
}

impl GarbageStore for FileGarbageStore {
    fn save(&self, batch: &[Message]) -> Result<(), GarbageError> {
        if batch.is_empty() {
            return Ok(());
        }
        let content: String = batch.iter().map(format_line).collect();
        self.append(&content).map_err(|source| GarbageError::Append {
            path: self.path.clone(),
            source,
        })
    }
}

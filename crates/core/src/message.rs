//! Event log messages
//!
//! A [`Message`] is produced by the upstream transport and consumed
//! read-only by the store. The `step` field drives barrel behaviour
//! (see [`Step`]).

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix stripped from `code-version` step messages.
pub const CODE_VERSION_PREFIX: &str = "Code Version:";

/// A single log line for one event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Event identifier the message belongs to
    pub event_id: String,
    /// Pipeline step that produced the message (e.g. `build`, `last`)
    pub step: String,
    /// Step status, only meaningful for `last`/`callback` steps
    #[serde(default)]
    pub status: String,
    /// Log level (`info`, `debug`, `error`)
    pub level: String,
    /// Timestamp as formatted by the producer
    pub time: String,
    /// Free-text content
    pub message: String,
}

impl Message {
    /// Create an `info` message stamped with the current time.
    pub fn new(
        event_id: impl Into<String>,
        step: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            step: step.into(),
            status: String::new(),
            level: "info".to_string(),
            time: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            message: message.into(),
        }
    }

    /// Set the log level.
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Set the step status.
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// Override the producer timestamp.
    #[must_use]
    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = time.into();
        self
    }

    /// Classify the step.
    pub fn step_kind(&self) -> Step {
        Step::parse(&self.step)
    }

    /// Code version carried by a `code-version` step, prefix removed.
    pub fn code_version(&self) -> String {
        self.message
            .replacen(CODE_VERSION_PREFIX, "", 1)
            .trim()
            .to_string()
    }
}

/// Renders the garbage-file line body: `(<step>-<level>) <time>: <message>`
impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}-{}) {}: {}",
            self.step, self.level, self.time, self.message
        )
    }
}

/// Steps with special meaning to a barrel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Final message of an event
    Last,
    /// Status callback from the pipeline
    Callback,
    /// Source code version report
    CodeVersion,
    /// Any other step
    Other,
}

impl Step {
    /// Parse a raw step name.
    pub fn parse(step: &str) -> Self {
        match step {
            "last" => Step::Last,
            "callback" => Step::Callback,
            "code-version" => Step::CodeVersion,
            _ => Step::Other,
        }
    }

    /// Whether the step closes the event and triggers a status callback.
    pub fn is_terminal(self) -> bool {
        matches!(self, Step::Last | Step::Callback)
    }
}

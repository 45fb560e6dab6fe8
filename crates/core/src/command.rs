//! Out-of-band store commands
//!
//! Commands reach the store either from barrels (a terminal step, a
//! code-version report, a full buffer) or from external senders that
//! still speak the untyped string form:
//!
//! ```text
//! ["persistence", event_id]
//! ["callback", event_id, status, message]
//! ["code-version", event_id, code_version]
//! ```
//!
//! [`StoreCommand::parse`] converts the string form and returns `None`
//! for anything malformed; callers drop those silently.

/// A command processed serially by the store's command loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCommand {
    /// Write the barrel's staged messages to durable storage.
    Persistence {
        /// Target event
        event_id: String,
    },
    /// Report the event's final status.
    Callback {
        /// Target event
        event_id: String,
        /// Reported status
        status: String,
        /// Reported message
        message: String,
    },
    /// Record the source code version built by the event.
    CodeVersion {
        /// Target event
        event_id: String,
        /// Code version, trimmed
        code_version: String,
    },
}

impl StoreCommand {
    /// Parse the untyped string form.
    ///
    /// Returns `None` for an empty sequence, an unknown verb or the wrong
    /// number of arguments.
    pub fn parse<S: AsRef<str>>(parts: &[S]) -> Option<Self> {
        let (verb, args) = parts.split_first()?;
        match (verb.as_ref(), args) {
            ("persistence", [event_id]) => Some(StoreCommand::Persistence {
                event_id: event_id.as_ref().to_string(),
            }),
            ("callback", [event_id, status, message]) => Some(StoreCommand::Callback {
                event_id: event_id.as_ref().to_string(),
                status: status.as_ref().to_string(),
                message: message.as_ref().to_string(),
            }),
            ("code-version", [event_id, code_version]) => Some(StoreCommand::CodeVersion {
                event_id: event_id.as_ref().to_string(),
                code_version: code_version.as_ref().trim().to_string(),
            }),
            _ => None,
        }
    }

    /// Command verb as used in the string form.
    pub fn verb(&self) -> &'static str {
        match self {
            StoreCommand::Persistence { .. } => "persistence",
            StoreCommand::Callback { .. } => "callback",
            StoreCommand::CodeVersion { .. } => "code-version",
        }
    }

    /// Event the command targets.
    pub fn event_id(&self) -> &str {
        match self {
            StoreCommand::Persistence { event_id }
            | StoreCommand::Callback { event_id, .. }
            | StoreCommand::CodeVersion { event_id, .. } => event_id,
        }
    }
}

//! External record models touched by command processing

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parameters passed to a webhook dispatch
pub type WebhookParams = BTreeMap<String, String>;

/// Webhook kinds fired by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WebhookEvent {
    /// An event's status changed
    UpdateEventStatus,
    /// An event reported its code version
    UpdateEventCodeVersion,
}

impl WebhookEvent {
    /// Stable name used by webhook receivers.
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookEvent::UpdateEventStatus => "UpDateEventStatus",
            WebhookEvent::UpdateEventCodeVersion => "UpdateEventCodeVersion",
        }
    }
}

/// Partial update of a service event record
///
/// Only fields that are `Some` are written; the rest are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEventUpdate {
    /// Key of the record
    pub event_id: String,
    /// New status
    pub status: Option<String>,
    /// New status message
    pub message: Option<String>,
    /// New code version
    pub code_version: Option<String>,
}

impl ServiceEventUpdate {
    /// Status/message update.
    pub fn status(
        event_id: impl Into<String>,
        status: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            status: Some(status.into()),
            message: Some(message.into()),
            code_version: None,
        }
    }

    /// Code-version update.
    pub fn code_version(event_id: impl Into<String>, code_version: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            code_version: Some(code_version.into()),
            ..Default::default()
        }
    }
}

/// Build version record associated with an event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    /// Event that produced the build
    pub event_id: String,
    /// Build version label
    pub build_version: String,
    /// Source code version
    pub code_version: String,
    /// Final build status
    pub final_status: String,
}

//! Collaborator traits
//!
//! The store is constructed with explicit implementations of these
//! traits. None of them is allowed to panic the store: every error is
//! logged and absorbed by the caller.

use crate::error::{RecordError, StorageError};
use crate::message::Message;
use crate::models::{ServiceEventUpdate, VersionInfo, WebhookEvent, WebhookParams};

/// Durable storage for flushed message batches
///
/// Implementations must tolerate the same batch being offered again;
/// the store itself never retries.
pub trait MessageSink: Send + Sync {
    /// Persist one batch in order.
    fn save_messages(&self, batch: &[Message]) -> Result<(), StorageError>;
}

/// Webhook dispatch, fire-and-forget
pub trait WebhookDispatcher: Send + Sync {
    /// Fire the webhooks registered for `event`.
    fn run_webhook_with_parameter(&self, event: WebhookEvent, params: WebhookParams);
}

/// Update-by-model access to the service event and version info records
pub trait EventRecordStore: Send + Sync {
    /// Apply a partial update to the service event keyed by `update.event_id`.
    fn update_service_event(&self, update: &ServiceEventUpdate) -> Result<(), RecordError>;

    /// Look up the version info produced by an event.
    fn version_by_event_id(&self, event_id: &str) -> Result<Option<VersionInfo>, RecordError>;

    /// Overwrite a version info record.
    fn update_version_info(&self, info: &VersionInfo) -> Result<(), RecordError>;
}

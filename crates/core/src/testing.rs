//! In-memory collaborators
//!
//! Used by the unit and integration tests across the workspace, and
//! handy for running the store without a database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::error::{RecordError, StorageError};
use crate::message::Message;
use crate::models::{ServiceEventUpdate, VersionInfo, WebhookEvent, WebhookParams};
use crate::traits::{EventRecordStore, MessageSink, WebhookDispatcher};

// ============================================================================
// Message sink
// ============================================================================

/// Records every saved batch; can be switched to fail
#[derive(Debug, Default)]
pub struct MemoryMessageSink {
    batches: Mutex<Vec<Vec<Message>>>,
    failing: AtomicBool,
}

impl MemoryMessageSink {
    /// Create a sink that accepts every batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink that rejects every batch.
    pub fn failing() -> Self {
        let sink = Self::default();
        sink.set_failing(true);
        sink
    }

    /// Toggle failure mode.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Batches saved so far, in call order.
    pub fn batches(&self) -> Vec<Vec<Message>> {
        self.batches.lock().clone()
    }

    /// All saved messages flattened in call order.
    pub fn messages(&self) -> Vec<Message> {
        self.batches.lock().iter().flatten().cloned().collect()
    }

    /// Saved messages for one event.
    pub fn messages_for(&self, event_id: &str) -> Vec<Message> {
        self.messages()
            .into_iter()
            .filter(|m| m.event_id == event_id)
            .collect()
    }
}

impl MessageSink for MemoryMessageSink {
    fn save_messages(&self, batch: &[Message]) -> Result<(), StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("memory sink set to fail".into()));
        }
        self.batches.lock().push(batch.to_vec());
        Ok(())
    }
}

// ============================================================================
// Webhooks
// ============================================================================

/// Records webhook dispatches
#[derive(Debug, Default)]
pub struct RecordingWebhookDispatcher {
    calls: Mutex<Vec<(WebhookEvent, WebhookParams)>>,
}

impl RecordingWebhookDispatcher {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatches so far, in call order.
    pub fn calls(&self) -> Vec<(WebhookEvent, WebhookParams)> {
        self.calls.lock().clone()
    }
}

impl WebhookDispatcher for RecordingWebhookDispatcher {
    fn run_webhook_with_parameter(&self, event: WebhookEvent, params: WebhookParams) {
        self.calls.lock().push((event, params));
    }
}

// ============================================================================
// Event records
// ============================================================================

/// Stored state of a service event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceEventRecord {
    /// Status
    pub status: String,
    /// Status message
    pub message: String,
    /// Code version
    pub code_version: String,
}

/// HashMap-backed service event and version info records
#[derive(Debug, Default)]
pub struct MemoryEventRecordStore {
    service_events: Mutex<HashMap<String, ServiceEventRecord>>,
    versions: Mutex<HashMap<String, VersionInfo>>,
    updates: Mutex<Vec<ServiceEventUpdate>>,
}

impl MemoryEventRecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a version info record.
    pub fn insert_version(&self, info: VersionInfo) {
        self.versions.lock().insert(info.event_id.clone(), info);
    }

    /// Current service event record.
    pub fn service_event(&self, event_id: &str) -> Option<ServiceEventRecord> {
        self.service_events.lock().get(event_id).cloned()
    }

    /// Current version info record.
    pub fn version(&self, event_id: &str) -> Option<VersionInfo> {
        self.versions.lock().get(event_id).cloned()
    }

    /// Service event updates applied so far, in call order.
    pub fn updates(&self) -> Vec<ServiceEventUpdate> {
        self.updates.lock().clone()
    }
}

impl EventRecordStore for MemoryEventRecordStore {
    fn update_service_event(&self, update: &ServiceEventUpdate) -> Result<(), RecordError> {
        let mut events = self.service_events.lock();
        let record = events.entry(update.event_id.clone()).or_default();
        if let Some(status) = &update.status {
            record.status = status.clone();
        }
        if let Some(message) = &update.message {
            record.message = message.clone();
        }
        if let Some(code_version) = &update.code_version {
            record.code_version = code_version.clone();
        }
        self.updates.lock().push(update.clone());
        Ok(())
    }

    fn version_by_event_id(&self, event_id: &str) -> Result<Option<VersionInfo>, RecordError> {
        Ok(self.versions.lock().get(event_id).cloned())
    }

    fn update_version_info(&self, info: &VersionInfo) -> Result<(), RecordError> {
        let mut versions = self.versions.lock();
        match versions.get_mut(&info.event_id) {
            Some(existing) => {
                *existing = info.clone();
                Ok(())
            }
            None => Err(RecordError::NotFound(info.event_id.clone())),
        }
    }
}

//! Main entry point for the event log.
//!
//! This module provides the `EventLog` handle and its builder.

use std::sync::Arc;

use eventlog_core::{EventRecordStore, Message, MessageSink, StoreCommand, WebhookDispatcher};
use eventlog_durability::GarbageStore;
use eventlog_engine::{
    Collaborators, GaugeSample, MessageStore, MetricsReporter, MonitorData, StoreConfig,
    StoreMetrics,
};
use tracing::info;

use crate::error::{Error, Result};

/// The event log write buffer.
///
/// Create one with [`EventLog::builder`]. Dropping the handle does not
/// flush; call [`EventLog::stop`] for a complete shutdown.
///
/// # Example
///
/// ```ignore
/// use eventlog::prelude::*;
///
/// let log = EventLog::builder()
///     .config(StoreConfig::load("eventlog.toml")?)
///     .sink(Arc::new(my_sink))
///     .webhooks(Arc::new(my_webhooks))
///     .records(Arc::new(my_records))
///     .start()?;
///
/// log.insert_message(Message::new("E1", "build", "compiling"));
/// log.send_raw_command(&["persistence", "E1"]);
///
/// log.stop().await;
/// ```
#[derive(Debug, Clone)]
pub struct EventLog {
    store: Arc<MessageStore>,
}

impl EventLog {
    /// Create a builder.
    pub fn builder() -> EventLogBuilder {
        EventLogBuilder::new()
    }

    /// Buffer a message. Never fails; see [`MessageStore::insert_message`].
    pub fn insert_message(&self, message: Message) {
        self.store.insert_message(message);
    }

    /// Queue a typed command.
    pub fn send_command(&self, command: StoreCommand) {
        self.store.send_command(command);
    }

    /// Queue a command in its string form. Malformed commands are dropped.
    pub fn send_raw_command<S: AsRef<str>>(&self, parts: &[S]) {
        self.store.send_raw_command(parts);
    }

    /// Current counters.
    pub fn metrics(&self) -> StoreMetrics {
        self.store.metrics()
    }

    /// Load figures since the last sweep tick.
    pub fn monitor_data(&self) -> MonitorData {
        self.store.monitor_data()
    }

    /// Gauges for an external collector.
    pub fn scrape(&self, namespace: &str, exporter: &str, from: &str) -> Vec<GaugeSample> {
        self.store.scrape(namespace, exporter, from)
    }

    /// Ask the garbage loop to flush now.
    pub fn trigger_garbage_flush(&self) {
        self.store.garbage().trigger();
    }

    /// Flush the garbage buffer on the calling thread.
    ///
    /// Returns the number of messages written.
    pub fn flush_garbage(&self) -> Result<usize> {
        self.store.garbage().flush().map_err(Error::from)
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<MessageStore> {
        &self.store
    }

    /// Stop the background loops and flush every buffered message.
    ///
    /// Idempotent.
    pub async fn stop(&self) {
        self.store.stop().await;
    }
}

/// Builder for an [`EventLog`].
///
/// The three collaborators are required.
#[derive(Default)]
pub struct EventLogBuilder {
    config: StoreConfig,
    sink: Option<Arc<dyn MessageSink>>,
    webhooks: Option<Arc<dyn WebhookDispatcher>>,
    records: Option<Arc<dyn EventRecordStore>>,
    garbage_store: Option<Arc<dyn GarbageStore>>,
}

impl EventLogBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `config` instead of the defaults.
    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Durable storage for flushed batches.
    pub fn sink(mut self, sink: Arc<dyn MessageSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Webhook dispatcher.
    pub fn webhooks(mut self, webhooks: Arc<dyn WebhookDispatcher>) -> Self {
        self.webhooks = Some(webhooks);
        self
    }

    /// Service event and version info records.
    pub fn records(mut self, records: Arc<dyn EventRecordStore>) -> Self {
        self.records = Some(records);
        self
    }

    /// Override the garbage store selected by the config.
    pub fn garbage_store(mut self, store: Arc<dyn GarbageStore>) -> Self {
        self.garbage_store = Some(store);
        self
    }

    /// Build without starting the background loops.
    pub fn build(self) -> Result<EventLog> {
        let collaborators = Collaborators {
            sink: self.sink.ok_or(Error::MissingCollaborator("sink"))?,
            webhooks: self.webhooks.ok_or(Error::MissingCollaborator("webhooks"))?,
            records: self.records.ok_or(Error::MissingCollaborator("records"))?,
        };
        let store = match self.garbage_store {
            Some(garbage) => MessageStore::with_garbage_store(self.config, collaborators, garbage)?,
            None => MessageStore::new(self.config, collaborators)?,
        };
        Ok(EventLog { store })
    }

    /// Build and start the background loops on the current Tokio runtime.
    pub fn start(self) -> Result<EventLog> {
        tokio::runtime::Handle::try_current().map_err(|e| Error::Runtime(e.to_string()))?;
        let log = self.build()?;
        log.store.run();
        info!(
            garbage_file = %log.store.config().garbage_message_file.display(),
            "Event log started"
        );
        Ok(log)
    }
}

impl std::fmt::Debug for EventLogBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLogBuilder")
            .field("config", &self.config)
            .field("sink", &self.sink.is_some())
            .field("webhooks", &self.webhooks.is_some())
            .field("records", &self.records.is_some())
            .finish()
    }
}

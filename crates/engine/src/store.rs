//! Message store: barrel index, ingestion and flush-with-fallback
//!
//! # Locking
//!
//! ```text
//! index RwLock
//!   read  : insert into an existing barrel, targeted persistence
//!   write : create-on-miss (double-checked), sweep, shutdown drain
//! barrel persistence Mutex -> barrel buffer Mutex
//! garbage buffer Mutex (leaf, never held while taking another lock)
//! ```
//!
//! The index lock is always taken before any per-barrel lock.

use std::collections::hash_map::Entry;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use eventlog_core::{EventRecordStore, Message, MessageSink, StoreCommand, WebhookDispatcher};
use eventlog_durability::{GarbageSink, GarbageStore};
use eventlog_storage::{Barrel, BarrelPool, BarrelSignals, InsertError};
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::config::{ConfigError, StoreConfig};
use crate::metrics::{GaugeSample, MetricsReporter, MonitorData, StoreCounters, StoreMetrics};

/// External collaborators the store calls into
#[derive(Clone)]
pub struct Collaborators {
    /// Durable storage for flushed batches
    pub sink: Arc<dyn MessageSink>,
    /// Webhook dispatch for callbacks and code-version reports
    pub webhooks: Arc<dyn WebhookDispatcher>,
    /// Service event and version info records
    pub records: Arc<dyn EventRecordStore>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

/// In-memory write buffer for event log messages
///
/// Messages are grouped per event identifier into [`Barrel`]s. Idle
/// barrels are flushed to the [`MessageSink`] by the sweep; batches the
/// sink rejects are demoted to the [`GarbageSink`].
///
/// Background work starts with [`MessageStore::run`] and ends with
/// [`MessageStore::stop`].
pub struct MessageStore {
    pub(crate) barrels: RwLock<FxHashMap<String, Box<Barrel>>>,
    pub(crate) pool: BarrelPool,
    pub(crate) garbage: Arc<GarbageSink>,
    pub(crate) collaborators: Collaborators,
    pub(crate) config: StoreConfig,
    pub(crate) counters: StoreCounters,
    pub(crate) commands_tx: mpsc::UnboundedSender<StoreCommand>,
    pub(crate) commands_rx: Mutex<Option<mpsc::UnboundedReceiver<StoreCommand>>>,
    pub(crate) cancel: CancellationToken,
    pub(crate) loops: Mutex<Vec<JoinHandle<()>>>,
    pub(crate) garbage_task: Mutex<Option<JoinHandle<()>>>,
    pub(crate) stopped: AtomicBool,
}

impl MessageStore {
    /// Create a store with the garbage store selected by `config`.
    pub fn new(config: StoreConfig, collaborators: Collaborators) -> Result<Arc<Self>, ConfigError> {
        let garbage_store = config
            .garbage_save_type
            .build(config.garbage_message_file.clone());
        Self::with_garbage_store(config, collaborators, garbage_store)
    }

    /// Create a store writing fallback batches to `garbage_store`.
    pub fn with_garbage_store(
        config: StoreConfig,
        collaborators: Collaborators,
        garbage_store: Arc<dyn GarbageStore>,
    ) -> Result<Arc<Self>, ConfigError> {
        config.validate()?;
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        Ok(Arc::new(Self {
            barrels: RwLock::new(FxHashMap::default()),
            pool: BarrelPool::new(config.barrel_limits(), config.pool_max_idle),
            garbage: Arc::new(GarbageSink::new(
                garbage_store,
                config.garbage_sink_config(),
            )),
            collaborators,
            config,
            counters: StoreCounters::default(),
            commands_tx,
            commands_rx: Mutex::new(Some(commands_rx)),
            cancel: CancellationToken::new(),
            loops: Mutex::new(Vec::new()),
            garbage_task: Mutex::new(None),
            stopped: AtomicBool::new(false),
        }))
    }

    // ========================================================================
    // Ingestion
    // ========================================================================

    /// Buffer a message under its event identifier.
    ///
    /// Messages without an event identifier are ignored. A message the
    /// barrel rejects goes to the garbage sink; nothing is reported back.
    /// Once the store is stopped messages bypass the index and are written
    /// straight through.
    pub fn insert_message(&self, message: Message) {
        if message.event_id.is_empty() {
            return;
        }
        self.counters.record_message();

        let message = {
            let barrels = self.barrels.read();
            if self.is_stopped() {
                self.write_through(message);
                return;
            }
            match barrels.get(&message.event_id) {
                Some(barrel) => {
                    self.after_insert(barrel.insert(message));
                    return;
                }
                None => message,
            }
        };

        let mut barrels = self.barrels.write();
        // The drain may have run between the locks.
        if self.is_stopped() {
            drop(barrels);
            self.write_through(message);
            return;
        }
        // Another writer may have created the barrel between the locks.
        let result = match barrels.entry(message.event_id.clone()) {
            Entry::Occupied(entry) => entry.get().insert(message),
            Entry::Vacant(entry) => {
                let barrel = self.pool.acquire(entry.key());
                self.counters.record_barrel();
                debug!(event_id = %entry.key(), "Created barrel");
                entry.insert(barrel).insert(message)
            }
        };
        self.after_insert(result);
    }

    fn after_insert(&self, result: Result<BarrelSignals, InsertError>) {
        match result {
            Ok(signals) => {
                for command in signals {
                    self.send_command(command);
                }
            }
            Err(err) => {
                warn!(
                    event_id = %err.message.event_id,
                    reason = %err.reason,
                    "Barrel rejected message, moving it to garbage"
                );
                self.garbage.insert(std::iter::once(err.into_message()));
            }
        }
    }

    /// Persist a single message without buffering it.
    ///
    /// A rejected message is demoted and the garbage sink flushed inline,
    /// since its loop may already be gone.
    fn write_through(&self, message: Message) {
        warn!(event_id = %message.event_id, "Message store stopped, writing message through");
        let event_id = message.event_id.clone();
        self.save_or_demote(&event_id, std::slice::from_ref(&message));
        if self.garbage.pending() > 0 {
            // flush() logs its own failures
            let _ = self.garbage.flush();
        }
    }

    // ========================================================================
    // Flush
    // ========================================================================

    /// Write a batch to durable storage, demoting it to garbage on failure.
    pub(crate) fn save_or_demote(&self, event_id: &str, batch: &[Message]) {
        match self.collaborators.sink.save_messages(batch) {
            Ok(()) => {
                debug!(event_id, count = batch.len(), "Persisted barrel messages");
            }
            Err(e) => {
                error!(
                    event_id,
                    count = batch.len(),
                    error = %e,
                    "Failed to persist barrel messages, moving them to garbage"
                );
                self.garbage.insert(batch.iter().cloned());
            }
        }
    }

    /// Stage everything buffered in `barrel` and write it out.
    ///
    /// The staged batch is cleared whatever the outcome. Calling it again
    /// with nothing new buffered writes nothing.
    pub(crate) fn save_before_gc(&self, barrel: &Barrel) {
        let mut guard = barrel.lock_persistence();
        guard.stage_buffered();
        if !guard.staged().is_empty() {
            self.save_or_demote(barrel.event_id(), guard.staged());
        }
        guard.clear();
    }

    /// Write the staged batch of one event if a flush was requested.
    ///
    /// The barrel stays indexed. Unknown identifiers are ignored.
    pub fn persistence(&self, event_id: &str) {
        let barrels = self.barrels.read();
        let Some(barrel) = barrels.get(event_id) else {
            debug!(event_id, "No barrel to persist");
            return;
        };
        let mut guard = barrel.lock_persistence();
        if !guard.needs_persistence() {
            return;
        }
        if !guard.staged().is_empty() {
            self.save_or_demote(event_id, guard.staged());
        }
        guard.clear();
    }

    /// Flush and release every barrel. Returns the number drained.
    pub(crate) fn drain(&self) -> usize {
        let mut barrels = self.barrels.write();
        let count = barrels.len();
        for (_, barrel) in barrels.drain() {
            self.save_before_gc(&barrel);
            self.pool.release(barrel);
        }
        count
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Queue a command for the command loop.
    pub fn send_command(&self, command: StoreCommand) {
        if let Err(e) = self.commands_tx.send(command) {
            debug!(verb = e.0.verb(), event_id = e.0.event_id(), "Command loop gone, dropping command");
        }
    }

    /// Queue a command given in its string form.
    ///
    /// Malformed commands are dropped.
    pub fn send_raw_command<S: AsRef<str>>(&self, parts: &[S]) {
        match StoreCommand::parse(parts) {
            Some(command) => self.send_command(command),
            None => debug!(parts = parts.len(), "Ignoring malformed command"),
        }
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Settings in effect.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Number of indexed barrels.
    pub fn barrel_count(&self) -> usize {
        self.barrels.read().len()
    }

    /// Whether a barrel is indexed for `event_id`.
    pub fn contains(&self, event_id: &str) -> bool {
        self.barrels.read().contains_key(event_id)
    }

    /// Messages buffered, not yet staged, for `event_id`.
    pub fn buffered(&self, event_id: &str) -> Vec<Message> {
        self.barrels
            .read()
            .get(event_id)
            .map(|b| b.buffered())
            .unwrap_or_default()
    }

    /// Messages waiting for the next garbage flush.
    pub fn pending_garbage(&self) -> usize {
        self.garbage.pending()
    }

    /// The garbage sink.
    pub fn garbage(&self) -> &Arc<GarbageSink> {
        &self.garbage
    }

    /// Idle barrels in the reuse pool.
    pub fn pooled_barrels(&self) -> usize {
        self.pool.idle()
    }

    /// Current counters.
    pub fn metrics(&self) -> StoreMetrics {
        StoreMetrics {
            barrel_count: self.barrel_count(),
            message_count: self.counters.messages(),
            barrel_total: self.counters.barrels(),
        }
    }

    /// Load figures since the last sweep tick.
    pub fn monitor_data(&self) -> MonitorData {
        MonitorData {
            log_size_per_tick: self.counters.tick_messages(),
            service_size: self.barrel_count(),
        }
    }
}

impl MetricsReporter for MessageStore {
    fn scrape(&self, namespace: &str, exporter: &str, from: &str) -> Vec<GaugeSample> {
        self.metrics().gauges(namespace, exporter, from)
    }
}

impl std::fmt::Debug for MessageStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageStore")
            .field("barrels", &self.barrel_count())
            .field("garbage", &self.garbage)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

//! Garbage sink flush loop
//!
//! The loop wakes on three signals:
//!
//! ```text
//! interval tick   -> flush if anything is pending
//! trigger()       -> flush now
//! shutdown()      -> final flush, then exit
//! ```
//!
//! The shutdown signal is owned by the sink and is distinct from the
//! store's cancellation signal, so the store can drain its barrels into
//! the sink before the last flush happens.

use std::sync::Arc;
use std::time::Duration;

use eventlog_core::Message;
use serde::Deserialize;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::buffer::GarbageBuffer;
use crate::error::GarbageError;
use crate::store::GarbageStore;

/// What to do with a batch whose fallback append failed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GarbageFailurePolicy {
    /// Log and discard the batch
    #[default]
    Drop,
    /// Keep the batch at the front of the buffer for the next flush
    Retain,
}

/// Garbage sink settings
#[derive(Debug, Clone)]
pub struct GarbageSinkConfig {
    /// Period of the flush tick
    pub flush_interval: Duration,
    /// Handling of failed appends
    pub failure_policy: GarbageFailurePolicy,
}

impl Default for GarbageSinkConfig {
    fn default() -> Self {
        Self {
            flush_interval: Duration::from_secs(10),
            failure_policy: GarbageFailurePolicy::Drop,
        }
    }
}

/// Accumulates failed messages and appends them to a [`GarbageStore`]
pub struct GarbageSink {
    buffer: GarbageBuffer,
    store: Arc<dyn GarbageStore>,
    config: GarbageSinkConfig,
    trigger: Notify,
    shutdown: CancellationToken,
}

impl GarbageSink {
    /// Create a sink writing to `store`.
    pub fn new(store: Arc<dyn GarbageStore>, config: GarbageSinkConfig) -> Self {
        Self {
            buffer: GarbageBuffer::new(),
            store,
            config,
            trigger: Notify::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Queue messages for the next flush.
    pub fn insert(&self, messages: impl IntoIterator<Item = Message>) {
        self.buffer.extend(messages);
    }

    /// Number of queued messages.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Ask the loop to flush without waiting for the tick.
    ///
    /// Triggers issued before the loop wakes collapse into one flush.
    pub fn trigger(&self) {
        self.trigger.notify_one();
    }

    /// Signal the loop to flush one last time and exit.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Whether shutdown was signalled.
    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Append everything queued to the store.
    ///
    /// Returns the number of messages written. On failure the batch is
    /// handled per [`GarbageFailurePolicy`] and the error returned.
    pub fn flush(&self) -> Result<usize, GarbageError> {
        let batch = self.buffer.take();
        if batch.is_empty() {
            return Ok(0);
        }
        match self.store.save(&batch) {
            Ok(()) => {
                info!(count = batch.len(), "Saved garbage messages to fallback store");
                Ok(batch.len())
            }
            Err(e) => {
                error!(
                    error = %e,
                    count = batch.len(),
                    policy = ?self.config.failure_policy,
                    "Failed to save garbage messages"
                );
                if self.config.failure_policy == GarbageFailurePolicy::Retain {
                    self.buffer.restore_front(batch);
                }
                Err(e)
            }
        }
    }

    /// Spawn the flush loop on the current Tokio runtime.
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let sink = Arc::clone(self);
        let shutdown = self.shutdown.clone();
        tokio::spawn(sink.run(shutdown))
    }

    async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        debug!("Garbage sink flush loop start.");
        let mut ticker = tokio::time::interval(self.config.flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    if self.pending() > 0 {
                        self.flush_blocking().await;
                    }
                }
                _ = self.trigger.notified() => {
                    self.flush_blocking().await;
                }
            }
        }

        self.flush_blocking().await;
        debug!("Garbage sink flush loop stop.");
    }

    async fn flush_blocking(self: &Arc<Self>) {
        let sink = Arc::clone(self);
        // flush() logs its own failures
        if let Err(e) = tokio::task::spawn_blocking(move || sink.flush()).await {
            error!(error = %e, "Garbage flush task failed");
        }
    }
}

impl std::fmt::Debug for GarbageSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GarbageSink")
            .field("pending", &self.pending())
            .field("config", &self.config)
            .finish()
    }
}

//! Background loops and shutdown
//!
//! Stop sequence:
//!
//! 1. signal cancellation; the sweep loop exits, the command loop runs
//!    what is already queued and exits
//! 2. flush every remaining barrel under the index write lock
//! 3. signal the garbage sink, which flushes one last time and exits
//!
//! Stopping is complete rather than fast: every buffered message gets a
//! durable write or a garbage append attempt.
//!
//! The stopped flag is raised before the drain, so a message inserted
//! after it is written through instead of landing in a barrel nobody
//! will flush.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::store::MessageStore;

impl MessageStore {
    /// Spawn the sweep, command and garbage loops.
    ///
    /// Must be called from within a Tokio runtime. Calling it again, or
    /// after [`MessageStore::stop`], does nothing.
    pub fn run(self: &Arc<Self>) {
        if self.stopped.load(Ordering::SeqCst) {
            warn!("Message store already stopped");
            return;
        }
        let Some(commands) = self.commands_rx.lock().take() else {
            warn!("Message store already running");
            return;
        };

        let mut loops = self.loops.lock();
        loops.push(tokio::spawn(
            Arc::clone(self).gc_loop(self.cancel.child_token()),
        ));
        loops.push(tokio::spawn(
            Arc::clone(self).command_loop(commands, self.cancel.child_token()),
        ));
        *self.garbage_task.lock() = Some(self.garbage.spawn());

        info!(
            gc_interval_ms = self.config.gc_interval_ms,
            idle_timeout_ms = self.config.idle_timeout_ms,
            "Message store started"
        );
    }

    /// Stop the background loops and flush everything.
    ///
    /// Idempotent; later calls return immediately.
    pub async fn stop(self: &Arc<Self>) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        self.cancel.cancel();

        let loops: Vec<_> = self.loops.lock().drain(..).collect();
        for handle in loops {
            if let Err(e) = handle.await {
                error!(error = %e, "Message store loop failed");
            }
        }

        let store = Arc::clone(self);
        match tokio::task::spawn_blocking(move || store.drain()).await {
            Ok(drained) => info!(drained, "Flushed remaining barrels"),
            Err(e) => error!(error = %e, "Barrel drain task failed"),
        }

        self.garbage.shutdown();
        let garbage_task = self.garbage_task.lock().take();
        match garbage_task {
            Some(handle) => {
                if let Err(e) = handle.await {
                    error!(error = %e, "Garbage sink loop failed");
                }
            }
            None => {
                // Never started; flush inline.
                let garbage = Arc::clone(&self.garbage);
                if let Err(e) = tokio::task::spawn_blocking(move || garbage.flush()).await {
                    error!(error = %e, "Garbage flush task failed");
                }
            }
        }
        info!("Message store stopped");
    }

    /// Whether [`MessageStore::stop`] was called.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

//! Idle barrel eviction
//!
//! Every `gc_interval` the sweep takes the index write lock, flushes each
//! barrel idle for longer than `idle_timeout`, returns it to the pool and
//! removes it from the index. With both set to 30s an abandoned event is
//! evicted at most 60s after its last message.

use std::sync::Arc;
use std::time::Instant;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::store::MessageStore;

impl MessageStore {
    /// Run one sweep tick: reset the per-tick counter and evict idle barrels.
    ///
    /// Returns the number of evicted barrels.
    pub fn gc_run(&self) -> usize {
        self.counters.reset_tick();
        self.sweep_at(Instant::now())
    }

    /// Evict every barrel idle as of `now`.
    ///
    /// Holds the index write lock for the whole sweep, durable writes
    /// included.
    pub fn sweep_at(&self, now: Instant) -> usize {
        let started = Instant::now();
        let timeout = self.config.idle_timeout();
        let mut barrels = self.barrels.write();

        let idle: Vec<String> = barrels
            .iter()
            .filter(|(_, barrel)| barrel.is_idle(timeout, now))
            .map(|(event_id, _)| event_id.clone())
            .collect();

        for event_id in &idle {
            if let Some(barrel) = barrels.remove(event_id) {
                self.save_before_gc(&barrel);
                self.pool.release(barrel);
            }
        }

        debug!(
            evicted = idle.len(),
            remaining = barrels.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "Message store sweep done"
        );
        idle.len()
    }

    pub(crate) async fn gc_loop(self: Arc<Self>, cancel: CancellationToken) {
        debug!("Message store sweep loop start.");
        let mut ticker = tokio::time::interval(self.config.gc_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let store = Arc::clone(&self);
                    if let Err(e) = tokio::task::spawn_blocking(move || store.gc_run()).await {
                        error!(error = %e, "Sweep task failed");
                    }
                }
            }
        }
        debug!("Message store sweep loop stop.");
    }
}

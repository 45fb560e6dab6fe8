//! Free-list of detached barrels
//!
//! Barrels come back from the sweep at a steady rate under load; reusing
//! them keeps their buffer capacity and avoids reallocating per event.

use parking_lot::Mutex;
use tracing::warn;

use crate::barrel::{Barrel, BarrelLimits};

/// Reuse pool for [`Barrel`]s
///
/// Every barrel handed out by [`BarrelPool::acquire`] is empty and
/// detached; [`BarrelPool::release`] resets before storing.
#[derive(Debug)]
pub struct BarrelPool {
    free: Mutex<Vec<Box<Barrel>>>,
    limits: BarrelLimits,
    max_idle: usize,
}

impl BarrelPool {
    /// Create a pool that keeps at most `max_idle` barrels.
    pub fn new(limits: BarrelLimits, max_idle: usize) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            limits,
            max_idle,
        }
    }

    /// Take a barrel and assign it to `event_id`.
    pub fn acquire(&self, event_id: &str) -> Box<Barrel> {
        let mut barrel = self
            .free
            .lock()
            .pop()
            .unwrap_or_else(|| Box::new(Barrel::new(self.limits)));
        debug_assert!(barrel.is_empty(), "pooled barrel was not empty");
        barrel.assign(event_id);
        barrel
    }

    /// Return a barrel to the pool.
    ///
    /// Staged or buffered content is discarded; flush before releasing.
    pub fn release(&self, mut barrel: Box<Barrel>) {
        if !barrel.is_empty() {
            warn!(
                event_id = barrel.event_id(),
                buffered = barrel.buffered_len(),
                staged = barrel.staged_len(),
                "Releasing barrel with unflushed content"
            );
        }
        barrel.reset();
        let mut free = self.free.lock();
        if free.len() < self.max_idle {
            free.push(barrel);
        }
    }

    /// Number of idle barrels.
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }
}

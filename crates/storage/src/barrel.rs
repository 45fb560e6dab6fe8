//! Per-event accumulation unit
//!
//! A [`Barrel`] buffers the messages of one event in arrival order and
//! stages them for durable storage.
//!
//! # Locking
//!
//! Two independent locks:
//!
//! - `buffer`: the buffered sequence and its bookkeeping. Held only for
//!   the push itself, so inserts on the same barrel never wait on I/O.
//! - `persistence`: the staged batch and the `need_persistence` flag.
//!   Held across the durable write by the store.
//!
//! Lock order is always `persistence` then `buffer`. Insert releases the
//! buffer lock before staging, so it never holds `buffer` while asking
//! for `persistence`.
//!
//! # Ownership
//!
//! The identifier is only changed through `&mut self`, i.e. while the
//! barrel is owned by the pool or by a store holding its index write
//! lock.

use std::time::{Duration, Instant};

use eventlog_core::{Message, Step, StoreCommand};
use parking_lot::{Mutex, MutexGuard};
use smallvec::SmallVec;

use crate::error::{BarrelError, InsertError};

/// Commands emitted by a single insert
///
/// At most a persistence request plus one callback or code-version.
pub type BarrelSignals = SmallVec<[StoreCommand; 2]>;

/// Staging thresholds for a barrel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarrelLimits {
    /// Buffered messages that trigger a size-based staging
    pub cache_threshold: usize,
    /// Messages a barrel accepts before rejecting inserts
    pub max_messages: u64,
}

impl Default for BarrelLimits {
    fn default() -> Self {
        Self {
            cache_threshold: 256,
            max_messages: 1_000_000,
        }
    }
}

#[derive(Debug)]
struct BufferState {
    messages: Vec<Message>,
    update_time: Instant,
    /// Messages accepted since the barrel was (re)assigned
    accepted: u64,
}

/// Staged batch awaiting a durable write
#[derive(Debug, Default)]
struct PersistenceState {
    staged: Vec<Message>,
    need_persistence: bool,
}

/// Buffered messages for one event identifier
#[derive(Debug)]
pub struct Barrel {
    event_id: String,
    limits: BarrelLimits,
    buffer: Mutex<BufferState>,
    persistence: Mutex<PersistenceState>,
}

impl Barrel {
    /// Create a detached barrel (no identifier).
    pub fn new(limits: BarrelLimits) -> Self {
        Self {
            event_id: String::new(),
            limits,
            buffer: Mutex::new(BufferState {
                messages: Vec::new(),
                update_time: Instant::now(),
                accepted: 0,
            }),
            persistence: Mutex::new(PersistenceState::default()),
        }
    }

    /// Event identifier, empty while detached.
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    /// Assign the barrel to an event.
    ///
    /// Refreshes the update time so a freshly assigned barrel is not
    /// considered idle before its first insert lands.
    pub fn assign(&mut self, event_id: impl Into<String>) {
        self.event_id = event_id.into();
        self.buffer.get_mut().update_time = Instant::now();
    }

    /// Staging thresholds.
    pub fn limits(&self) -> BarrelLimits {
        self.limits
    }

    // ========================================================================
    // Insert
    // ========================================================================

    /// Buffer a message.
    ///
    /// Returns the commands the store must enqueue, in order:
    /// - terminal steps (`last`, `callback`) stage the barrel and emit
    ///   `Persistence` followed by `Callback`
    /// - `code-version` emits `CodeVersion`
    /// - reaching the cache threshold stages the barrel and emits
    ///   `Persistence`
    pub fn insert(&self, message: Message) -> Result<BarrelSignals, InsertError> {
        if self.event_id.is_empty() {
            return Err(InsertError {
                reason: BarrelError::Detached,
                message,
            });
        }
        if message.event_id != self.event_id {
            return Err(InsertError {
                reason: BarrelError::EventMismatch {
                    barrel: self.event_id.clone(),
                    message: message.event_id.clone(),
                },
                message,
            });
        }

        let step = message.step_kind();
        let mut signals = BarrelSignals::new();

        let (should_stage, follow_up) = {
            let mut buffer = self.buffer.lock();
            if buffer.accepted >= self.limits.max_messages {
                return Err(InsertError {
                    reason: BarrelError::Full {
                        event_id: self.event_id.clone(),
                        limit: self.limits.max_messages,
                    },
                    message,
                });
            }
            buffer.update_time = Instant::now();

            let follow_up = match step {
                s if s.is_terminal() => Some(StoreCommand::Callback {
                    event_id: self.event_id.clone(),
                    status: message.status.clone(),
                    message: message.message.clone(),
                }),
                Step::CodeVersion => Some(StoreCommand::CodeVersion {
                    event_id: self.event_id.clone(),
                    code_version: message.code_version(),
                }),
                _ => None,
            };

            buffer.messages.push(message);
            buffer.accepted += 1;
            let full = buffer.messages.len() >= self.limits.cache_threshold;
            (step.is_terminal() || full, follow_up)
        };

        if should_stage {
            self.stage();
            signals.push(StoreCommand::Persistence {
                event_id: self.event_id.clone(),
            });
        }
        signals.extend(follow_up);
        Ok(signals)
    }

    /// Move the buffered sequence to the staged batch and flag it.
    fn stage(&self) {
        let mut persistence = self.persistence.lock();
        let mut buffer = self.buffer.lock();
        persistence.staged.append(&mut buffer.messages);
        persistence.need_persistence = true;
    }

    // ========================================================================
    // Persistence bookkeeping
    // ========================================================================

    /// Acquire the persistence guard.
    pub fn lock_persistence(&self) -> PersistenceGuard<'_> {
        PersistenceGuard {
            barrel: self,
            state: self.persistence.lock(),
        }
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Time of the last accepted insert.
    pub fn update_time(&self) -> Instant {
        self.buffer.lock().update_time
    }

    /// Whether the barrel has seen no insert for longer than `timeout` as of `now`.
    pub fn is_idle(&self, timeout: Duration, now: Instant) -> bool {
        self.update_time() + timeout < now
    }

    /// Number of buffered (not yet staged) messages.
    pub fn buffered_len(&self) -> usize {
        self.buffer.lock().messages.len()
    }

    /// Copy of the buffered sequence.
    pub fn buffered(&self) -> Vec<Message> {
        self.buffer.lock().messages.clone()
    }

    /// Number of staged messages.
    pub fn staged_len(&self) -> usize {
        self.persistence.lock().staged.len()
    }

    /// Whether a targeted flush is pending.
    pub fn needs_persistence(&self) -> bool {
        self.persistence.lock().need_persistence
    }

    /// Messages accepted since the barrel was assigned.
    pub fn accepted(&self) -> u64 {
        self.buffer.lock().accepted
    }

    /// True when nothing is buffered, nothing is staged and no flush is pending.
    pub fn is_empty(&self) -> bool {
        let persistence = self.persistence.lock();
        let buffer = self.buffer.lock();
        buffer.messages.is_empty() && persistence.staged.is_empty() && !persistence.need_persistence
    }

    /// Clear all state and detach the barrel.
    ///
    /// Buffers keep their capacity for reuse.
    pub fn reset(&mut self) {
        self.event_id.clear();
        let buffer = self.buffer.get_mut();
        buffer.messages.clear();
        buffer.accepted = 0;
        let persistence = self.persistence.get_mut();
        persistence.staged.clear();
        persistence.need_persistence = false;
    }
}

/// Exclusive access to a barrel's staged batch
///
/// Inserts into the same barrel proceed while the guard is held.
pub struct PersistenceGuard<'a> {
    barrel: &'a Barrel,
    state: MutexGuard<'a, PersistenceState>,
}

impl PersistenceGuard<'_> {
    /// Append everything buffered to the staged batch.
    ///
    /// Returns the number of messages moved. Calling it again with nothing
    /// new buffered moves nothing.
    pub fn stage_buffered(&mut self) -> usize {
        let mut buffer = self.barrel.buffer.lock();
        let moved = buffer.messages.len();
        self.state.staged.append(&mut buffer.messages);
        moved
    }

    /// Staged batch, oldest first.
    pub fn staged(&self) -> &[Message] {
        &self.state.staged
    }

    /// Whether a targeted flush was requested.
    pub fn needs_persistence(&self) -> bool {
        self.state.need_persistence
    }

    /// Drop the staged batch and clear the flag.
    pub fn clear(&mut self) {
        self.state.staged.clear();
        self.state.need_persistence = false;
    }
}

//! Barrel invariant violations

use eventlog_core::Message;
use thiserror::Error;

/// Why a barrel refused a message
///
/// The store never surfaces these to the caller: the message is routed
/// to the garbage sink instead.
#[derive(Debug, Error)]
pub enum BarrelError {
    /// Barrel has no event identifier (it is sitting in the pool)
    #[error("barrel is detached")]
    Detached,

    /// Message belongs to another event
    #[error("message for event {message} offered to barrel {barrel}")]
    EventMismatch {
        /// Barrel identifier
        barrel: String,
        /// Message identifier
        message: String,
    },

    /// Per-event message cap reached
    #[error("barrel {event_id} reached its message limit ({limit})")]
    Full {
        /// Barrel identifier
        event_id: String,
        /// Configured cap
        limit: u64,
    },
}

/// A rejected insert, carrying the message back to the caller
#[derive(Debug, Error)]
#[error("barrel rejected message: {reason}")]
pub struct InsertError {
    /// Why the barrel refused
    pub reason: BarrelError,
    /// The message that was not buffered
    pub message: Message,
}

impl InsertError {
    /// Recover the rejected message.
    pub fn into_message(self) -> Message {
        self.message
    }
}

//! In-memory list of messages awaiting the fallback write

use eventlog_core::Message;
use parking_lot::Mutex;

/// Append-only list of failed messages
///
/// Guarded by its own lock so that garbage accumulation never waits on
/// the store index.
#[derive(Debug, Default)]
pub struct GarbageBuffer {
    messages: Mutex<Vec<Message>>,
}

impl GarbageBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append messages in order.
    pub fn extend(&self, messages: impl IntoIterator<Item = Message>) {
        self.messages.lock().extend(messages);
    }

    /// Take everything, leaving the buffer empty.
    pub fn take(&self) -> Vec<Message> {
        std::mem::take(&mut *self.messages.lock())
    }

    /// Put a batch back in front of anything appended since it was taken.
    pub fn restore_front(&self, mut batch: Vec<Message>) {
        let mut messages = self.messages.lock();
        batch.append(&mut messages);
        *messages = batch;
    }

    /// Number of pending messages.
    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }
}

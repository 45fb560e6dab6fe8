//! Convenient imports for the event log.
//!
//! ```ignore
//! use eventlog::prelude::*;
//! ```

// Main entry point
pub use crate::event_log::{EventLog, EventLogBuilder};

// Error handling
pub use crate::error::{Error, Result};

// Messages and commands
pub use eventlog_core::{Message, Step, StoreCommand};

// Collaborators
pub use eventlog_core::{EventRecordStore, MessageSink, WebhookDispatcher};

// Configuration
pub use eventlog_durability::GarbageFailurePolicy;
pub use eventlog_engine::StoreConfig;

// Metrics
pub use eventlog_engine::MetricsReporter;

//! # Eventlog
//!
//! In-process write buffer for build and deploy event logs.
//!
//! Messages are grouped per event identifier in memory, flushed to
//! durable storage when the event goes idle or asks for it, and demoted to
//! an append-only garbage file when durable storage rejects them.
//!
//! ## Quick Start
//!
//! ```ignore
//! use eventlog::prelude::*;
//! use std::sync::Arc;
//!
//! let log = EventLog::builder()
//!     .sink(Arc::new(sink))
//!     .webhooks(Arc::new(webhooks))
//!     .records(Arc::new(records))
//!     .start()?;
//!
//! log.insert_message(Message::new("E1", "build", "compiling"));
//! log.insert_message(Message::new("E1", "last", "done").with_status("success"));
//!
//! // Graceful shutdown
//! log.stop().await;
//! ```
//!
//! ## Layers
//!
//! - `eventlog-core`: messages, commands, collaborator traits
//! - `eventlog-storage`: barrels and the barrel pool
//! - `eventlog-durability`: the garbage sink and its file store
//! - `eventlog-engine`: the message store and its background loops

#![warn(missing_docs)]

mod error;
mod event_log;

pub mod prelude;

pub use error::{Error, Result};
pub use event_log::{EventLog, EventLogBuilder};

pub use eventlog_core::{
    EventRecordStore, Message, MessageSink, ServiceEventUpdate, Step, StoreCommand, VersionInfo,
    WebhookDispatcher, WebhookEvent, WebhookParams,
};
pub use eventlog_durability::{FileGarbageStore, GarbageFailurePolicy, GarbageSaveType, GarbageStore};
pub use eventlog_engine::{
    GaugeSample, MessageStore, MetricsReporter, MonitorData, StoreConfig, StoreMetrics,
};
pub use eventlog_storage::BarrelLimits;

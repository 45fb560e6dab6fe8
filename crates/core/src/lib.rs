//! Core types for the event-log handle store
//!
//! This crate defines the types shared by every layer of the engine:
//! - Message: an immutable log line tagged with its event identifier
//! - StoreCommand: the typed out-of-band commands processed by the store
//! - Collaborator traits: durable storage, webhook dispatch, event records
//! - Error types for the collaborator boundaries
//!
//! The in-memory collaborators in [`testing`] back the unit and
//! integration tests of the other crates.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod command;
pub mod error;
pub mod message;
pub mod models;
pub mod testing;
pub mod traits;

pub use command::StoreCommand;
pub use error::{RecordError, StorageError};
pub use message::{Message, Step};
pub use models::{ServiceEventUpdate, VersionInfo, WebhookEvent, WebhookParams};
pub use traits::{EventRecordStore, MessageSink, WebhookDispatcher};

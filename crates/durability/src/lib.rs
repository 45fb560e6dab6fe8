//! Fallback durability for the event-log handle store
//!
//! Message batches that fail to reach durable storage are not dropped;
//! they are demoted to the garbage sink:
//! - GarbageBuffer: lock-guarded list of failed messages, independent of
//!   the store index lock
//! - GarbageStore: pluggable append target (FileGarbageStore today)
//! - GarbageSink: periodic, triggered and shutdown flushes of the buffer
//!
//! ## Failure policy
//!
//! | Policy | Append fails |
//! |--------|--------------|
//! | Drop (default) | Batch is logged and discarded |
//! | Retain | Batch goes back to the front of the buffer for the next flush |

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod buffer;
pub mod error;
pub mod sink;
pub mod store;

pub use buffer::GarbageBuffer;
pub use error::GarbageError;
pub use sink::{GarbageFailurePolicy, GarbageSink, GarbageSinkConfig};
pub use store::{format_line, FileGarbageStore, GarbageSaveType, GarbageStore};

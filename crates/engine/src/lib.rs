//! Message store engine
//!
//! Ties the barrel index, the garbage sink and the external
//! collaborators together:
//! - MessageStore: ingestion, targeted persistence, metrics
//! - Sweep loop: evicts idle barrels to durable storage
//! - Command loop: persistence, callback and code-version commands
//! - StoreConfig: TOML-loadable settings

#![warn(missing_docs)]
#![warn(clippy::all)]

mod command;
pub mod config;
mod lifecycle;
pub mod metrics;
mod store;
mod sweep;

pub use config::{ConfigError, StoreConfig, DEFAULT_GARBAGE_MESSAGE_FILE};
pub use metrics::{fq_name, GaugeSample, MetricsReporter, MonitorData, StoreMetrics};
pub use store::{Collaborators, MessageStore};

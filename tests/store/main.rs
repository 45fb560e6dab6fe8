//! Message Store Integration Tests
//!
//! End-to-end tests through the `EventLog` facade: ingestion, eviction,
//! fallback to the garbage file, command processing and shutdown.

mod common;

mod commands;
mod eviction;
mod fallback;
mod properties;
mod shutdown;

//! Storage layer for the event-log handle store
//!
//! This crate implements the in-memory accumulation units:
//! - Barrel: per-event ordered buffer with a separately locked staging area
//! - BarrelPool: free-list of detached barrels reused across events

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod barrel;
pub mod error;
pub mod pool;

pub use barrel::{Barrel, BarrelLimits, BarrelSignals, PersistenceGuard};
pub use error::{BarrelError, InsertError};
pub use pool::BarrelPool;

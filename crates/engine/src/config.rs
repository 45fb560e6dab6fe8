//! Store configuration
//!
//! Defaults reproduce the production timings: a 30s sweep evicting
//! barrels idle for 30s, and a 10s garbage flush tick.
//!
//! ```toml
//! idle_timeout_ms = 30000
//! gc_interval_ms = 30000
//! garbage_flush_interval_ms = 10000
//! garbage_save_type = "file"
//! garbage_message_file = "/var/log/event_log/garbage_message.log"
//! garbage_failure_policy = "drop"
//! peer_event_max_cache_log_number = 256
//! peer_event_max_log_number = 1000000
//! pool_max_idle = 1024
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use eventlog_durability::{GarbageFailurePolicy, GarbageSaveType, GarbageSinkConfig};
use eventlog_storage::BarrelLimits;
use serde::Deserialize;
use thiserror::Error;

/// Default garbage file location.
pub const DEFAULT_GARBAGE_MESSAGE_FILE: &str = "/var/log/event_log/garbage_message.log";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Config is not valid TOML for [`StoreConfig`]
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Settings for a [`MessageStore`](crate::MessageStore)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Idle time after which a barrel is evicted
    pub idle_timeout_ms: u64,
    /// Sweep period
    pub gc_interval_ms: u64,
    /// Garbage flush tick period
    pub garbage_flush_interval_ms: u64,
    /// Garbage store strategy
    pub garbage_save_type: GarbageSaveType,
    /// Garbage file for the `file` strategy
    pub garbage_message_file: PathBuf,
    /// Handling of failed garbage appends
    pub garbage_failure_policy: GarbageFailurePolicy,
    /// Buffered messages that make a barrel stage itself
    pub peer_event_max_cache_log_number: usize,
    /// Messages one barrel accepts before rejecting inserts
    pub peer_event_max_log_number: u64,
    /// Idle barrels kept for reuse
    pub pool_max_idle: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            idle_timeout_ms: 30_000,
            gc_interval_ms: 30_000,
            garbage_flush_interval_ms: 10_000,
            garbage_save_type: GarbageSaveType::File,
            garbage_message_file: PathBuf::from(DEFAULT_GARBAGE_MESSAGE_FILE),
            garbage_failure_policy: GarbageFailurePolicy::Drop,
            peer_event_max_cache_log_number: 256,
            peer_event_max_log_number: 1_000_000,
            pool_max_idle: 1024,
        }
    }
}

impl StoreConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: StoreConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Reject values the store cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let intervals = [
            ("idle_timeout_ms", self.idle_timeout_ms),
            ("gc_interval_ms", self.gc_interval_ms),
            ("garbage_flush_interval_ms", self.garbage_flush_interval_ms),
        ];
        for (name, value) in intervals {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{} must be positive", name)));
            }
        }
        if self.peer_event_max_cache_log_number == 0 {
            return Err(ConfigError::Invalid(
                "peer_event_max_cache_log_number must be positive".into(),
            ));
        }
        if self.peer_event_max_log_number == 0 {
            return Err(ConfigError::Invalid(
                "peer_event_max_log_number must be positive".into(),
            ));
        }
        if self.garbage_message_file.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "garbage_message_file must not be empty".into(),
            ));
        }
        Ok(())
    }

    // ========================================================================
    // Builders
    // ========================================================================

    /// Set the idle timeout.
    #[must_use]
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the sweep period.
    #[must_use]
    pub fn with_gc_interval(mut self, interval: Duration) -> Self {
        self.gc_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Set the garbage flush period.
    #[must_use]
    pub fn with_garbage_flush_interval(mut self, interval: Duration) -> Self {
        self.garbage_flush_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Set the garbage file.
    #[must_use]
    pub fn with_garbage_message_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.garbage_message_file = path.into();
        self
    }

    /// Set the garbage failure policy.
    #[must_use]
    pub fn with_garbage_failure_policy(mut self, policy: GarbageFailurePolicy) -> Self {
        self.garbage_failure_policy = policy;
        self
    }

    /// Set the per-barrel staging threshold.
    #[must_use]
    pub fn with_cache_threshold(mut self, threshold: usize) -> Self {
        self.peer_event_max_cache_log_number = threshold;
        self
    }

    /// Set the per-barrel message cap.
    #[must_use]
    pub fn with_max_messages(mut self, max: u64) -> Self {
        self.peer_event_max_log_number = max;
        self
    }

    // ========================================================================
    // Derived settings
    // ========================================================================

    /// Idle timeout.
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    /// Sweep period.
    pub fn gc_interval(&self) -> Duration {
        Duration::from_millis(self.gc_interval_ms)
    }

    /// Garbage flush period.
    pub fn garbage_flush_interval(&self) -> Duration {
        Duration::from_millis(self.garbage_flush_interval_ms)
    }

    /// Barrel thresholds.
    pub fn barrel_limits(&self) -> BarrelLimits {
        BarrelLimits {
            cache_threshold: self.peer_event_max_cache_log_number,
            max_messages: self.peer_event_max_log_number,
        }
    }

    /// Garbage sink settings.
    pub fn garbage_sink_config(&self) -> GarbageSinkConfig {
        GarbageSinkConfig {
            flush_interval: self.garbage_flush_interval(),
            failure_policy: self.garbage_failure_policy,
        }
    }
}

//! Store counters and gauge snapshots
//!
//! Counters are plain relaxed atomics. Gauges are approximate and never
//! synchronised with ingestion.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Barrels currently indexed
pub const CACHE_BARREL_COUNT: &str = "event_store_cache_barrel_count";
/// Cumulative ingested messages
pub const LOG_COUNT: &str = "event_store_log_count";
/// Cumulative created barrels
pub const BARREL_COUNT: &str = "event_store_barrel_count";

/// Cumulative store counters
#[derive(Debug, Default)]
pub struct StoreCounters {
    tick_messages: AtomicU64,
    messages: AtomicU64,
    barrels: AtomicU64,
}

impl StoreCounters {
    /// Count one ingested message.
    pub fn record_message(&self) {
        self.tick_messages.fetch_add(1, Ordering::Relaxed);
        self.messages.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one created barrel.
    pub fn record_barrel(&self) {
        self.barrels.fetch_add(1, Ordering::Relaxed);
    }

    /// Reset the per-tick message counter and return its previous value.
    pub fn reset_tick(&self) -> u64 {
        self.tick_messages.swap(0, Ordering::Relaxed)
    }

    /// Messages since the last sweep tick.
    pub fn tick_messages(&self) -> u64 {
        self.tick_messages.load(Ordering::Relaxed)
    }

    /// Messages ingested since start.
    pub fn messages(&self) -> u64 {
        self.messages.load(Ordering::Relaxed)
    }

    /// Barrels created since start.
    pub fn barrels(&self) -> u64 {
        self.barrels.load(Ordering::Relaxed)
    }
}

/// Point-in-time store metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreMetrics {
    /// Barrels currently indexed
    pub barrel_count: usize,
    /// Messages ingested since start
    pub message_count: u64,
    /// Barrels created since start
    pub barrel_total: u64,
}

/// Load figures for a monitoring endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorData {
    /// Messages ingested since the last sweep tick
    pub log_size_per_tick: u64,
    /// Barrels currently indexed
    pub service_size: usize,
}

/// One labelled gauge value
#[derive(Debug, Clone, PartialEq)]
pub struct GaugeSample {
    /// Fully qualified name
    pub name: String,
    /// Help text
    pub help: &'static str,
    /// Value
    pub value: f64,
    /// Labels
    pub labels: BTreeMap<String, String>,
}

/// Join non-empty name parts with `_`.
pub fn fq_name(namespace: &str, subsystem: &str, name: &str) -> String {
    [namespace, subsystem, name]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("_")
}

/// Source of gauge snapshots for an external collector
pub trait MetricsReporter {
    /// Current gauges, each labelled `from = <from>`.
    fn scrape(&self, namespace: &str, exporter: &str, from: &str) -> Vec<GaugeSample>;
}

impl StoreMetrics {
    /// Render the three store gauges.
    pub fn gauges(&self, namespace: &str, exporter: &str, from: &str) -> Vec<GaugeSample> {
        let labels: BTreeMap<String, String> =
            [("from".to_string(), from.to_string())].into_iter().collect();
        let gauge = |name: &str, help: &'static str, value: f64| GaugeSample {
            name: fq_name(namespace, exporter, name),
            help,
            value,
            labels: labels.clone(),
        };
        vec![
            gauge(
                CACHE_BARREL_COUNT,
                "The count of cached barrels in the event store.",
                self.barrel_count as f64,
            ),
            gauge(
                LOG_COUNT,
                "The count of messages ingested by the event store.",
                self.message_count as f64,
            ),
            gauge(
                BARREL_COUNT,
                "The count of barrels created by the event store.",
                self.barrel_total as f64,
            ),
        ]
    }
}

//! Shared fixtures for the message store tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub use eventlog::prelude::*;
pub use eventlog_core::testing::{
    MemoryEventRecordStore, MemoryMessageSink, RecordingWebhookDispatcher,
};
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

/// Route store logs to the test output; `RUST_LOG=eventlog_engine=debug` to see them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// An event log wired to in-memory collaborators and a temp garbage file.
pub struct TestLog {
    pub log: EventLog,
    pub sink: Arc<MemoryMessageSink>,
    pub webhooks: Arc<RecordingWebhookDispatcher>,
    pub records: Arc<MemoryEventRecordStore>,
    pub garbage_path: PathBuf,
    _dir: TempDir,
}

impl TestLog {
    /// Default timings, not started.
    pub fn new() -> Self {
        Self::build(StoreConfig::default(), MemoryMessageSink::new(), false)
    }

    /// Short timings, started.
    pub fn fast() -> Self {
        Self::build(fast_config(), MemoryMessageSink::new(), true)
    }

    /// Short timings, durable storage always failing, started.
    pub fn fast_failing() -> Self {
        Self::build(fast_config(), MemoryMessageSink::failing(), true)
    }

    pub fn build(config: StoreConfig, sink: MemoryMessageSink, start: bool) -> Self {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let garbage_path = dir.path().join("garbage_message.log");
        let sink = Arc::new(sink);
        let webhooks = Arc::new(RecordingWebhookDispatcher::new());
        let records = Arc::new(MemoryEventRecordStore::new());

        let builder = EventLog::builder()
            .config(config.with_garbage_message_file(&garbage_path))
            .sink(sink.clone())
            .webhooks(webhooks.clone())
            .records(records.clone());
        let log = if start {
            builder.start().unwrap()
        } else {
            builder.build().unwrap()
        };

        Self {
            log,
            sink,
            webhooks,
            records,
            garbage_path,
            _dir: dir,
        }
    }

    /// Lines of the garbage file, empty if it does not exist yet.
    pub fn garbage_lines(&self) -> Vec<String> {
        std::fs::read_to_string(&self.garbage_path)
            .map(|content| content.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

/// Timings scaled down from 30s/30s/10s.
pub fn fast_config() -> StoreConfig {
    StoreConfig::default()
        .with_idle_timeout(Duration::from_millis(100))
        .with_gc_interval(Duration::from_millis(100))
        .with_garbage_flush_interval(Duration::from_millis(50))
}

/// A message with a fixed timestamp.
pub fn msg(event_id: &str, step: &str, text: &str) -> Message {
    Message::new(event_id, step, text).with_time("2024-05-01T10:00:00.000Z")
}

/// Poll `check` until it holds or two seconds pass.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

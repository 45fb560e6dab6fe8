//! Shutdown Tests
//!
//! Stopping flushes every barrel and then the garbage sink.

use crate::common::*;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stop_flushes_all_barrels() {
    let t = TestLog::build(
        fast_config().with_idle_timeout(Duration::from_secs(3600)),
        MemoryMessageSink::new(),
        true,
    );
    for event in ["A", "B", "C"] {
        t.log.insert_message(msg(event, "build", event));
    }

    t.log.stop().await;

    assert_eq!(t.log.metrics().barrel_count, 0);
    assert_eq!(t.sink.messages().len(), 3);
    assert!(t.garbage_lines().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stop_writes_unpersisted_barrels_to_garbage_file() {
    let t = TestLog::build(
        StoreConfig::default(),
        MemoryMessageSink::failing(),
        true,
    );
    t.log.insert_message(msg("E1", "build", "a"));
    t.log.insert_message(msg("E1", "build", "b"));
    t.log.insert_message(msg("E2", "build", "c"));

    // Default 10s garbage tick never fires; the final flush must.
    t.log.stop().await;

    let mut lines = t.garbage_lines();
    lines.sort();
    assert_eq!(
        lines,
        vec![
            "(build-info) 2024-05-01T10:00:00.000Z: a",
            "(build-info) 2024-05-01T10:00:00.000Z: b",
            "(build-info) 2024-05-01T10:00:00.000Z: c",
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stop_runs_queued_commands() {
    let t = TestLog::build(StoreConfig::default(), MemoryMessageSink::new(), true);
    for i in 0..20 {
        let event_id = format!("E{}", i);
        t.log
            .send_raw_command(&["callback", event_id.as_str(), "success", "done"]);
    }

    t.log.stop().await;

    assert_eq!(t.webhooks.calls().len(), 20);
    assert!(t.records.service_event("E19").is_some());
}

#[tokio::test]
async fn stop_twice_is_harmless() {
    let t = TestLog::fast();
    t.log.insert_message(msg("E1", "build", "a"));
    t.log.stop().await;
    t.log.stop().await;
    assert_eq!(t.sink.batches().len(), 1);
}

#[tokio::test]
async fn stop_without_start_flushes() {
    let t = TestLog::build(StoreConfig::default(), MemoryMessageSink::failing(), false);
    t.log.insert_message(msg("E1", "build", "a"));
    t.log.stop().await;
    assert_eq!(t.garbage_lines().len(), 1);
}

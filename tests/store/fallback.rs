//! Fallback Tests
//!
//! Batches rejected by durable storage end up in the garbage file.

use crate::common::*;
use std::time::{Duration, Instant};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn targeted_persistence_failure_lands_in_garbage_file() {
    let t = TestLog::build(
        fast_config()
            .with_idle_timeout(Duration::from_secs(3600))
            .with_cache_threshold(2),
        MemoryMessageSink::failing(),
        true,
    );

    t.log.insert_message(msg("E2", "build", "first"));
    t.log.insert_message(msg("E2", "build", "second"));
    t.log.send_raw_command(&["persistence", "E2"]);

    assert!(eventually(|| t.garbage_lines().len() >= 2).await);
    assert_eq!(
        t.garbage_lines(),
        vec![
            "(build-info) 2024-05-01T10:00:00.000Z: first",
            "(build-info) 2024-05-01T10:00:00.000Z: second",
        ]
    );
    // Barrel stays indexed after a targeted flush.
    assert!(t.log.store().contains("E2"));

    t.log.stop().await;
    assert_eq!(t.garbage_lines().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn targeted_persistence_below_threshold_waits_for_stop() {
    let t = TestLog::build(StoreConfig::default(), MemoryMessageSink::failing(), true);

    t.log.insert_message(msg("E2", "build", "first"));
    t.log.insert_message(msg("E2", "build", "second"));
    t.log.send_raw_command(&["persistence", "E2"]);

    // Nothing was staged, so the command has nothing to write.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(t.garbage_lines().is_empty());
    assert_eq!(t.log.store().pending_garbage(), 0);
    assert_eq!(t.log.store().buffered("E2").len(), 2);

    t.log.stop().await;
    assert_eq!(
        t.garbage_lines(),
        vec![
            "(build-info) 2024-05-01T10:00:00.000Z: first",
            "(build-info) 2024-05-01T10:00:00.000Z: second",
        ]
    );
}

#[test]
fn targeted_persistence_below_threshold_waits_for_sweep() {
    let t = TestLog::build(StoreConfig::default(), MemoryMessageSink::failing(), false);
    let store = t.log.store();

    store.insert_message(msg("E2", "build", "first"));
    store.insert_message(msg("E2", "build", "second"));
    store.persistence("E2");
    assert_eq!(store.pending_garbage(), 0);
    assert_eq!(store.buffered("E2").len(), 2);

    assert_eq!(store.sweep_at(Instant::now() + Duration::from_secs(31)), 1);
    assert_eq!(store.pending_garbage(), 2);
    assert_eq!(t.log.flush_garbage().unwrap(), 2);
    assert_eq!(
        t.garbage_lines(),
        vec![
            "(build-info) 2024-05-01T10:00:00.000Z: first",
            "(build-info) 2024-05-01T10:00:00.000Z: second",
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn every_failed_message_appears_once() {
    let t = TestLog::fast_failing();
    for event in ["A", "B", "C"] {
        for i in 0..4 {
            t.log.insert_message(msg(event, "build", &format!("{}{}", event, i)));
        }
    }

    let store = t.log.store().clone();
    assert!(eventually(|| store.barrel_count() == 0).await);
    assert!(eventually(|| t.garbage_lines().len() == 12).await);
    t.log.stop().await;

    let mut lines = t.garbage_lines();
    lines.sort();
    lines.dedup();
    assert_eq!(lines.len(), 12);
}

#[test]
fn rejected_message_goes_to_garbage() {
    let t = TestLog::build(
        StoreConfig::default().with_max_messages(1),
        MemoryMessageSink::new(),
        false,
    );
    t.log.insert_message(msg("E1", "build", "kept"));
    t.log.insert_message(msg("E1", "build", "overflow"));

    assert_eq!(t.log.store().pending_garbage(), 1);
    assert_eq!(t.log.flush_garbage().unwrap(), 1);
    assert_eq!(
        t.garbage_lines(),
        vec!["(build-info) 2024-05-01T10:00:00.000Z: overflow"]
    );
}

#[test]
fn sweep_failure_demotes_whole_batch() {
    let t = TestLog::build(StoreConfig::default(), MemoryMessageSink::failing(), false);
    t.log.insert_message(msg("E1", "build", "a"));
    t.log.insert_message(msg("E1", "warn", "b"));

    t.log
        .store()
        .sweep_at(Instant::now() + Duration::from_secs(60));
    assert!(!t.log.store().contains("E1"));
    assert_eq!(t.log.store().pending_garbage(), 2);

    t.log.flush_garbage().unwrap();
    assert_eq!(t.garbage_lines().len(), 2);
}

#[test]
fn unwritable_garbage_file_drops_batch_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let t = TestLog::build(StoreConfig::default(), MemoryMessageSink::failing(), false);
    let log = EventLog::builder()
        .config(StoreConfig::default().with_garbage_message_file(dir.path()))
        .sink(t.sink.clone())
        .webhooks(t.webhooks.clone())
        .records(t.records.clone())
        .build()
        .unwrap();

    log.insert_message(msg("E1", "build", "a"));
    log.store().sweep_at(Instant::now() + Duration::from_secs(60));
    assert!(log.flush_garbage().is_err());
    assert_eq!(log.store().pending_garbage(), 0);
}

#[test]
fn retain_policy_keeps_batch_after_failed_append() {
    let dir = tempfile::tempdir().unwrap();
    let t = TestLog::build(StoreConfig::default(), MemoryMessageSink::failing(), false);
    let log = EventLog::builder()
        .config(
            StoreConfig::default()
                .with_garbage_message_file(dir.path())
                .with_garbage_failure_policy(GarbageFailurePolicy::Retain),
        )
        .sink(t.sink.clone())
        .webhooks(t.webhooks.clone())
        .records(t.records.clone())
        .build()
        .unwrap();

    log.insert_message(msg("E1", "build", "a"));
    log.store().sweep_at(Instant::now() + Duration::from_secs(60));
    assert!(log.flush_garbage().is_err());
    assert_eq!(log.store().pending_garbage(), 1);
}

//! Eviction Tests
//!
//! The sweep flushes idle barrels and returns them to the pool.

use crate::common::*;
use std::time::{Duration, Instant};

#[test]
fn idle_barrel_is_flushed_and_evicted() {
    let t = TestLog::new();
    for text in ["a", "b", "c"] {
        t.log.insert_message(msg("E1", "build", text));
    }

    let store = t.log.store();
    let evicted = store.sweep_at(Instant::now() + Duration::from_secs(31));

    assert_eq!(evicted, 1);
    assert!(!store.contains("E1"));
    assert_eq!(store.pooled_barrels(), 1);
    let saved: Vec<_> = t.sink.messages_for("E1").into_iter().map(|m| m.message).collect();
    assert_eq!(saved, vec!["a", "b", "c"]);
}

#[test]
fn barrel_is_kept_until_idle_threshold() {
    let t = TestLog::new();
    t.log.insert_message(msg("E1", "build", "a"));

    let store = t.log.store();
    assert_eq!(store.sweep_at(Instant::now() + Duration::from_secs(20)), 0);
    assert!(store.contains("E1"));
    assert_eq!(store.sweep_at(Instant::now() + Duration::from_secs(31)), 1);
}

#[test]
fn evicted_barrel_is_reused_empty() {
    let t = TestLog::new();
    t.log.insert_message(msg("E1", "build", "a"));
    t.log.insert_message(msg("E1", "last", "done"));
    t.log.insert_message(msg("E1", "build", "trailing"));

    let store = t.log.store();
    store.sweep_at(Instant::now() + Duration::from_secs(60));
    assert_eq!(store.pooled_barrels(), 1);

    t.log.insert_message(msg("E9", "build", "fresh"));
    assert_eq!(store.pooled_barrels(), 0);
    let buffered: Vec<_> = store.buffered("E9").into_iter().map(|m| m.message).collect();
    assert_eq!(buffered, vec!["fresh"]);
    assert_eq!(t.sink.messages_for("E9").len(), 0);
}

#[test]
fn sweep_leaves_other_events_alone() {
    let t = TestLog::new();
    t.log.insert_message(msg("OLD", "build", "a"));
    let old_insert = Instant::now();
    std::thread::sleep(Duration::from_millis(50));
    t.log.insert_message(msg("NEW", "build", "b"));

    // OLD is past the threshold, NEW is not.
    let now = old_insert + Duration::from_secs(30) + Duration::from_millis(20);
    assert_eq!(t.log.store().sweep_at(now), 1);
    assert!(!t.log.store().contains("OLD"));
    assert!(t.log.store().contains("NEW"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sweep_loop_evicts_idle_barrels() {
    let t = TestLog::fast();
    t.log.insert_message(msg("E1", "build", "a"));

    let store = t.log.store().clone();
    assert!(eventually(|| !store.contains("E1")).await);
    assert_eq!(t.sink.messages_for("E1").len(), 1);

    t.log.stop().await;
}

//! Property Tests
//!
//! Ordering and completeness over generated message sequences.

use crate::common::*;
use proptest::prelude::*;
use std::time::{Duration, Instant};

fn step() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("build"), Just("warn"), Just("last"), Just("callback")]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn flushed_sequence_matches_insert_order(steps in prop::collection::vec(step(), 1..40)) {
        let t = TestLog::build(
            StoreConfig::default().with_cache_threshold(7),
            MemoryMessageSink::new(),
            false,
        );
        for (i, step) in steps.iter().enumerate() {
            t.log.insert_message(msg("E1", step, &i.to_string()));
        }
        t.log.store().sweep_at(Instant::now() + Duration::from_secs(60));

        let saved: Vec<String> = t.sink.messages_for("E1").into_iter().map(|m| m.message).collect();
        let expected: Vec<String> = (0..steps.len()).map(|i| i.to_string()).collect();
        prop_assert_eq!(saved, expected);
    }

    #[test]
    fn failed_batches_reach_garbage_exactly_once(
        counts in prop::collection::vec(1usize..10, 1..6)
    ) {
        let t = TestLog::build(StoreConfig::default(), MemoryMessageSink::failing(), false);
        let mut total = 0;
        for (e, count) in counts.iter().enumerate() {
            for i in 0..*count {
                t.log.insert_message(msg(&format!("E{}", e), "build", &format!("{}-{}", e, i)));
                total += 1;
            }
        }
        t.log.store().sweep_at(Instant::now() + Duration::from_secs(60));
        t.log.flush_garbage().unwrap();

        let mut lines = t.garbage_lines();
        prop_assert_eq!(lines.len(), total);
        lines.sort();
        lines.dedup();
        prop_assert_eq!(lines.len(), total);
    }
}

//! Command Tests
//!
//! Callback, code-version and malformed commands through the command loop.

use crate::common::*;
use eventlog::{VersionInfo, WebhookEvent};
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn callback_updates_record_and_fires_webhook_once() {
    let t = TestLog::fast();
    t.log.send_raw_command(&["callback", "E3", "success", "done"]);

    let records = t.records.clone();
    assert!(eventually(|| records.service_event("E3").is_some()).await);
    t.log.stop().await;

    let record = t.records.service_event("E3").unwrap();
    assert_eq!(record.status, "success");
    assert_eq!(record.message, "done");

    let calls = t.webhooks.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, WebhookEvent::UpdateEventStatus);
    assert_eq!(calls[0].1["event_id"], "E3");
    assert_eq!(calls[0].1["status"], "success");
    assert_eq!(calls[0].1["message"], "done");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn malformed_commands_are_ignored() {
    let t = TestLog::fast();
    t.log.send_raw_command(&["callback", "E4"]);
    t.log.send_raw_command::<&str>(&[]);
    t.log.send_raw_command(&["rollback", "E4"]);
    t.log.send_raw_command(&["persistence", "E4", "extra"]);

    tokio::time::sleep(Duration::from_millis(100)).await;
    t.log.stop().await;

    assert!(t.records.service_event("E4").is_none());
    assert!(t.records.updates().is_empty());
    assert!(t.webhooks.calls().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn code_version_updates_event_and_version_info() {
    let t = TestLog::fast();
    t.records.insert_version(VersionInfo {
        event_id: "E5".into(),
        build_version: "20240501103000".into(),
        code_version: String::new(),
        final_status: String::new(),
    });

    t.log.send_raw_command(&["code-version", "E5", "  9f2c1ab  "]);

    let records = t.records.clone();
    assert!(eventually(|| records.version("E5").map(|v| v.code_version) == Some("9f2c1ab".to_string())).await);
    t.log.stop().await;

    assert_eq!(t.records.service_event("E5").unwrap().code_version, "9f2c1ab");
    let calls = t.webhooks.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, WebhookEvent::UpdateEventCodeVersion);
    assert_eq!(calls[0].1["code_version"], "9f2c1ab");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn code_version_message_triggers_command() {
    let t = TestLog::fast();
    t.log
        .insert_message(msg("E6", "code-version", "Code Version: 1a2b3c"));

    let records = t.records.clone();
    assert!(eventually(|| records.service_event("E6").is_some()).await);
    t.log.stop().await;

    assert_eq!(t.records.service_event("E6").unwrap().code_version, "1a2b3c");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn terminal_message_persists_before_callback() {
    let t = TestLog::build(
        fast_config().with_idle_timeout(Duration::from_secs(3600)),
        MemoryMessageSink::new(),
        true,
    );
    t.log.insert_message(msg("E7", "build", "compile"));
    t.log
        .insert_message(msg("E7", "last", "finished").with_status("success"));

    let records = t.records.clone();
    assert!(eventually(|| records.service_event("E7").is_some()).await);

    // The persistence command ran first and the barrel is still indexed.
    assert_eq!(t.sink.messages_for("E7").len(), 2);
    assert!(t.log.store().contains("E7"));
    assert_eq!(t.records.service_event("E7").unwrap().status, "success");

    t.log.stop().await;
}

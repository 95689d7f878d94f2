//! Announcement ingestion tests. These need the UDP listener, so they go
//! through `TestAuditor::start` and skip when the multicast join is refused.
//! Datagrams are sent as unicast to the bound port; the decode and registry
//! path is identical either way.

use chrono::Duration;
use serde_json::json;

use crate::{query_snapshot, wait_for, TestAuditor};

#[tokio::test]
async fn valid_announcement_registers_the_musician() {
    let Some(auditor) = TestAuditor::start(Duration::seconds(5)).await else {
        return;
    };

    let payload = json!({"identity": "m-1", "attribute": "piano"}).to_string();
    auditor.send_datagram(payload.as_bytes()).await;

    assert!(wait_for(|| auditor.registry.get("m-1").is_some()).await);
    let record = auditor.registry.get("m-1").expect("registered");
    assert_eq!(record.attribute.as_deref(), Some("piano"));
}

#[tokio::test]
async fn bad_datagrams_are_dropped_and_the_listener_keeps_going() {
    let Some(auditor) = TestAuditor::start(Duration::seconds(5)).await else {
        return;
    };

    auditor.send_datagram(b"not json at all").await;
    auditor.send_datagram(b"{\"attribute\": \"drum\"}").await;
    auditor
        .send_datagram(b"{\"identity\": \"\", \"attribute\": \"drum\"}")
        .await;
    let survivor = json!({"identity": "survivor"}).to_string();
    auditor.send_datagram(survivor.as_bytes()).await;

    assert!(wait_for(|| auditor.registry.get("survivor").is_some()).await);
    assert_eq!(auditor.registry.len(), 1);
}

#[tokio::test]
async fn repeat_announcements_refresh_without_rewriting_first_seen() {
    let Some(auditor) = TestAuditor::start(Duration::seconds(5)).await else {
        return;
    };

    let payload = json!({"identity": "m-1", "attribute": "flute"}).to_string();
    auditor.send_datagram(payload.as_bytes()).await;
    assert!(wait_for(|| auditor.registry.get("m-1").is_some()).await);
    let first = auditor.registry.get("m-1").expect("registered");

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    auditor.send_datagram(payload.as_bytes()).await;
    assert!(
        wait_for(|| {
            auditor
                .registry
                .get("m-1")
                .is_some_and(|r| r.last_seen_at > first.last_seen_at)
        })
        .await
    );

    let refreshed = auditor.registry.get("m-1").expect("still registered");
    assert_eq!(refreshed.first_seen_at, first.first_seen_at);
}

#[tokio::test]
async fn ingested_musician_shows_up_in_the_snapshot() {
    let Some(auditor) = TestAuditor::start(Duration::seconds(5)).await else {
        return;
    };

    let payload = json!({"identity": "m-1", "attribute": "trumpet", "sound": "pouet"}).to_string();
    auditor.send_datagram(payload.as_bytes()).await;
    assert!(wait_for(|| auditor.registry.get("m-1").is_some()).await);

    let entries = query_snapshot(auditor.snapshot_addr).await.expect("query");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].identity, "m-1");
    assert_eq!(entries[0].attribute.as_deref(), Some("trumpet"));
}

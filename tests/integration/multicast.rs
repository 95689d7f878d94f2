//! Full-stack multicast test: a real musician broadcast loop feeding a real
//! auditor over the multicast group itself. Kernel multicast loopback is not
//! available everywhere, so this skips when nothing arrives.

use chrono::Duration;
use tokio::sync::broadcast;

use musiciand::broadcast::broadcast_loop;
use orchestra_core::Instrument;

use crate::{query_snapshot, wait_for, TestAuditor};

#[tokio::test]
async fn musician_broadcast_reaches_the_auditor_over_multicast() {
    let Some(auditor) = TestAuditor::start(Duration::seconds(5)).await else {
        return;
    };

    let (stop_tx, stop_rx) = broadcast::channel(1);
    let broadcaster = tokio::spawn(broadcast_loop(
        "multicast-musician".to_string(),
        Instrument::Drum,
        crate::TEST_GROUP,
        auditor.announce_port,
        std::time::Duration::from_millis(100),
        stop_rx,
    ));

    let heard = wait_for(|| auditor.registry.get("multicast-musician").is_some()).await;
    let _ = stop_tx.send(());
    broadcaster
        .await
        .expect("broadcaster task")
        .expect("broadcast loop exits cleanly");

    if !heard {
        eprintln!("SKIP: multicast loopback not delivering in this environment");
        return;
    }

    let entries = query_snapshot(auditor.snapshot_addr).await.expect("query");
    assert!(entries.iter().any(|e| {
        e.identity == "multicast-musician" && e.attribute.as_deref() == Some("drum")
    }));
}

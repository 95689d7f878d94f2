//! Orchestra integration test harness.
//!
//! These tests drive the real auditor loops over loopback sockets. The
//! snapshot-surface tests bind ephemeral TCP ports and run everywhere. Tests
//! that need the UDP listener must join a multicast group, which sandboxed
//! environments sometimes refuse — those print a SKIP line and return
//! instead of failing.
//!
//! Each test builds its own auditor on its own ports; nothing is shared
//! between tests.

mod announcements;
mod multicast;

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration as StdDuration;

use anyhow::{Context, Result};
use chrono::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpStream, UdpSocket};
use tokio::sync::broadcast;

use auditord::{AnnouncementListener, SnapshotServer};
use orchestra_core::wire::SnapshotEntry;
use orchestra_services::{new_registry, SharedRegistry};

// ── Harness ───────────────────────────────────────────────────────────────────

/// Multicast group used by the tests, distinct from the production default so
/// a live auditord on the same host never hears test traffic.
pub const TEST_GROUP: Ipv4Addr = Ipv4Addr::new(239, 255, 22, 99);

/// A fully wired auditor running on ephemeral ports.
pub struct TestAuditor {
    pub registry: SharedRegistry,
    pub announce_port: u16,
    pub snapshot_addr: SocketAddr,
    shutdown_tx: broadcast::Sender<()>,
}

impl TestAuditor {
    /// Spawn listener + snapshot server with the given TTL.
    ///
    /// Returns None (after printing a SKIP line) when the environment refuses
    /// the multicast join.
    pub async fn start(ttl: Duration) -> Option<TestAuditor> {
        let registry = new_registry();
        let (shutdown_tx, _) = broadcast::channel(1);

        let listener = match AnnouncementListener::bind(
            TEST_GROUP,
            Ipv4Addr::UNSPECIFIED,
            0,
            registry.clone(),
            shutdown_tx.subscribe(),
        ) {
            Ok(listener) => listener,
            Err(e) => {
                eprintln!("SKIP: cannot join multicast group in this environment: {e:#}");
                return None;
            }
        };
        let announce_port = listener
            .local_addr()
            .expect("listener should report its local addr")
            .port();

        let server = SnapshotServer::bind(
            (Ipv4Addr::LOCALHOST, 0).into(),
            registry.clone(),
            ttl,
            shutdown_tx.subscribe(),
        )
        .await
        .expect("snapshot server should bind on loopback");
        let snapshot_addr = server
            .local_addr()
            .expect("server should report its local addr");

        tokio::spawn(listener.run());
        tokio::spawn(server.run());

        Some(TestAuditor {
            registry,
            announce_port,
            snapshot_addr,
            shutdown_tx,
        })
    }

    /// Send one raw datagram to the listener as plain unicast. This exercises
    /// the same receive path as multicast without needing group routing.
    pub async fn send_datagram(&self, payload: &[u8]) {
        let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .expect("bind sender socket");
        socket
            .send_to(payload, (Ipv4Addr::LOCALHOST, self.announce_port))
            .await
            .expect("send datagram");
    }
}

impl Drop for TestAuditor {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
    }
}

/// Spawn only the snapshot server over a registry the test populates itself.
/// Keep the returned sender alive for the duration of the test.
pub async fn start_snapshot_server(
    registry: SharedRegistry,
    ttl: Duration,
) -> (SocketAddr, broadcast::Sender<()>) {
    let (shutdown_tx, _) = broadcast::channel(1);
    let server = SnapshotServer::bind(
        (Ipv4Addr::LOCALHOST, 0).into(),
        registry,
        ttl,
        shutdown_tx.subscribe(),
    )
    .await
    .expect("snapshot server should bind on loopback");
    let addr = server
        .local_addr()
        .expect("server should report its local addr");
    tokio::spawn(server.run());
    (addr, shutdown_tx)
}

/// Connect to a snapshot server and read the raw response to EOF.
pub async fn query_raw(addr: SocketAddr) -> Result<Vec<u8>> {
    let mut stream = TcpStream::connect(addr)
        .await
        .context("connect to snapshot server")?;
    let mut raw = Vec::new();
    stream
        .read_to_end(&mut raw)
        .await
        .context("read snapshot response")?;
    Ok(raw)
}

/// Connect to a snapshot server and parse the response entries.
pub async fn query_snapshot(addr: SocketAddr) -> Result<Vec<SnapshotEntry>> {
    let raw = query_raw(addr).await?;
    serde_json::from_slice(&raw).context("snapshot response is not a JSON array")
}

/// Poll `predicate` until it holds or ~2 seconds elapse.
pub async fn wait_for<F: Fn() -> bool>(predicate: F) -> bool {
    for _ in 0..100 {
        if predicate() {
            return true;
        }
        tokio::time::sleep(StdDuration::from_millis(20)).await;
    }
    predicate()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

/// A freshly started auditor answers queries with an empty orchestra.
#[tokio::test]
async fn auditor_starts_and_serves_empty_snapshot() {
    let Some(auditor) = TestAuditor::start(Duration::seconds(5)).await else {
        return;
    };

    let raw = query_raw(auditor.snapshot_addr).await.expect("query snapshot");
    assert_eq!(raw, b"[]\n");
}

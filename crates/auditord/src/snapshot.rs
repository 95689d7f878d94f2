//! Snapshot server.
//!
//! One TCP connection = one query = one response. Each accepted connection
//! gets a fresh snapshot — which is also the moment stale musicians are
//! evicted — serialized as a newline-terminated JSON array, then the stream
//! is closed. A failing or stalled client affects nothing but its own
//! connection.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

use orchestra_core::wire;
use orchestra_services::SharedRegistry;

/// Serves the active-musician snapshot over TCP.
pub struct SnapshotServer {
    listener: TcpListener,
    registry: SharedRegistry,
    ttl: Duration,
    shutdown: broadcast::Receiver<()>,
}

impl SnapshotServer {
    /// Bind the snapshot listener. Failure here is fatal to the caller.
    pub async fn bind(
        addr: SocketAddr,
        registry: SharedRegistry,
        ttl: Duration,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind snapshot listener on {addr}"))?;

        Ok(Self {
            listener,
            registry,
            ttl,
            shutdown,
        })
    }

    /// The address the server actually bound.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept queries until shutdown.
    ///
    /// Each connection is answered on its own task, so a slow client never
    /// holds up the next one. Accept errors are logged and the loop goes on.
    pub async fn run(mut self) -> Result<()> {
        tracing::info!(addr = %self.listener.local_addr()?, "snapshot server starting");

        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    tracing::info!("snapshot server stopping");
                    return Ok(());
                }
                result = self.listener.accept() => {
                    let (stream, peer_addr) = match result {
                        Ok(r) => r,
                        Err(e) => {
                            tracing::warn!(error = %e, "accept failed");
                            continue;
                        }
                    };
                    tracing::debug!(peer = %peer_addr, "snapshot query");

                    let registry = self.registry.clone();
                    let ttl = self.ttl;
                    tokio::spawn(async move {
                        if let Err(e) = answer_query(stream, registry, ttl).await {
                            tracing::debug!(peer = %peer_addr, error = %e, "snapshot query failed");
                        }
                    });
                }
            }
        }
    }
}

/// Take one snapshot and write it back. Runs per connection.
async fn answer_query(mut stream: TcpStream, registry: SharedRegistry, ttl: Duration) -> Result<()> {
    let entries = registry.snapshot(Utc::now(), ttl);
    let payload = wire::encode_snapshot(&entries).context("failed to serialize snapshot")?;

    stream
        .write_all(&payload)
        .await
        .context("failed to write snapshot")?;
    stream.shutdown().await.context("failed to close stream")?;
    Ok(())
}

//! auditord — orchestra liveness auditor daemon.

use std::net::{Ipv4Addr, SocketAddr};

use anyhow::{Context, Result};
use chrono::Duration;

use auditord::{AnnouncementListener, SnapshotServer};
use orchestra_core::config::OrchestraConfig;
use orchestra_services::new_registry;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config
    if let Err(e) = OrchestraConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = OrchestraConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        OrchestraConfig::default()
    });

    let group: Ipv4Addr = config
        .network
        .multicast_group
        .parse()
        .context("network.multicast_group is not an IPv4 address")?;
    let interface: Ipv4Addr = config
        .network
        .interface
        .parse()
        .context("network.interface is not an IPv4 address")?;
    let ttl = Duration::seconds(config.auditor.ttl_secs as i64);

    tracing::info!(
        group = %group,
        announce_port = config.network.announce_port,
        snapshot_port = config.network.snapshot_port,
        ttl_secs = config.auditor.ttl_secs,
        "auditord starting"
    );

    // Shared state
    let registry = new_registry();

    // ── Shutdown channel ─────────────────────────────────────────────────────
    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

    {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
            let _ = shutdown.send(());
        });
    }

    // Bind both sockets before spawning anything — either failing is fatal.
    let listener = AnnouncementListener::bind(
        group,
        interface,
        config.network.announce_port,
        registry.clone(),
        shutdown_tx.subscribe(),
    )?;

    let snapshot_addr = SocketAddr::from(([0, 0, 0, 0], config.network.snapshot_port));
    let server = SnapshotServer::bind(snapshot_addr, registry, ttl, shutdown_tx.subscribe()).await?;

    // ── Spawn tasks ──────────────────────────────────────────────────────────

    let listener_task = tokio::spawn(listener.run());
    let server_task = tokio::spawn(server.run());

    // ── Wait for exit ────────────────────────────────────────────────────────

    let mut shutdown_rx = shutdown_tx.subscribe();

    tokio::select! {
        _ = shutdown_rx.recv() => tracing::info!("shutting down"),
        r = listener_task      => tracing::error!("announcement listener exited: {:?}", r),
        r = server_task        => tracing::error!("snapshot server exited: {:?}", r),
    }

    Ok(())
}

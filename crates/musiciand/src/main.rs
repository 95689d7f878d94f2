//! musiciand — orchestra musician daemon.
//!
//! Plays one instrument on the multicast channel until interrupted.

use std::net::Ipv4Addr;
use std::time::Duration;

use anyhow::{Context, Result};

use musiciand::broadcast;
use orchestra_core::config::OrchestraConfig;
use orchestra_core::instrument::Instrument;

fn print_usage() {
    eprintln!("Usage: musiciand <instrument>");
    eprintln!();
    eprintln!("Instruments:");
    for instrument in Instrument::ALL {
        eprintln!("  {:<8} plays {}", instrument.name(), instrument.sound());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let instrument: Instrument = match std::env::args().nth(1) {
        Some(arg) => match arg.parse() {
            Ok(instrument) => instrument,
            Err(e) => {
                eprintln!("{e}");
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        },
        None => {
            print_usage();
            std::process::exit(1);
        }
    };

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
    let interval = Duration::from_millis(config.musician.interval_millis);

    // One identity per process lifetime.
    let identity = uuid::Uuid::new_v4().to_string();
    tracing::info!(identity = %identity, instrument = %instrument, "musiciand starting");

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

    broadcast::broadcast_loop(
        identity,
        instrument,
        group,
        config.network.announce_port,
        interval,
        shutdown_tx.subscribe(),
    )
    .await
}

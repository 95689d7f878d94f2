//! Announcement broadcast.
//!
//! Sends one announcement datagram per interval to the orchestra multicast
//! group. The payload repeats the same identity and instrument every tick;
//! only the producer timestamp changes. Sends are fire-and-forget — a failed
//! tick is logged and the next one goes out on schedule.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio::sync::broadcast;
use tokio::time;

use orchestra_core::instrument::Instrument;
use orchestra_core::wire::Announcement;

/// Broadcast announcements for one musician until shutdown.
pub async fn broadcast_loop(
    identity: String,
    instrument: Instrument,
    group: Ipv4Addr,
    port: u16,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let socket = make_sender_socket().context("failed to create multicast sender socket")?;
    let socket = UdpSocket::from_std(socket).context("failed to convert to tokio UdpSocket")?;

    let dest: SocketAddr = SocketAddrV4::new(group, port).into();
    let mut ticker = time::interval(interval);

    tracing::info!(
        identity = %identity,
        instrument = %instrument,
        dest = %dest,
        interval_millis = interval.as_millis() as u64,
        "announcement broadcast starting"
    );

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("announcement broadcast stopping");
                return Ok(());
            }
            _ = ticker.tick() => {
                let announcement = Announcement {
                    identity: identity.clone(),
                    attribute: Some(instrument.name().to_string()),
                    sound: Some(instrument.sound().to_string()),
                    timestamp: Some(Utc::now().timestamp_millis()),
                };
                let payload = match serde_json::to_vec(&announcement) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to serialize announcement");
                        continue;
                    }
                };
                match socket.send_to(&payload, dest).await {
                    Ok(n) => tracing::trace!(bytes = n, "announcement sent"),
                    Err(e) => tracing::warn!(error = %e, "announcement send failed"),
                }
            }
        }
    }
}

/// Create a UDP socket suitable for sending IPv4 multicast on the local link.
fn make_sender_socket() -> Result<std::net::UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP)).context("socket()")?;

    socket.set_nonblocking(true).context("set_nonblocking")?;
    // TTL 1 — stay on the local link, do not route beyond it
    socket
        .set_multicast_ttl_v4(1)
        .context("IP_MULTICAST_TTL")?;
    // Loopback on, so a same-host auditor hears us
    socket
        .set_multicast_loop_v4(true)
        .context("IP_MULTICAST_LOOP")?;

    let bind_addr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0);
    socket.bind(&bind_addr.into()).context("bind()")?;

    Ok(socket.into())
}

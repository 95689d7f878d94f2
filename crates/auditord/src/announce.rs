//! Announcement listener.
//!
//! Joins the orchestra multicast group and ingests musician announcements.
//! Every decodable datagram is upserted into the registry stamped with the
//! local receipt time — the producer's embedded `timestamp` is advisory and
//! takes no part in liveness. Undecodable datagrams are dropped and the loop
//! keeps listening. Nothing here ever removes a musician; eviction belongs
//! to the snapshot path.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use anyhow::{Context, Result};
use chrono::Utc;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio::sync::broadcast;

use orchestra_core::wire::{self, Announcement};
use orchestra_services::{SharedRegistry, UpsertOutcome};

/// Receives announcement datagrams and feeds the registry.
pub struct AnnouncementListener {
    socket: UdpSocket,
    registry: SharedRegistry,
    shutdown: broadcast::Receiver<()>,
}

impl AnnouncementListener {
    /// Bind the announcement socket and join the multicast group.
    ///
    /// Any failure here means the auditor cannot hear the orchestra; callers
    /// treat it as fatal. Pass `port` 0 to bind an ephemeral port (tests).
    pub fn bind(
        group: Ipv4Addr,
        interface: Ipv4Addr,
        port: u16,
        registry: SharedRegistry,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<Self> {
        let socket = make_listener_socket(group, interface, port)
            .context("failed to create multicast listener socket")?;
        let socket = UdpSocket::from_std(socket).context("failed to convert to tokio UdpSocket")?;

        Ok(Self {
            socket,
            registry,
            shutdown,
        })
    }

    /// The address the listener actually bound.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Receive announcements until shutdown.
    ///
    /// Receive errors and bad datagrams are logged and skipped — the loop
    /// only ends on shutdown.
    pub async fn run(mut self) -> Result<()> {
        let mut buf = vec![0u8; wire::MAX_DATAGRAM];

        tracing::info!(addr = %self.socket.local_addr()?, "announcement listener starting");

        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    tracing::info!("announcement listener stopping");
                    return Ok(());
                }
                result = self.socket.recv_from(&mut buf) => {
                    let (len, peer_addr) = match result {
                        Ok(r) => r,
                        Err(e) => {
                            tracing::warn!(error = %e, "recv_from failed");
                            continue;
                        }
                    };
                    self.ingest(&buf[..len], peer_addr);
                }
            }
        }
    }

    /// Decode one datagram and upsert the registry with the receipt time.
    fn ingest(&self, datagram: &[u8], peer_addr: SocketAddr) {
        let Announcement {
            identity,
            attribute,
            ..
        } = match wire::decode_announcement(datagram) {
            Ok(announcement) => announcement,
            Err(e) => {
                tracing::debug!(error = %e, from = %peer_addr, "dropping undecodable announcement");
                return;
            }
        };

        match self.registry.upsert(identity.clone(), attribute, Utc::now()) {
            UpsertOutcome::Registered => {
                tracing::debug!(identity = %identity, from = %peer_addr, "musician registered");
            }
            UpsertOutcome::Refreshed => {
                tracing::trace!(identity = %identity, "musician refreshed");
            }
        }
    }
}

/// Create a UDP socket bound to `port` and joined to the multicast group.
fn make_listener_socket(
    group: Ipv4Addr,
    interface: Ipv4Addr,
    port: u16,
) -> Result<std::net::UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP)).context("socket()")?;

    socket.set_reuse_address(true).context("SO_REUSEADDR")?;
    #[cfg(unix)]
    socket.set_reuse_port(true).context("SO_REUSEPORT")?;
    socket.set_nonblocking(true).context("set_nonblocking")?;

    let bind_addr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port);
    socket.bind(&bind_addr.into()).context("bind()")?;

    socket
        .join_multicast_v4(&group, &interface)
        .context("IP_ADD_MEMBERSHIP")?;

    Ok(socket.into())
}

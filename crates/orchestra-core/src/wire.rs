//! Orchestra wire format — on-wire payloads for both channels.
//!
//! These shapes ARE the protocol. Announcements travel as one JSON object per
//! UDP datagram; snapshots travel as one newline-terminated JSON array per
//! TCP connection. Field names are part of the format — `firstSeenAt` is
//! camelCase on the wire regardless of what the Rust side calls it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Constants ─────────────────────────────────────────────────────────────────

/// IPv4 multicast group announcements are sent to.
pub const MULTICAST_GROUP: &str = "239.255.22.5";

/// UDP port on which announcements are received.
pub const ANNOUNCE_PORT: u16 = 9009;

/// TCP port on which snapshots are served.
pub const SNAPSHOT_PORT: u16 = 2205;

/// Default liveness window in seconds.
/// A musician silent for longer than this is dropped at the next snapshot.
pub const ACTIVE_TTL_SECS: u64 = 5;

/// Default announcement interval in milliseconds.
pub const ANNOUNCE_INTERVAL_MILLIS: u64 = 1000;

/// Largest announcement datagram the listener will read.
pub const MAX_DATAGRAM: usize = 1024;

// ── Announcement ──────────────────────────────────────────────────────────────

/// One musician liveness datagram.
///
/// Only `identity` matters to the auditor. `attribute` may be absent when the
/// producer lost it; `sound` is the noise the instrument makes and is purely
/// advisory; `timestamp` is the producer's wall clock in milliseconds and
/// takes no part in liveness — the auditor stamps its own receipt time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    /// Unique musician token. Rejected at decode time when absent or empty.
    #[serde(default)]
    pub identity: String,

    /// Classification tag — the instrument name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,

    /// What the instrument sounds like.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,

    /// Producer-side wall clock, milliseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

/// Parse one announcement datagram.
///
/// Tolerant of extra fields and missing optional ones; strict about
/// `identity`, which every record is keyed on.
pub fn decode_announcement(bytes: &[u8]) -> Result<Announcement, DecodeError> {
    let announcement: Announcement = serde_json::from_slice(bytes)?;
    if announcement.identity.is_empty() {
        return Err(DecodeError::MissingIdentity);
    }
    Ok(announcement)
}

// ── Snapshot ──────────────────────────────────────────────────────────────────

/// One active musician in a snapshot response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEntry {
    pub identity: String,

    /// Omitted from the wire entirely when unknown, never `null`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,

    /// Receipt time of the first announcement, RFC 3339 on the wire.
    pub first_seen_at: DateTime<Utc>,
}

/// Serialize a snapshot as the one-shot TCP response.
///
/// The trailing newline is part of the wire format. An empty snapshot is a
/// valid response: `[]` plus newline.
pub fn encode_snapshot(entries: &[SnapshotEntry]) -> serde_json::Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec(entries)?;
    bytes.push(b'\n');
    Ok(bytes)
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Failures turning a datagram into an [`Announcement`].
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Not JSON, or JSON whose fields have the wrong types.
    #[error("malformed announcement: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Well-formed JSON with no usable identity to key a record on.
    #[error("announcement identity is missing or empty")]
    MissingIdentity,
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! Liveness policy — the one place the TTL comparison lives.
//!
//! Kept as a pure function of `(now, last_seen_at, ttl)` so the policy is
//! testable without sockets or sleeps. The registry calls this during
//! snapshots; nothing else decides who is active.

use chrono::{DateTime, Duration, Utc};

/// Whether a musician last heard at `last_seen_at` still counts as active
/// at `now`.
///
/// Silence of exactly the TTL is still active; eviction starts strictly
/// beyond it. A `last_seen_at` in the future (clock steps, races) counts as
/// active rather than underflowing.
pub fn is_active(now: DateTime<Utc>, last_seen_at: DateTime<Utc>, ttl: Duration) -> bool {
    now.signed_duration_since(last_seen_at) <= ttl
}

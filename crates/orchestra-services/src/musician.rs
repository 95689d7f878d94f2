//! Musician registry — tracks who is playing and when they were last heard.
//!
//! The registry is the one piece of state shared between the announcement
//! listener and the snapshot server. Every operation takes the single mutex,
//! so an upsert is never lost to a concurrent read and a snapshot always
//! observes a consistent set. Eviction happens only inside
//! [`MusicianRegistry::snapshot`]; with no queries arriving, stale entries
//! simply sit there until the next one.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use indexmap::map::Entry;
use indexmap::IndexMap;
use parking_lot::Mutex;

use orchestra_core::liveness;
use orchestra_core::wire::SnapshotEntry;

/// Tracked state for one musician. The identity is the registry key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MusicianRecord {
    /// Classification tag recorded at first observation, frozen afterwards.
    pub attribute: Option<String>,

    /// Receipt time of the first announcement. Set exactly once.
    pub first_seen_at: DateTime<Utc>,

    /// Receipt time of the latest announcement. Never moves backwards.
    pub last_seen_at: DateTime<Utc>,
}

/// What an upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// First time this identity was heard.
    Registered,
    /// Known identity, liveness refreshed.
    Refreshed,
}

/// Insertion-ordered musician map behind one lock.
///
/// Snapshots iterate in registration order, so two snapshots over the same
/// state list musicians identically.
#[derive(Debug, Default)]
pub struct MusicianRegistry {
    inner: Mutex<IndexMap<String, MusicianRecord>>,
}

impl MusicianRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an announcement received at `seen_at`.
    ///
    /// A never-seen identity is registered with `first_seen_at` and
    /// `last_seen_at` both at `seen_at`. A known identity only has its
    /// `last_seen_at` moved, and only forward — duplicated or re-ordered
    /// datagrams cannot age a musician toward eviction. The attribute is
    /// whatever the first announcement carried; later values are ignored.
    pub fn upsert(
        &self,
        identity: String,
        attribute: Option<String>,
        seen_at: DateTime<Utc>,
    ) -> UpsertOutcome {
        let mut inner = self.inner.lock();
        match inner.entry(identity) {
            Entry::Vacant(slot) => {
                slot.insert(MusicianRecord {
                    attribute,
                    first_seen_at: seen_at,
                    last_seen_at: seen_at,
                });
                UpsertOutcome::Registered
            }
            Entry::Occupied(mut slot) => {
                let record = slot.get_mut();
                record.last_seen_at = record.last_seen_at.max(seen_at);
                UpsertOutcome::Refreshed
            }
        }
    }

    /// List the musicians still active at `now` and drop everyone who is not.
    ///
    /// This is the only path that evicts. The check and the removal happen
    /// under the same lock acquisition, so an upsert racing a snapshot either
    /// lands before it (and is judged) or after it (and starts fresh), never
    /// halfway.
    pub fn snapshot(&self, now: DateTime<Utc>, ttl: Duration) -> Vec<SnapshotEntry> {
        let mut inner = self.inner.lock();
        let mut entries = Vec::with_capacity(inner.len());
        inner.retain(|identity, record| {
            if liveness::is_active(now, record.last_seen_at, ttl) {
                entries.push(SnapshotEntry {
                    identity: identity.clone(),
                    attribute: record.attribute.clone(),
                    first_seen_at: record.first_seen_at,
                });
                true
            } else {
                tracing::debug!(identity = %identity, "musician expired");
                false
            }
        });
        entries
    }

    /// Copy of one record, if present.
    pub fn get(&self, identity: &str) -> Option<MusicianRecord> {
        self.inner.lock().get(identity).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

/// The registry handle shared between the listener and the snapshot server.
pub type SharedRegistry = Arc<MusicianRegistry>;

/// Create a new empty musician registry.
pub fn new_registry() -> SharedRegistry {
    Arc::new(MusicianRegistry::new())
}

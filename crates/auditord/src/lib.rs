//! auditord — passive liveness auditor for the orchestra multicast channel.
//!
//! Two loops share one registry: the announcement listener ingests musician
//! datagrams, the snapshot server answers TCP queries with the currently
//! active set. Built as a library so the integration suite can drive the
//! real loops on ephemeral ports.

pub mod announce;
pub mod snapshot;

pub use announce::AnnouncementListener;
pub use snapshot::SnapshotServer;

//! orchestra-services — shared mutable state for the orchestra daemons.

pub mod musician;

pub use musician::{new_registry, MusicianRecord, MusicianRegistry, SharedRegistry, UpsertOutcome};

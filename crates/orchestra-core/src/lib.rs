//! orchestra-core — wire format, instrument table, liveness policy, and
//! configuration. All other orchestra crates depend on this one.

pub mod config;
pub mod instrument;
pub mod liveness;
pub mod wire;

pub use instrument::Instrument;

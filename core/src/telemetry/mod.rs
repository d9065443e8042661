//! telemetry/mod.rs
//! Counters, a run timer, and immutable snapshots for encode/decode/map runs.

pub mod counters;
pub mod timers;
pub mod snapshot;

pub use counters::*;
pub use timers::*;
pub use snapshot::*;

//! ursparse-core
//!
//! Sparse file <-> ursparse transfer format engine.
//! Only data extents cross the wire; holes are recreated on the far side.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;

pub mod telemetry;

// Transfer layers
pub mod transfer;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::constants::{DEFAULT_BLOCK_SIZE, MIN_BLOCK_SIZE};
    pub use crate::telemetry::TelemetrySnapshot;
    pub use crate::transfer::core::{decode_bytes, decode_stream, encode_sparse, map_sparse, ApiConfig};
    pub use crate::transfer::framing::{Segment, TransferDecoder};
    pub use crate::transfer::io::InputSource;
    pub use crate::transfer::sink::{HoleMode, MemorySink, OutputSink, SeekSink, ZeroFillSink};
    pub use crate::transfer::source::{FileSource, MemorySource, SparseSource};
    pub use crate::types::StreamError;
}

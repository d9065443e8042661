//! transfer: sparse file <-> ursparse transfer format.
//!
//! Layers, leaves first: `framing` (parsers, decoder, header encoding),
//! `sink` and `source` (I/O seams), `scan` (extent discovery, encode, map),
//! `io` and `core` (orchestration and the public entry points).

pub mod framing;
pub mod sink;
pub mod source;
pub mod scan;
pub mod io;
pub mod core;

pub use self::io::{
    InputSource,
    OutputTarget,
};

pub use self::core::{
    decode_bytes,
    decode_stream,
    encode_sparse,
    map_sparse,
    ApiConfig,
};

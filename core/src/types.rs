use std::io;

use thiserror::Error;

use crate::transfer::framing::{DecoderState, FramingError};

/// Unified stream error covering parsing, sink, source and orchestration failures.
/// - Ergonomic `From<T>` impls enable `?` across the layers.
/// - Every variant is terminal for the run; nothing is retried.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Unexpected byte or overflow while parsing a record header.
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    /// Input ended while a record was still open.
    #[error("truncated record at offset {offset}: declared {declared} bytes, {remaining} missing")]
    Truncation {
        offset: u64,
        declared: u64,
        remaining: u64,
    },

    #[error("could not write to output: {0}")]
    SinkWrite(#[source] io::Error),

    #[error("could not seek output (hole): {0}")]
    SinkSeek(#[source] io::Error),

    /// The sink accepted fewer payload bytes than offered. Internal invariant violation.
    #[error("sink underrun: offered {offered} bytes, accepted {accepted}")]
    SinkUnderrun { offered: usize, accepted: usize },

    /// Data/hole discovery failed for a reason other than end-of-file.
    #[error("could not seek input: {0}")]
    SourceSeek(#[source] io::Error),

    #[error("could not read input: {0}")]
    SourceRead(#[source] io::Error),

    /// Bulk copy of an extent from the source to the output failed.
    #[error("could not copy data: {0}")]
    Copy(#[source] io::Error),

    /// Bulk copy of an extent returned fewer bytes than the extent length.
    #[error("short copy at offset {offset}: expected {expected} bytes, got {actual}")]
    ShortCopy {
        offset: u64,
        expected: u64,
        actual: u64,
    },

    #[error("I/O error on input: {0}")]
    Input(#[source] io::Error),

    #[error("I/O error on output: {0}")]
    Output(#[source] io::Error),

    /// Decoder was called again after it failed.
    #[error("decoder is in error state")]
    DecoderFailed,

    /// The decoder consumed nothing from a non-empty buffer without finishing a record.
    #[error("decoder made no progress in state {state:?}")]
    DecoderStalled { state: DecoderState },

    /// Invalid configuration or caller-supplied arguments.
    #[error("validation error: {0}")]
    Validation(String),
}

impl StreamError {
    /// True for errors that come from malformed or incomplete transfer input,
    /// as opposed to I/O on either side.
    pub fn is_input_format(&self) -> bool {
        matches!(self, StreamError::Framing(_) | StreamError::Truncation { .. })
    }
}

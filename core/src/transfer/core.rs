//! Stable public API: decode (orchestrator), encode and map.

use std::io::{ErrorKind, Read};

use tracing::{debug, error, info};

use crate::constants::{DEFAULT_BLOCK_SIZE, MAX_BLOCK_SIZE, MIN_BLOCK_SIZE};
use crate::telemetry::{Operation, TelemetryCounters, TelemetrySnapshot, TelemetryTimer};
use crate::transfer::framing::{DecodeStatus, TransferDecoder};
use crate::transfer::io::{open_input, InputSource};
use crate::transfer::sink::OutputSink;
use crate::types::StreamError;

pub use crate::transfer::scan::{encode_sparse, map_sparse};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Size of the single read buffer used for the whole decode run.
    pub block_size: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { block_size: DEFAULT_BLOCK_SIZE }
    }
}

impl ApiConfig {
    pub fn new(block_size: Option<usize>) -> Self {
        Self { block_size: block_size.unwrap_or(DEFAULT_BLOCK_SIZE) }
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn validate(&self) -> Result<(), StreamError> {
        if !(MIN_BLOCK_SIZE..=MAX_BLOCK_SIZE).contains(&self.block_size) {
            return Err(StreamError::Validation(format!(
                "invalid block size: {}, must be within {MIN_BLOCK_SIZE}..={MAX_BLOCK_SIZE}",
                self.block_size
            )));
        }
        Ok(())
    }
}

/// Decode an ursparse stream from `input` into `sink`.
///
/// One read buffer of `config.block_size` bytes lives for the whole run.
/// A zero-length read ends input; a record still open at that point is a
/// `Truncation` error.
pub fn decode_stream<S>(
    input: InputSource,
    sink: &mut S,
    config: &ApiConfig,
) -> Result<TelemetrySnapshot, StreamError>
where
    S: OutputSink + ?Sized,
{
    config.validate()?;
    let mut reader = open_input(input)?;

    info!(block_size = config.block_size, hole_mode = ?sink.hole_mode(), "decode started");

    let timer = TelemetryTimer::new();
    let mut counters = TelemetryCounters::default();

    match decode_loop(&mut reader, sink, config.block_size, &mut counters) {
        Ok(()) => {
            let snapshot = TelemetrySnapshot::from(Operation::Decode, &counters, &timer);
            info!(records = snapshot.records, payload_bytes = snapshot.payload_bytes, "decode finished");
            Ok(snapshot)
        }
        Err(e) => {
            error!(error = %e, records = counters.records, "decode failed");
            Err(e)
        }
    }
}

/// Decode an in-memory ursparse stream with the default configuration.
pub fn decode_bytes<S>(bytes: &[u8], sink: &mut S) -> Result<TelemetrySnapshot, StreamError>
where
    S: OutputSink + ?Sized,
{
    decode_stream(InputSource::Memory(bytes.to_vec()), sink, &ApiConfig::default())
}

fn decode_loop<R, S>(
    reader: &mut R,
    sink: &mut S,
    block_size: usize,
    counters: &mut TelemetryCounters,
) -> Result<(), StreamError>
where
    R: Read + ?Sized,
    S: OutputSink + ?Sized,
{
    let mut buf = vec![0u8; block_size];
    let mut decoder = TransferDecoder::new();
    let mut write_end = 0u64;

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(StreamError::Input(e)),
        };

        let mut cursor = 0;
        while cursor < n {
            let progress = decoder.decode(&buf[cursor..n], sink)?;
            if progress.consumed == 0 && !progress.is_complete() {
                return Err(StreamError::DecoderStalled { state: decoder.state() });
            }
            cursor += progress.consumed;

            if let DecodeStatus::Completed { segment, header_len } = progress.status {
                if segment.size > 0 {
                    if segment.offset > write_end {
                        counters.add_hole(segment.offset - write_end);
                    }
                    write_end = write_end.max(segment.end());
                }
                counters.add_segment(header_len, segment.size);
            }
        }
        debug!(bytes = n, "block consumed");
    }

    decoder.finish()?;
    sink.flush_sink().map_err(StreamError::SinkWrite)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_bounds() {
        assert!(ApiConfig::default().validate().is_ok());
        assert!(ApiConfig::new(Some(MIN_BLOCK_SIZE)).validate().is_ok());
        assert!(ApiConfig::new(Some(1)).validate().is_err());
        assert!(ApiConfig::default().with_block_size(MAX_BLOCK_SIZE + 1).validate().is_err());
    }
}

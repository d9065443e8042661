//! Extent discovery over a sparse source, and the two consumers of it:
//! the transfer encoder and the human-readable map.

use std::io::{self, ErrorKind, Write};

use tracing::{debug, info};

use crate::telemetry::{Operation, TelemetryCounters, TelemetrySnapshot, TelemetryTimer};
use crate::transfer::framing::write_record_header;
use crate::transfer::source::{DataLookup, Extent, HoleLookup, SparseSource};
use crate::types::StreamError;

/// Walks a source's data extents from offset 0, one lookup pair per extent.
///
/// Fused: after `None` or an error it yields nothing more.
pub struct ExtentScanner<'a, S: SparseSource + ?Sized> {
    source: &'a mut S,
    pos: u64,
    done: bool,
}

impl<'a, S: SparseSource + ?Sized> ExtentScanner<'a, S> {
    pub fn new(source: &'a mut S) -> Self {
        Self { source, pos: 0, done: false }
    }

    /// The scanned source, for copying an extent between two `next` calls.
    pub fn source_mut(&mut self) -> &mut S {
        &mut *self.source
    }

    fn advance(&mut self) -> Result<Option<Extent>, StreamError> {
        let start = match self.source.next_data(self.pos)? {
            DataLookup::Data(p) => p,
            DataLookup::NoMoreData => return Ok(None),
        };

        let end = match self.source.next_hole(start)? {
            HoleLookup::Hole(h) => h,
            HoleLookup::EndOfFileInData => {
                self.done = true;
                let size = self.source.size()?;
                if size <= start {
                    return Ok(None);
                }
                size
            }
        };

        if end <= start {
            return Err(StreamError::SourceSeek(io::Error::new(
                ErrorKind::InvalidData,
                format!("source reported an empty data extent at {start} (hole at {end})"),
            )));
        }

        self.pos = end;
        Ok(Some(Extent::new(start, end - start)))
    }
}

impl<S: SparseSource + ?Sized> Iterator for ExtentScanner<'_, S> {
    type Item = Result<Extent, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.advance() {
            Ok(Some(extent)) => Some(Ok(extent)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Emit every data extent of `source` as an ursparse record on `out`.
pub fn encode_sparse<S, W>(source: &mut S, out: &mut W) -> Result<TelemetrySnapshot, StreamError>
where
    S: SparseSource + ?Sized,
    W: Write + ?Sized,
{
    let timer = TelemetryTimer::new();
    let mut counters = TelemetryCounters::default();
    let mut prev_end = 0u64;
    let mut scanner = ExtentScanner::new(source);

    while let Some(extent) = scanner.next() {
        let Extent { offset, length } = extent?;
        debug!(offset, length, "processing segment");

        let header_len = write_record_header(out, offset, length).map_err(StreamError::Output)?;
        let copied = scanner.source_mut().copy_range(offset, length, out)?;
        if copied != length {
            return Err(StreamError::ShortCopy { offset, expected: length, actual: copied });
        }

        counters.add_hole(offset - prev_end);
        counters.add_extent(header_len, length);
        prev_end = offset + length;
    }

    out.flush().map_err(StreamError::Output)?;

    let snapshot = TelemetrySnapshot::from(Operation::Encode, &counters, &timer);
    info!(records = snapshot.records, payload_bytes = snapshot.payload_bytes, "encode finished");
    Ok(snapshot)
}

/// List every data extent of `source` as `"<offset> <length>"` lines. No payload is read.
pub fn map_sparse<S, W>(source: &mut S, out: &mut W) -> Result<TelemetrySnapshot, StreamError>
where
    S: SparseSource + ?Sized,
    W: Write + ?Sized,
{
    let timer = TelemetryTimer::new();
    let mut counters = TelemetryCounters::default();
    let mut prev_end = 0u64;

    for extent in ExtentScanner::new(source) {
        let Extent { offset, length } = extent?;
        writeln!(out, "{offset} {length}").map_err(StreamError::Output)?;

        counters.add_hole(offset - prev_end);
        counters.add_mapped(length);
        prev_end = offset + length;
    }

    out.flush().map_err(StreamError::Output)?;
    Ok(TelemetrySnapshot::from(Operation::Map, &counters, &timer))
}

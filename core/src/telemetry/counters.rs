//! telemetry/counters.rs
//! Mutable counters used during a run.
//!
//! Converted into an immutable TelemetrySnapshot at the end of the run.
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// Deterministic counters collected during stream processing
#[derive(Default, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TelemetryCounters {
    /// Complete records decoded or emitted.
    pub records: u64,
    /// Header bytes (`"<offset> <length>\n"` plus padding) consumed or emitted.
    pub header_bytes: u64,
    /// Payload bytes written to the sink or copied from the source.
    pub payload_bytes: u64,
    /// Bytes skipped between consecutive segments (holes). Trailing holes are not counted.
    pub hole_bytes: u64,
    /// Data extents discovered by the scanner.
    pub extents: u64,
}

impl TelemetryCounters {
    /// Record one complete decoded segment.
    pub fn add_segment(&mut self, header_len: usize, payload_len: u64) {
        self.records += 1;
        self.header_bytes += header_len as u64;
        self.payload_bytes += payload_len;
    }

    /// Record one extent emitted by the encoder (header + payload).
    pub fn add_extent(&mut self, header_len: usize, payload_len: u64) {
        self.extents += 1;
        self.records += 1;
        self.header_bytes += header_len as u64;
        self.payload_bytes += payload_len;
    }

    /// Record one extent that was only listed (map mode).
    pub fn add_mapped(&mut self, length: u64) {
        self.extents += 1;
        self.payload_bytes += length;
    }

    pub fn add_hole(&mut self, len: u64) {
        self.hole_bytes += len;
    }

    /// Total bytes on the wire for the records counted so far.
    pub fn wire_bytes(&self) -> u64 {
        self.header_bytes + self.payload_bytes
    }
}

impl AddAssign for TelemetryCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.records       += rhs.records;
        self.header_bytes  += rhs.header_bytes;
        self.payload_bytes += rhs.payload_bytes;
        self.hole_bytes    += rhs.hole_bytes;
        self.extents       += rhs.extents;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_assign_merges_every_field() {
        let mut a = TelemetryCounters::default();
        a.add_segment(7, 10);
        a.add_hole(4);

        let mut b = TelemetryCounters::default();
        b.add_extent(9, 20);

        a += b;
        assert_eq!(a.records, 2);
        assert_eq!(a.header_bytes, 16);
        assert_eq!(a.payload_bytes, 30);
        assert_eq!(a.hole_bytes, 4);
        assert_eq!(a.extents, 1);
        assert_eq!(a.wire_bytes(), 46);
    }
}

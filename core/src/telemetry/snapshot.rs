//! Immutable end-of-run summary.

use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::telemetry::counters::TelemetryCounters;
use crate::telemetry::timers::TelemetryTimer;

/// Which core operation produced the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Decode,
    Encode,
    Map,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub operation: Operation,
    pub records: u64,
    pub extents: u64,
    pub header_bytes: u64,
    pub payload_bytes: u64,
    pub hole_bytes: u64,
    pub throughput_payload_bytes_per_sec: f64,
    pub elapsed: Duration,
}

impl TelemetrySnapshot {
    pub fn from(operation: Operation, counters: &TelemetryCounters, timer: &TelemetryTimer) -> Self {
        let elapsed = timer.elapsed();

        let throughput = if elapsed.as_secs_f64() > 0.0 {
            counters.payload_bytes as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        Self {
            operation,
            records: counters.records,
            extents: counters.extents,
            header_bytes: counters.header_bytes,
            payload_bytes: counters.payload_bytes,
            hole_bytes: counters.hole_bytes,
            throughput_payload_bytes_per_sec: throughput,
            elapsed,
        }
    }

    /// Header plus payload bytes that crossed the wire.
    pub fn wire_bytes(&self) -> u64 {
        self.header_bytes + self.payload_bytes
    }

    /// Render as a single JSON line.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

use tracing::debug;

use crate::transfer::framing::parse::{parse_newline, parse_uint};
use crate::transfer::framing::types::{FieldKind, ParseStatus, Segment, UintField};
use crate::transfer::sink::OutputSink;
use crate::types::StreamError;

/// Phase of the record currently being decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    Start,
    Offset,
    Size,
    Newline,
    Meat,
    /// Permanent. Entered on the first failure and never left.
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    /// Buffer exhausted before the current record finished.
    NeedMore,
    /// A record finished in this call. `segment.size` is the declared length.
    Completed { segment: Segment, header_len: usize },
}

/// Outcome of one `decode` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Bytes of the input slice consumed by this call (header and payload).
    pub consumed: usize,
    pub status: DecodeStatus,
}

impl Progress {
    fn need_more(consumed: usize) -> Self {
        Self { consumed, status: DecodeStatus::NeedMore }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.status, DecodeStatus::Completed { .. })
    }
}

/// Resumable decoder for the ursparse transfer format.
///
/// Feed it arbitrary slices of the stream; it keeps the phase, the field
/// accumulators and the remaining payload count between calls. A call
/// returns as soon as a record completes or the slice is used up, so callers
/// loop on the unconsumed remainder.
#[derive(Debug, Clone)]
pub struct TransferDecoder {
    state: DecoderState,
    offset: UintField,
    size: UintField,
    /// Set on entering `Meat`; `size` counts down to 0.
    segment: Segment,
    header_len: usize,
}

impl Default for TransferDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferDecoder {
    pub fn new() -> Self {
        Self {
            state: DecoderState::Start,
            offset: UintField::default(),
            size: UintField::default(),
            segment: Segment::default(),
            header_len: 0,
        }
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    pub fn is_failed(&self) -> bool {
        self.state == DecoderState::Error
    }

    /// Segment being written while in `Meat` (size = bytes still missing).
    pub fn current_segment(&self) -> Option<Segment> {
        (self.state == DecoderState::Meat).then_some(self.segment)
    }

    /// True once any byte of a record other than leading whitespace was seen.
    pub fn is_record_in_progress(&self) -> bool {
        match self.state {
            DecoderState::Start | DecoderState::Error => false,
            DecoderState::Offset => self.offset.digits_seen,
            DecoderState::Size | DecoderState::Newline | DecoderState::Meat => true,
        }
    }

    /// Decode as much of `buf` as belongs to the current record.
    pub fn decode<S>(&mut self, buf: &[u8], sink: &mut S) -> Result<Progress, StreamError>
    where
        S: OutputSink + ?Sized,
    {
        if self.is_failed() {
            return Err(StreamError::DecoderFailed);
        }

        self.step(buf, sink).map_err(|e| {
            self.state = DecoderState::Error;
            e
        })
    }

    /// Classify end of input. An open record becomes `Truncation`.
    pub fn finish(&mut self) -> Result<(), StreamError> {
        if self.is_failed() {
            return Err(StreamError::DecoderFailed);
        }
        if !self.is_record_in_progress() {
            return Ok(());
        }

        let err = match self.state {
            DecoderState::Meat => StreamError::Truncation {
                offset: self.segment.offset,
                declared: self.size.value,
                remaining: self.segment.size,
            },
            // header cut short
            _ => StreamError::Truncation {
                offset: self.offset.value,
                declared: self.size.value,
                remaining: self.size.value,
            },
        };
        self.state = DecoderState::Error;
        Err(err)
    }

    fn step<S>(&mut self, buf: &[u8], sink: &mut S) -> Result<Progress, StreamError>
    where
        S: OutputSink + ?Sized,
    {
        let mut cursor = 0usize;

        loop {
            let rest = &buf[cursor..];

            match self.state {
                DecoderState::Start => {
                    self.state = DecoderState::Offset;
                }

                DecoderState::Offset => {
                    let status = parse_uint(rest, &mut self.offset, FieldKind::Offset)?;
                    cursor += self.take_header(status);
                    if let ParseStatus::NeedMore(_) = status {
                        return Ok(Progress::need_more(cursor));
                    }
                    self.state = DecoderState::Size;
                }

                DecoderState::Size => {
                    let status = parse_uint(rest, &mut self.size, FieldKind::Length)?;
                    cursor += self.take_header(status);
                    if let ParseStatus::NeedMore(_) = status {
                        return Ok(Progress::need_more(cursor));
                    }
                    self.state = DecoderState::Newline;
                }

                DecoderState::Newline => {
                    let status = parse_newline(rest)?;
                    cursor += self.take_header(status);
                    if let ParseStatus::NeedMore(_) = status {
                        return Ok(Progress::need_more(cursor));
                    }
                    self.enter_meat(sink)?;
                }

                DecoderState::Meat => {
                    let want = rest.len().min(usize::try_from(self.segment.size).unwrap_or(usize::MAX));
                    if want > 0 {
                        let accepted = sink.write_payload(&rest[..want]).map_err(StreamError::SinkWrite)?;
                        if accepted != want {
                            return Err(StreamError::SinkUnderrun { offered: want, accepted });
                        }
                        self.segment.size -= accepted as u64;
                        cursor += accepted;
                    }

                    if self.segment.size > 0 {
                        return Ok(Progress::need_more(cursor));
                    }

                    let done = Segment::new(self.segment.offset, self.size.value);
                    let header_len = self.header_len;
                    self.reset();
                    return Ok(Progress {
                        consumed: cursor,
                        status: DecodeStatus::Completed { segment: done, header_len },
                    });
                }

                DecoderState::Error => return Err(StreamError::DecoderFailed),
            }
        }
    }

    fn take_header(&mut self, status: ParseStatus) -> usize {
        let n = status.consumed();
        self.header_len += n;
        n
    }

    fn enter_meat<S>(&mut self, sink: &mut S) -> Result<(), StreamError>
    where
        S: OutputSink + ?Sized,
    {
        let offset = self.offset.value;
        let size = self.size.value;
        debug!(offset, length = size, "processing segment");

        sink.seek_hole(offset).map_err(StreamError::SinkSeek)?;

        self.segment = Segment::new(offset, size);
        self.state = DecoderState::Meat;
        Ok(())
    }

    fn reset(&mut self) {
        *self = Self::new();
    }
}

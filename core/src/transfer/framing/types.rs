use std::fmt;

use thiserror::Error;

/// A declared destination range.
///
/// Inside the decoder `size` is the remaining byte count of the record being
/// written; once the record completes it is reported with its declared size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Segment {
    pub offset: u64,
    pub size: u64,
}

impl Segment {
    pub const fn new(offset: u64, size: u64) -> Self {
        Self { offset, size }
    }

    /// First byte past the segment.
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.size)
    }
}

/// Header field currently being parsed, used in error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Offset,
    Length,
    Newline,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Offset => f.write_str("offset"),
            FieldKind::Length => f.write_str("length"),
            FieldKind::Newline => f.write_str("newline"),
        }
    }
}

/// Result of one call into a field parser.
///
/// Both variants carry the number of bytes consumed from the slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStatus {
    /// Field finished; the caller continues with the next phase.
    Done(usize),
    /// Slice exhausted; call again with the next buffer and the same state.
    NeedMore(usize),
}

impl ParseStatus {
    pub fn consumed(&self) -> usize {
        match *self {
            ParseStatus::Done(n) | ParseStatus::NeedMore(n) => n,
        }
    }
}

/// Accumulator for one decimal header field, kept across calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UintField {
    pub value: u64,
    /// At least one digit was consumed. Leading whitespace is only skipped before that.
    pub digits_seen: bool,
}

impl UintField {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FramingError {
    #[error("invalid byte 0x{byte:02x} ({}) while parsing {field}", printable(.byte))]
    MalformedHeader { field: FieldKind, byte: u8 },

    #[error("{field} does not fit in 64 bits")]
    FieldOverflow { field: FieldKind },
}

fn printable(byte: &u8) -> char {
    if byte.is_ascii_graphic() { *byte as char } else { '?' }
}

//! Output sinks for decoded payload.
//!
//! A sink takes payload writes plus absolute "skip to" positions. Whether the
//! skipped range turns into a real hole depends on the backend, so each sink
//! reports its `HoleMode`.

use std::io::{self, ErrorKind, Seek, SeekFrom, Write};

use crate::constants::ZERO_FILL_CHUNK;
use crate::transfer::framing::Segment;

/// How a sink materialises the range skipped by `seek_hole`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoleMode {
    /// Positioning past the last write leaves an unallocated hole once a later write lands.
    Sparse,
    /// Skipped bytes are written out as zeros.
    ZeroFill,
}

pub trait OutputSink {
    /// Write payload at the current position. Returns bytes accepted.
    fn write_payload(&mut self, data: &[u8]) -> io::Result<usize>;

    /// Move to absolute `offset`. Writes must arrive in increasing offset order
    /// for `ZeroFill` sinks; `Sparse` sinks accept any position.
    fn seek_hole(&mut self, offset: u64) -> io::Result<()>;

    fn hole_mode(&self) -> HoleMode;

    fn flush_sink(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<T: OutputSink + ?Sized> OutputSink for &mut T {
    fn write_payload(&mut self, data: &[u8]) -> io::Result<usize> {
        (**self).write_payload(data)
    }
    fn seek_hole(&mut self, offset: u64) -> io::Result<()> {
        (**self).seek_hole(offset)
    }
    fn hole_mode(&self) -> HoleMode {
        (**self).hole_mode()
    }
    fn flush_sink(&mut self) -> io::Result<()> {
        (**self).flush_sink()
    }
}

impl<T: OutputSink + ?Sized> OutputSink for Box<T> {
    fn write_payload(&mut self, data: &[u8]) -> io::Result<usize> {
        (**self).write_payload(data)
    }
    fn seek_hole(&mut self, offset: u64) -> io::Result<()> {
        (**self).seek_hole(offset)
    }
    fn hole_mode(&self) -> HoleMode {
        (**self).hole_mode()
    }
    fn flush_sink(&mut self) -> io::Result<()> {
        (**self).flush_sink()
    }
}

/// Write until `data` is exhausted or the writer stops accepting bytes.
/// A zero-length write ends the loop early; the caller sees the short count.
fn write_until_stalled<W: Write + ?Sized>(w: &mut W, mut data: &[u8]) -> io::Result<usize> {
    let mut written = 0;
    while !data.is_empty() {
        match w.write(data) {
            Ok(0) => break,
            Ok(n) => {
                written += n;
                data = &data[n..];
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(written)
}

// ================= Seekable targets =================

/// Sink over any seekable writer. On a regular file, seeking ahead of the
/// last write creates a hole.
#[derive(Debug)]
pub struct SeekSink<W: Write + Seek> {
    inner: W,
}

impl<W: Write + Seek> SeekSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write + Seek> OutputSink for SeekSink<W> {
    fn write_payload(&mut self, data: &[u8]) -> io::Result<usize> {
        write_until_stalled(&mut self.inner, data)
    }

    fn seek_hole(&mut self, offset: u64) -> io::Result<()> {
        self.inner.seek(SeekFrom::Start(offset)).map(|_| ())
    }

    fn hole_mode(&self) -> HoleMode {
        HoleMode::Sparse
    }

    fn flush_sink(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

// ================= Non-seekable targets =================

/// Sink for pipes and other forward-only writers. Holes become zero bytes
/// and records must arrive in increasing offset order.
#[derive(Debug)]
pub struct ZeroFillSink<W: Write> {
    inner: W,
    pos: u64,
}

impl<W: Write> ZeroFillSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, pos: 0 }
    }

    pub fn position(&self) -> u64 {
        self.pos
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> OutputSink for ZeroFillSink<W> {
    fn write_payload(&mut self, data: &[u8]) -> io::Result<usize> {
        let n = write_until_stalled(&mut self.inner, data)?;
        self.pos += n as u64;
        Ok(n)
    }

    fn seek_hole(&mut self, offset: u64) -> io::Result<()> {
        if offset < self.pos {
            return Err(io::Error::new(
                ErrorKind::InvalidInput,
                format!("cannot seek back to {offset} on a forward-only output (at {})", self.pos),
            ));
        }

        let zeros = [0u8; ZERO_FILL_CHUNK];
        while self.pos < offset {
            let chunk = (offset - self.pos).min(ZERO_FILL_CHUNK as u64) as usize;
            self.inner.write_all(&zeros[..chunk])?;
            self.pos += chunk as u64;
        }
        Ok(())
    }

    fn hole_mode(&self) -> HoleMode {
        HoleMode::ZeroFill
    }

    fn flush_sink(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

// ================= In-memory target =================

/// In-memory sparse image. Behaves like a file: seeking past the end only
/// extends the buffer once a write lands there. Written ranges are tracked
/// so callers can tell data from holes.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    buf: Vec<u8>,
    pos: u64,
    written: Vec<Segment>,
    accept_limit: Option<usize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that accepts at most `limit` bytes per `write_payload` call.
    pub fn accepting_at_most(limit: usize) -> Self {
        Self { accept_limit: Some(limit), ..Self::default() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Ranges that received payload, merged when contiguous.
    pub fn written_ranges(&self) -> &[Segment] {
        &self.written
    }

    fn record(&mut self, offset: u64, size: u64) {
        if let Some(last) = self.written.last_mut() {
            if last.end() == offset {
                last.size += size;
                return;
            }
        }
        self.written.push(Segment::new(offset, size));
    }
}

impl OutputSink for MemorySink {
    fn write_payload(&mut self, data: &[u8]) -> io::Result<usize> {
        let n = self.accept_limit.map_or(data.len(), |l| l.min(data.len()));
        if n == 0 {
            return Ok(0);
        }

        let out_of_range =
            || io::Error::new(ErrorKind::InvalidInput, format!("write of {n} bytes at {} exceeds address space", self.pos));

        let new_pos = self.pos.checked_add(n as u64).ok_or_else(out_of_range)?;
        let start = usize::try_from(self.pos).map_err(|_| out_of_range())?;
        let end = start.checked_add(n).ok_or_else(out_of_range)?;
        if self.buf.len() < end {
            self.buf
                .try_reserve(end - self.buf.len())
                .map_err(|e| io::Error::new(ErrorKind::OutOfMemory, e))?;
            self.buf.resize(end, 0);
        }
        self.buf[start..end].copy_from_slice(&data[..n]);

        self.record(self.pos, n as u64);
        self.pos = new_pos;
        Ok(n)
    }

    fn seek_hole(&mut self, offset: u64) -> io::Result<()> {
        self.pos = offset;
        Ok(())
    }

    fn hole_mode(&self) -> HoleMode {
        HoleMode::Sparse
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn memory_sink_extends_only_on_write() {
        let mut sink = MemorySink::new();
        sink.seek_hole(100).unwrap();
        assert!(sink.is_empty());

        sink.write_payload(b"ab").unwrap();
        assert_eq!(sink.len(), 102);
        assert_eq!(sink.written_ranges(), &[Segment::new(100, 2)]);
    }

    #[test]
    fn memory_sink_merges_contiguous_ranges() {
        let mut sink = MemorySink::new();
        sink.write_payload(b"ab").unwrap();
        sink.write_payload(b"cd").unwrap();
        sink.seek_hole(10).unwrap();
        sink.write_payload(b"e").unwrap();
        assert_eq!(
            sink.written_ranges(),
            &[Segment::new(0, 4), Segment::new(10, 1)]
        );
    }

    #[test]
    fn memory_sink_limit_reports_short_write() {
        let mut sink = MemorySink::accepting_at_most(3);
        assert_eq!(sink.write_payload(b"abcdef").unwrap(), 3);
    }

    #[test]
    fn memory_sink_write_past_address_space_is_an_error() {
        let mut sink = MemorySink::new();
        sink.seek_hole(u64::MAX).unwrap();
        let err = sink.write_payload(b"a").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(sink.is_empty());
        assert!(sink.written_ranges().is_empty());
    }

    #[test]
    fn seek_sink_positions_cursor() {
        let mut sink = SeekSink::new(Cursor::new(Vec::new()));
        sink.seek_hole(4).unwrap();
        sink.write_payload(b"xy").unwrap();
        assert_eq!(sink.into_inner().into_inner(), b"\0\0\0\0xy");
    }

    #[test]
    fn zero_fill_sink_writes_gap() {
        let mut sink = ZeroFillSink::new(Vec::new());
        sink.write_payload(b"a").unwrap();
        sink.seek_hole(3).unwrap();
        sink.write_payload(b"b").unwrap();
        assert_eq!(sink.position(), 4);
        assert_eq!(sink.into_inner(), b"a\0\0b");
    }

    #[test]
    fn zero_fill_sink_rejects_backward_seek() {
        let mut sink = ZeroFillSink::new(Vec::new());
        sink.write_payload(b"abc").unwrap();
        let err = sink.seek_hole(1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(sink.seek_hole(3).is_ok());
    }
}

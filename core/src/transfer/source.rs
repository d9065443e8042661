//! Sparse inputs: data/hole discovery plus bulk copy of data extents.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::types::StreamError;

/// One maximal contiguous data range of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    pub offset: u64,
    pub length: u64,
}

impl Extent {
    pub const fn new(offset: u64, length: u64) -> Self {
        Self { offset, length }
    }

    /// First byte past the extent.
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.length)
    }

    fn contains(&self, pos: u64) -> bool {
        self.offset <= pos && pos < self.end()
    }
}

/// Answer of a "next data at or after pos" lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataLookup {
    Data(u64),
    /// Nothing but holes (or nothing at all) from `pos` to end-of-file.
    NoMoreData,
}

/// Answer of a "next hole at or after pos" lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoleLookup {
    Hole(u64),
    /// End-of-file reached while still in data; the extent runs to end-of-file.
    EndOfFileInData,
}

pub trait SparseSource {
    fn next_data(&mut self, pos: u64) -> Result<DataLookup, StreamError>;

    fn next_hole(&mut self, pos: u64) -> Result<HoleLookup, StreamError>;

    /// Logical size of the source in bytes.
    fn size(&mut self) -> Result<u64, StreamError>;

    /// Copy `len` bytes starting at `offset` to `out`. Returns bytes copied.
    fn copy_range<W: Write + ?Sized>(&mut self, offset: u64, len: u64, out: &mut W) -> Result<u64, StreamError>;
}

// ================= File =================

/// Regular file on a filesystem with hole discovery.
#[derive(Debug)]
pub struct FileSource {
    file: File,
}

impl FileSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StreamError> {
        let file = File::open(path).map_err(StreamError::SourceRead)?;
        Ok(Self { file })
    }

    pub fn from_file(file: File) -> Self {
        Self { file }
    }

    pub fn into_inner(self) -> File {
        self.file
    }
}

impl SparseSource for FileSource {
    fn next_data(&mut self, pos: u64) -> Result<DataLookup, StreamError> {
        match sys::seek_data(&self.file, pos).map_err(StreamError::SourceSeek)? {
            Some(p) => Ok(DataLookup::Data(p)),
            None => Ok(DataLookup::NoMoreData),
        }
    }

    fn next_hole(&mut self, pos: u64) -> Result<HoleLookup, StreamError> {
        match sys::seek_hole(&self.file, pos).map_err(StreamError::SourceSeek)? {
            Some(p) => Ok(HoleLookup::Hole(p)),
            None => Ok(HoleLookup::EndOfFileInData),
        }
    }

    fn size(&mut self) -> Result<u64, StreamError> {
        self.file
            .metadata()
            .map(|m| m.len())
            .map_err(StreamError::SourceRead)
    }

    fn copy_range<W: Write + ?Sized>(&mut self, offset: u64, len: u64, out: &mut W) -> Result<u64, StreamError> {
        self.file.seek(SeekFrom::Start(offset)).map_err(StreamError::SourceSeek)?;
        // std lowers File -> File/pipe copies to copy_file_range/sendfile where it can.
        let mut limited = (&self.file).take(len);
        io::copy(&mut limited, out).map_err(StreamError::Copy)
    }
}

#[cfg(any(target_os = "linux", target_os = "android", target_os = "freebsd"))]
mod sys {
    use std::fs::File;
    use std::io;
    use std::os::unix::io::AsRawFd;

    use nix::errno::Errno;
    use nix::libc::off_t;
    use nix::unistd::{lseek, Whence};

    pub fn seek_data(file: &File, pos: u64) -> io::Result<Option<u64>> {
        seek(file, pos, Whence::SeekData)
    }

    pub fn seek_hole(file: &File, pos: u64) -> io::Result<Option<u64>> {
        seek(file, pos, Whence::SeekHole)
    }

    /// `None` when the kernel answers ENXIO (no such position before end-of-file).
    fn seek(file: &File, pos: u64, whence: Whence) -> io::Result<Option<u64>> {
        let off = off_t::try_from(pos)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "offset out of range"))?;

        match lseek(file.as_raw_fd(), off, whence) {
            Ok(p) => Ok(Some(p as u64)),
            Err(Errno::ENXIO) => Ok(None),
            Err(e) => Err(io::Error::from(e)),
        }
    }
}

// No hole discovery: the whole file is one data extent.
#[cfg(not(any(target_os = "linux", target_os = "android", target_os = "freebsd")))]
mod sys {
    use std::fs::File;
    use std::io;

    pub fn seek_data(file: &File, pos: u64) -> io::Result<Option<u64>> {
        let len = file.metadata()?.len();
        Ok((pos < len).then_some(pos))
    }

    pub fn seek_hole(file: &File, pos: u64) -> io::Result<Option<u64>> {
        let len = file.metadata()?.len();
        Ok((pos < len).then_some(len))
    }
}

// ================= Memory =================

/// In-memory source with an explicit extent map.
#[derive(Debug, Clone)]
pub struct MemorySource {
    data: Vec<u8>,
    extents: Vec<Extent>,
}

impl MemorySource {
    /// `extents` must be sorted, non-overlapping and inside `data`.
    /// Adjacent extents are merged so every extent is maximal.
    pub fn new(data: Vec<u8>, extents: Vec<Extent>) -> Result<Self, StreamError> {
        let len = data.len() as u64;
        let mut merged: Vec<Extent> = Vec::with_capacity(extents.len());

        for e in extents.into_iter().filter(|e| e.length > 0) {
            if e.offset.checked_add(e.length).map_or(true, |end| end > len) {
                return Err(StreamError::Validation(format!(
                    "extent {}+{} exceeds source length {len}",
                    e.offset, e.length
                )));
            }
            match merged.last_mut() {
                Some(last) if e.offset < last.end() => {
                    return Err(StreamError::Validation(format!(
                        "extent at {} overlaps or precedes extent ending at {}",
                        e.offset,
                        last.end()
                    )));
                }
                Some(last) if e.offset == last.end() => last.length += e.length,
                _ => merged.push(e),
            }
        }

        Ok(Self { data, extents: merged })
    }

    /// Treat every all-zero block of `block_size` bytes as a hole.
    pub fn detect_zero_blocks(data: Vec<u8>, block_size: usize) -> Result<Self, StreamError> {
        if block_size == 0 {
            return Err(StreamError::Validation("block size must be non-zero".into()));
        }

        let extents = data
            .chunks(block_size)
            .enumerate()
            .filter(|(_, block)| block.iter().any(|&b| b != 0))
            .map(|(i, block)| Extent::new((i * block_size) as u64, block.len() as u64))
            .collect();

        Self::new(data, extents)
    }

    pub fn extents(&self) -> &[Extent] {
        &self.extents
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl SparseSource for MemorySource {
    fn next_data(&mut self, pos: u64) -> Result<DataLookup, StreamError> {
        Ok(self
            .extents
            .iter()
            .find(|e| e.end() > pos)
            .map_or(DataLookup::NoMoreData, |e| DataLookup::Data(pos.max(e.offset))))
    }

    fn next_hole(&mut self, pos: u64) -> Result<HoleLookup, StreamError> {
        let len = self.data.len() as u64;
        if pos >= len {
            return Ok(HoleLookup::EndOfFileInData);
        }
        match self.extents.iter().find(|e| e.contains(pos)) {
            Some(e) if e.end() >= len => Ok(HoleLookup::EndOfFileInData),
            Some(e) => Ok(HoleLookup::Hole(e.end())),
            None => Ok(HoleLookup::Hole(pos)),
        }
    }

    fn size(&mut self) -> Result<u64, StreamError> {
        Ok(self.data.len() as u64)
    }

    fn copy_range<W: Write + ?Sized>(&mut self, offset: u64, len: u64, out: &mut W) -> Result<u64, StreamError> {
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(self.data.len());
        let end = usize::try_from(offset.saturating_add(len))
            .unwrap_or(usize::MAX)
            .min(self.data.len());
        out.write_all(&self.data[start..end]).map_err(StreamError::Copy)?;
        Ok((end - start) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> MemorySource {
        let mut data = vec![0u8; 32];
        data[4..8].copy_from_slice(b"abcd");
        data[24..32].copy_from_slice(b"01234567");
        MemorySource::new(data, vec![Extent::new(4, 4), Extent::new(24, 8)]).unwrap()
    }

    #[test]
    fn lookups_follow_extent_map() {
        let mut s = source();
        assert_eq!(s.next_data(0).unwrap(), DataLookup::Data(4));
        assert_eq!(s.next_data(5).unwrap(), DataLookup::Data(5));
        assert_eq!(s.next_hole(4).unwrap(), HoleLookup::Hole(8));
        assert_eq!(s.next_data(8).unwrap(), DataLookup::Data(24));
        assert_eq!(s.next_hole(24).unwrap(), HoleLookup::EndOfFileInData);
        assert_eq!(s.next_data(32).unwrap(), DataLookup::NoMoreData);
    }

    #[test]
    fn adjacent_extents_are_merged() {
        let s = MemorySource::new(vec![1; 10], vec![Extent::new(0, 4), Extent::new(4, 2)]).unwrap();
        assert_eq!(s.extents(), &[Extent::new(0, 6)]);
    }

    #[test]
    fn overlapping_or_out_of_range_extents_are_rejected() {
        assert!(MemorySource::new(vec![1; 10], vec![Extent::new(0, 4), Extent::new(2, 2)]).is_err());
        assert!(MemorySource::new(vec![1; 10], vec![Extent::new(8, 4)]).is_err());
    }

    #[test]
    fn extent_past_u64_range_is_rejected() {
        let err = MemorySource::new(vec![1; 10], vec![Extent::new(u64::MAX, 2)]).unwrap_err();
        assert!(matches!(err, StreamError::Validation(_)));
        assert_eq!(Extent::new(u64::MAX, 2).end(), u64::MAX);
    }

    #[test]
    fn zero_blocks_become_holes() {
        let mut data = vec![0u8; 12];
        data[5] = 9;
        data[11] = 1;
        let s = MemorySource::detect_zero_blocks(data, 4).unwrap();
        // blocks 1 and 2 both carry data and merge into one extent
        assert_eq!(s.extents(), &[Extent::new(4, 8)]);
    }

    #[test]
    fn copy_range_writes_slice() {
        let mut s = source();
        let mut out = Vec::new();
        assert_eq!(s.copy_range(24, 8, &mut out).unwrap(), 8);
        assert_eq!(out, b"01234567");
    }

    #[test]
    fn copy_range_past_end_copies_nothing() {
        let mut s = source();
        let mut out = Vec::new();
        assert_eq!(s.copy_range(u64::MAX, u64::MAX, &mut out).unwrap(), 0);
        assert_eq!(s.copy_range(30, 8, &mut out).unwrap(), 2);
        assert_eq!(out, b"67");
    }
}

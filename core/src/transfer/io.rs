//! Normalized input/output for the orchestrator.

use std::fs::{File, OpenOptions};
use std::io::{Cursor, Read, Seek, Write};
use std::path::PathBuf;

use tracing::warn;

use crate::transfer::sink::{OutputSink, SeekSink, ZeroFillSink};
use crate::types::StreamError;

/// Where ursparse input comes from.
pub enum InputSource {
    Reader(Box<dyn Read + Send>),
    File(PathBuf),
    Memory(Vec<u8>),
}

/// Where a decoded image goes.
pub enum OutputTarget {
    /// Created (or truncated) and written sparsely.
    File(PathBuf),
    /// Already-open handle; sparse if it can seek, zero-filled otherwise.
    Handle(File),
    /// Forward-only writer; holes are zero-filled.
    Writer(Box<dyn Write + Send>),
}

/// Open `src` as a single reader.
pub fn open_input(src: InputSource) -> Result<Box<dyn Read + Send>, StreamError> {
    let reader: Box<dyn Read + Send> = match src {
        InputSource::Reader(r) => r,
        InputSource::File(p) => Box::new(File::open(p).map_err(StreamError::Input)?),
        InputSource::Memory(b) => Box::new(Cursor::new(b)),
    };
    Ok(reader)
}

/// Open `target` and pick the sink that matches its seekability.
pub fn open_output(target: OutputTarget) -> Result<Box<dyn OutputSink + Send>, StreamError> {
    match target {
        OutputTarget::File(p) => {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(p)
                .map_err(StreamError::Output)?;
            Ok(Box::new(SeekSink::new(file)))
        }
        OutputTarget::Handle(mut file) => {
            if file.stream_position().is_ok() {
                Ok(Box::new(SeekSink::new(file)))
            } else {
                warn!("output is not seekable, holes will be written as zeros");
                Ok(Box::new(ZeroFillSink::new(file)))
            }
        }
        OutputTarget::Writer(w) => Ok(Box::new(ZeroFillSink::new(w))),
    }
}

use std::io::{self, Write};

/// Encode a record header into canonical wire format.
///
/// Layout:
///
/// ```text
/// <offset> SP <length> LF
/// [ payload (length bytes, raw) ]
/// ```
pub fn encode_record_header(offset: u64, length: u64) -> String {
    format!("{offset} {length}\n")
}

/// Write a record header, returning the number of header bytes written.
pub fn write_record_header<W: Write + ?Sized>(w: &mut W, offset: u64, length: u64) -> io::Result<usize> {
    let header = encode_record_header(offset, length);
    w.write_all(header.as_bytes())?;
    Ok(header.len())
}

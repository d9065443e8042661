use crate::constants::ascii::{NEWLINE, SPACE};
use crate::transfer::framing::types::{FieldKind, FramingError, ParseStatus, UintField};

/// Parse an unsigned decimal field incrementally.
///
/// Leading spaces/newlines are skipped until the first digit. A space or
/// newline after at least one digit ends the field; the terminator itself is
/// left in the slice for the next phase. Any other byte is fatal.
pub fn parse_uint(
    buf: &[u8],
    field: &mut UintField,
    kind: FieldKind,
) -> Result<ParseStatus, FramingError> {
    let mut i = 0;

    if !field.digits_seen {
        while i < buf.len() && (buf[i] == SPACE || buf[i] == NEWLINE) {
            i += 1;
        }
    }

    while i < buf.len() {
        let b = buf[i];
        match b {
            b'0'..=b'9' => {
                field.value = field
                    .value
                    .checked_mul(10)
                    .and_then(|v| v.checked_add(u64::from(b - b'0')))
                    .ok_or(FramingError::FieldOverflow { field: kind })?;
                field.digits_seen = true;
                i += 1;
            }
            SPACE | NEWLINE => return Ok(ParseStatus::Done(i)),
            _ => return Err(FramingError::MalformedHeader { field: kind, byte: b }),
        }
    }

    Ok(ParseStatus::NeedMore(i))
}

/// Skip spaces, then require exactly one newline (consumed).
pub fn parse_newline(buf: &[u8]) -> Result<ParseStatus, FramingError> {
    let mut i = 0;

    while i < buf.len() && buf[i] == SPACE {
        i += 1;
    }

    match buf.get(i) {
        Some(&NEWLINE) => Ok(ParseStatus::Done(i + 1)),
        Some(&b) => Err(FramingError::MalformedHeader {
            field: FieldKind::Newline,
            byte: b,
        }),
        None => Ok(ParseStatus::NeedMore(i)),
    }
}

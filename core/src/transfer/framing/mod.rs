//! Wire framing for the ursparse transfer format.
//!
//! Responsibilities:
//! - Define segments, parser results and framing errors
//! - Incremental field parsers (unsigned integer, newline)
//! - The resumable record decoder
//! - Record header encoding
//!
//! Non-responsibilities:
//! - Opening files or streams
//! - Extent discovery

pub mod types;
pub mod parse;
pub mod encode;
pub mod decode;

pub use types::{
    FieldKind,
    FramingError,
    ParseStatus,
    Segment,
    UintField,
};
pub use parse::{
    parse_newline,
    parse_uint,
};
pub use encode::{
    encode_record_header,
    write_record_header,
};
pub use decode::{
    DecodeStatus,
    DecoderState,
    Progress,
    TransferDecoder,
};

/// Read buffer size used when none is requested.
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// Smallest accepted read buffer size.
pub const MIN_BLOCK_SIZE: usize = 2;

/// Max block size sanity bound (64 MiB).
pub const MAX_BLOCK_SIZE: usize = 64 * 1024 * 1024;

/// Chunk size used when zero-filling a skipped range on a non-seekable sink.
pub const ZERO_FILL_CHUNK: usize = 64 * 1024;

/// Header field terminators and padding accepted by the transfer format.
pub mod ascii {
    pub const SPACE: u8 = b' ';
    pub const NEWLINE: u8 = b'\n';
}

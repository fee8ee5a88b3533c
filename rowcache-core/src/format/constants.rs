//! Format constants for the sparse row-stream specification

/// Format id reserved for this version of the sparse row stream
pub const EXPECTED_FORMAT_ID: u32 = 2;

/// Size of the per-row length prefix
pub const ROW_LENGTH_FIELD_SIZE: usize = 4;

/// Size of the column id stored with every entry
pub const COLUMN_ID_SIZE: usize = 4;

/// Fixed size of the stream header
pub const HEADER_SIZE: usize = 24;

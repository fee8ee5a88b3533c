//! Binary format definitions for sparse row-stream files
//!
//! This module contains pure data structure definitions for the wire format.
//! No I/O operations, only layout and validation.
//!
//! A stream is a [`RowStreamHeader`] followed, for every row in order, by a
//! `u32` entry count and that many packed entries. There is no index table
//! and no footer, so the format is read sequentially.

pub mod constants;
pub mod entry;
pub mod header;

pub use constants::{COLUMN_ID_SIZE, EXPECTED_FORMAT_ID, HEADER_SIZE, ROW_LENGTH_FIELD_SIZE};
pub use entry::{decode_entry, encode_entry, entry_size};
pub use header::RowStreamHeader;

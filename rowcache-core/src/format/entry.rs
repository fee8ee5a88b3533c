//! Packed entry encoding
//!
//! Each entry is a little-endian `u32` column id immediately followed by
//! the value's `WIDTH` bytes, with no padding.

use super::constants::COLUMN_ID_SIZE;
use crate::row::SparseEntry;
use crate::traits::MatrixElement;

/// Serialized size of one entry holding a `T`
pub const fn entry_size<T: MatrixElement>() -> usize {
    COLUMN_ID_SIZE + T::WIDTH
}

/// Encode `entry` into the first [`entry_size`] bytes of `out`
///
/// Panics if `out` is too short.
pub fn encode_entry<T: MatrixElement>(entry: &SparseEntry<T>, out: &mut [u8]) {
    out[..COLUMN_ID_SIZE].copy_from_slice(&entry.id.to_le_bytes());
    entry.value.write_le(&mut out[COLUMN_ID_SIZE..]);
}

/// Decode an entry from the first [`entry_size`] bytes of `bytes`
///
/// Panics if `bytes` is too short.
pub fn decode_entry<T: MatrixElement>(bytes: &[u8]) -> SparseEntry<T> {
    let id = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    SparseEntry::new(id, T::read_le(&bytes[COLUMN_ID_SIZE..]))
}

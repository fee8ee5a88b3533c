//! Row-stream header definition
//!
//! The header is written once at the start of every file and describes the
//! rows that follow it.

use super::constants::{EXPECTED_FORMAT_ID, HEADER_SIZE};
use crate::error::FormatError;
use crate::traits::MatrixElement;

/// Fixed 24-byte header for sparse row-stream files
///
/// Layout (little-endian, no padding):
///
/// | offset | field         | type |
/// |--------|---------------|------|
/// | 0      | `format_id`   | u32  |
/// | 4      | `value_width` | u32  |
/// | 8      | `nnz`         | u64  |
/// | 16     | `nrows`       | u32  |
/// | 20     | `ncols`       | u32  |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RowStreamHeader {
    /// Format id, must be [`EXPECTED_FORMAT_ID`]
    pub format_id: u32,
    /// Width in bytes of every stored value
    pub value_width: u32,
    /// Total number of entries across all rows
    pub nnz: u64,
    /// Number of rows
    pub nrows: u32,
    /// Number of columns
    pub ncols: u32,
}

impl RowStreamHeader {
    /// Size of the header in bytes
    pub const SIZE: usize = HEADER_SIZE;

    /// Create a header for a stream of `T` values
    pub fn new<T: MatrixElement>(nrows: u32, ncols: u32, nnz: u64) -> Self {
        Self {
            format_id: EXPECTED_FORMAT_ID,
            value_width: T::WIDTH as u32,
            nnz,
            nrows,
            ncols,
        }
    }

    /// Size in bytes of one serialized entry (column id + value)
    pub const fn entry_size(&self) -> usize {
        super::constants::COLUMN_ID_SIZE + self.value_width as usize
    }

    /// Average number of entries per row, zero for an empty matrix
    pub fn avg_entries_per_row(&self) -> f64 {
        if self.nrows == 0 {
            0.0
        } else {
            self.nnz as f64 / self.nrows as f64
        }
    }

    /// Total size of a well-formed file with this header
    pub const fn stream_size(&self) -> u64 {
        Self::SIZE as u64
            + self.nrows as u64 * super::constants::ROW_LENGTH_FIELD_SIZE as u64
            + self.nnz * self.entry_size() as u64
    }

    /// Parse and validate the format id
    ///
    /// The value width is not checked here since it depends on the element
    /// type the caller wants; see [`RowStreamHeader::validate_for`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FormatError> {
        if bytes.len() < Self::SIZE {
            return Err(FormatError::TruncatedHeader);
        }

        let format_id = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if format_id != EXPECTED_FORMAT_ID {
            return Err(FormatError::UnsupportedFormatId { found: format_id });
        }

        let value_width = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        let nnz = u64::from_le_bytes([
            bytes[8], bytes[9], bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15],
        ]);
        let nrows = u32::from_le_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]);
        let ncols = u32::from_le_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]);

        Ok(Self {
            format_id,
            value_width,
            nnz,
            nrows,
            ncols,
        })
    }

    /// Check that the stored values can be read as `T`
    pub fn validate_for<T: MatrixElement>(&self) -> Result<(), FormatError> {
        if self.format_id != EXPECTED_FORMAT_ID {
            return Err(FormatError::UnsupportedFormatId {
                found: self.format_id,
            });
        }
        if self.value_width as usize != T::WIDTH {
            return Err(FormatError::ValueWidthMismatch {
                expected: T::WIDTH as u32,
                found: self.value_width,
            });
        }
        Ok(())
    }

    /// Serialize to the on-disk representation
    pub fn to_bytes_array(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.format_id.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.value_width.to_le_bytes());
        bytes[8..16].copy_from_slice(&self.nnz.to_le_bytes());
        bytes[16..20].copy_from_slice(&self.nrows.to_le_bytes());
        bytes[20..24].copy_from_slice(&self.ncols.to_le_bytes());
        bytes
    }
}

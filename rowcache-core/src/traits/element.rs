//! Value type constraints for sparse row streams
//!
//! Entries carry a floating-point value whose width is recorded in the
//! stream header. Only types implementing [`MatrixElement`] can be stored.

use core::fmt::{Debug, Display};
use core::str::FromStr;

/// Trait for types that can be stored as entry values
///
/// All element types must be:
/// - Copy: entries are copied in and out of the cache arena
/// - Default: the arena is preallocated with default values
/// - Display/FromStr: used by the text format
pub trait MatrixElement:
    Copy + Clone + Default + PartialEq + Debug + Display + FromStr + Sized
{
    /// Width in bytes of the serialized value
    const WIDTH: usize;

    /// Decode from the first `WIDTH` bytes of `bytes` (little-endian)
    ///
    /// Panics if `bytes` is shorter than `WIDTH`.
    fn read_le(bytes: &[u8]) -> Self;

    /// Encode into the first `WIDTH` bytes of `out` (little-endian)
    ///
    /// Panics if `out` is shorter than `WIDTH`.
    fn write_le(self, out: &mut [u8]);

    /// Convert from f64 for generic construction
    fn from_f64(value: f64) -> Self;

    /// Convert to f64 for generic operations
    fn to_f64(self) -> f64;
}

macro_rules! impl_matrix_element {
    ($type:ty) => {
        impl MatrixElement for $type {
            const WIDTH: usize = core::mem::size_of::<$type>();

            fn read_le(bytes: &[u8]) -> Self {
                let mut raw = [0u8; core::mem::size_of::<$type>()];
                raw.copy_from_slice(&bytes[..Self::WIDTH]);
                <$type>::from_le_bytes(raw)
            }

            fn write_le(self, out: &mut [u8]) {
                out[..Self::WIDTH].copy_from_slice(&self.to_le_bytes());
            }

            fn from_f64(value: f64) -> Self {
                value as $type
            }

            fn to_f64(self) -> f64 {
                self as f64
            }
        }
    };
}

impl_matrix_element!(f32);
impl_matrix_element!(f64);

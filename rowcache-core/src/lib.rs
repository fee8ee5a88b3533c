#![no_std]

//! rowcache core - sparse row-stream format definitions
//!
//! This crate provides the wire format, value types, the row-stream
//! contract and cache capacity planning for out-of-core sparse matrices.
//! It performs no I/O.

pub mod capacity;
pub mod error;
pub mod format;
pub mod row;
pub mod traits;

pub use capacity::{CacheCapacity, CacheCost};
pub use error::*;
pub use format::*;
pub use row::{RowSpan, SparseEntry, SparseRow};
pub use traits::*;

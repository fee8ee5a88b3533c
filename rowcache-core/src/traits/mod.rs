//! Abstract interfaces for sparse row streams
//!
//! Traits are pure interfaces; the implementations live in the I/O crate.

pub mod element;
pub mod stream;

pub use element::MatrixElement;
pub use stream::RowStream;

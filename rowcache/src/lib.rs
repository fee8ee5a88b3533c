//! rowcache - out-of-core sparse row cache
//!
//! This library streams sparse matrices stored in a binary row-stream file
//! through a fixed memory budget, and exposes the same row-by-row contract
//! as a fully resident matrix.
//!
//! ## Architecture
//!
//! - **rowcache-core**: format definitions, value types, the [`RowStream`]
//!   contract and capacity planning (no I/O)
//! - **rowcache**: file readers and writers, the in-memory and cached
//!   matrices, configuration and the `rowcache` CLI
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rowcache::{CachedMatrix, RowStream};
//!
//! fn example() -> rowcache::Result<()> {
//!     // stream train.bin through at most 64 MB of cache
//!     let mut matrix = CachedMatrix::<f64>::open("train.bin", 64 * 1024 * 1024)?;
//!
//!     let mut total = 0.0;
//!     matrix.begin()?;
//!     while !matrix.at_end() {
//!         total += matrix.current_row().iter().map(|e| e.value).sum::<f64>();
//!         matrix.advance()?;
//!     }
//!     println!("sum of {} entries = {total}", matrix.nnz());
//!     Ok(())
//! }
//! ```

pub use rowcache_core::{
    // Core traits
    MatrixElement, RowStream,
    // Value types
    RowSpan, SparseEntry, SparseRow,
    // Format definitions
    RowStreamHeader, EXPECTED_FORMAT_ID,
    // Capacity planning
    CacheCapacity, CacheCost,
    // Error handling
    ConfigError, ErrorCategory, FormatError,
};

pub mod cached;
pub mod config;
pub mod error;
pub mod memory;
pub mod text;
pub mod writer;

pub use cached::{read_header, CachedMatrix};
pub use config::CacheConfig;
pub use error::{Error, Result};
pub use memory::InMemoryMatrix;
pub use text::{load_text, read_text};
pub use writer::{save_binary, save_text, write_binary, write_text};

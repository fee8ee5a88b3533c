//! Error types for row-stream operations
//!
//! These are plain `Copy` enums so they can live in `no_std` code. The I/O
//! crate wraps them together with `std::io::Error`.

/// Broad classification of a failure, used by callers that only care
/// whether a problem is in the file, the data, or the cache configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// File missing, unreadable or unwritable
    Io,
    /// The bytes do not describe a valid row stream
    Format,
    /// The cache cannot be configured for this dataset
    Config,
}

impl core::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            ErrorCategory::Io => "I/O",
            ErrorCategory::Format => "format",
            ErrorCategory::Config => "configuration",
        };
        write!(f, "{msg}")
    }
}

/// Problems with the contents of a row stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatError {
    /// Fewer bytes than a full header
    TruncatedHeader,
    /// Header carries a format id this reader does not understand
    UnsupportedFormatId { found: u32 },
    /// Stored value width differs from the element type being loaded
    ValueWidthMismatch { expected: u32, found: u32 },
    /// The stream ended inside the given row
    TruncatedRow { row: u32 },
    /// Entries in the stream disagree with the header's entry count
    EntryCountMismatch { declared: u64, found: u64 },
    /// Rows in the stream disagree with the header's row count
    RowCountMismatch { declared: u32, found: u64 },
    /// A line of the text format could not be parsed (1-based)
    MalformedText { line: usize },
}

impl FormatError {
    pub const fn category(&self) -> ErrorCategory {
        ErrorCategory::Format
    }
}

impl core::fmt::Display for FormatError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FormatError::TruncatedHeader => write!(f, "Truncated row-stream header"),
            FormatError::UnsupportedFormatId { found } => {
                write!(f, "Unsupported format id {found}")
            }
            FormatError::ValueWidthMismatch { expected, found } => write!(
                f,
                "Value width mismatch: expected {expected} bytes, file stores {found}"
            ),
            FormatError::TruncatedRow { row } => write!(f, "Stream ends inside row {row}"),
            FormatError::EntryCountMismatch { declared, found } => write!(
                f,
                "Header declares {declared} entries but the stream holds {found}"
            ),
            FormatError::RowCountMismatch { declared, found } => write!(
                f,
                "Header declares {declared} rows but the stream holds {found}"
            ),
            FormatError::MalformedText { line } => write!(f, "Malformed entry on line {line}"),
        }
    }
}

/// Problems sizing or driving the row cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Budget cannot hold even the smallest possible row
    BudgetTooSmall { budget: u64, required: u64 },
    /// A single row is larger than the whole entry buffer
    RowExceedsCache {
        row: u32,
        len: u32,
        entry_capacity: u64,
    },
    /// Header claims entries but no rows
    EmptyMatrixWithEntries { nnz: u64 },
    /// More rows than a row index can address
    TooManyRows,
    /// More entries than fit in addressable memory
    TooManyEntries,
}

impl ConfigError {
    pub const fn category(&self) -> ErrorCategory {
        ErrorCategory::Config
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::BudgetTooSmall { budget, required } => write!(
                f,
                "Cache budget of {budget} bytes is below the minimum of {required} bytes"
            ),
            ConfigError::RowExceedsCache {
                row,
                len,
                entry_capacity,
            } => write!(
                f,
                "Row {row} has {len} entries but the cache holds only {entry_capacity}"
            ),
            ConfigError::EmptyMatrixWithEntries { nnz } => {
                write!(f, "Matrix has no rows but declares {nnz} entries")
            }
            ConfigError::TooManyRows => write!(f, "Row count exceeds the addressable range"),
            ConfigError::TooManyEntries => {
                write!(f, "Entry count exceeds the addressable range")
            }
        }
    }
}

/// Result type for format-level operations
pub type Result<T> = core::result::Result<T, FormatError>;

//! Error type for file-backed row-stream operations

use rowcache_core::{ConfigError, ErrorCategory, FormatError};
use thiserror::Error;

/// Errors raised while reading, caching or writing row streams
#[derive(Error, Debug)]
pub enum Error {
    /// File missing, unreadable or unwritable
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stream contents are not a valid row stream
    #[error("Format error: {0}")]
    Format(FormatError),

    /// Cache budget does not suit the dataset
    #[error("Configuration error: {0}")]
    Config(ConfigError),

    /// Configuration document could not be parsed
    #[cfg(feature = "serde")]
    #[error("Invalid configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl Error {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Io(_) => ErrorCategory::Io,
            Error::Format(e) => e.category(),
            Error::Config(e) => e.category(),
            #[cfg(feature = "serde")]
            Error::ConfigParse(_) => ErrorCategory::Config,
        }
    }
}

impl From<FormatError> for Error {
    fn from(error: FormatError) -> Self {
        Error::Format(error)
    }
}

impl From<ConfigError> for Error {
    fn from(error: ConfigError) -> Self {
        Error::Config(error)
    }
}

impl From<std::convert::Infallible> for Error {
    fn from(never: std::convert::Infallible) -> Self {
        match never {}
    }
}

/// Result type alias for rowcache operations
pub type Result<T> = std::result::Result<T, Error>;

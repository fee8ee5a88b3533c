//! Construction-time configuration for the cached matrix

use std::path::{Path, PathBuf};

/// Where to read a row stream from and how much memory its cache may use
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CacheConfig {
    /// Path to the binary row-stream file
    pub path: PathBuf,
    /// Byte budget for the cache buffers, 0 loads the whole dataset
    #[cfg_attr(feature = "serde", serde(default))]
    pub cache_budget_bytes: u64,
}

impl CacheConfig {
    /// Config for `path` with an unbounded cache
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            cache_budget_bytes: 0,
        }
    }

    /// Set the cache budget in bytes
    pub fn with_budget_bytes(mut self, bytes: u64) -> Self {
        self.cache_budget_bytes = bytes;
        self
    }

    /// Set the cache budget in megabytes
    pub fn with_budget_mb(mut self, megabytes: u64) -> Self {
        self.cache_budget_bytes = megabytes.saturating_mul(1024 * 1024);
        self
    }

    /// Keep the whole dataset resident
    pub fn unbounded(mut self) -> Self {
        self.cache_budget_bytes = 0;
        self
    }

    pub fn is_unbounded(&self) -> bool {
        self.cache_budget_bytes == 0
    }

    /// Parse a JSON document such as
    /// `{"path": "train.bin", "cache_budget_bytes": 1048576}`
    #[cfg(feature = "serde")]
    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = CacheConfig::new("train.bin").with_budget_mb(2);
        assert_eq!(config.path, PathBuf::from("train.bin"));
        assert_eq!(config.cache_budget_bytes, 2 * 1024 * 1024);
        assert!(!config.is_unbounded());
        assert!(config.unbounded().is_unbounded());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_from_json() {
        let config =
            CacheConfig::from_json_str(r#"{"path": "a.bin", "cache_budget_bytes": 4096}"#).unwrap();
        assert_eq!(config, CacheConfig::new("a.bin").with_budget_bytes(4096));

        let config = CacheConfig::from_json_str(r#"{"path": "b.bin"}"#).unwrap();
        assert!(config.is_unbounded());

        let err = CacheConfig::from_json_str("{").unwrap_err();
        assert_eq!(err.category(), rowcache_core::ErrorCategory::Config);
    }
}

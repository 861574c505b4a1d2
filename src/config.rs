//! Cache configuration
//!
//! A `CacheConfig` can be built in code or read from JSON:
//!
//! ```json
//! { "max_cache_entries": 5, "data_dir": "/var/lib/filecache", "pin_timeout_ms": 2000 }
//! ```

use crate::types::{DEFAULT_DATA_DIR, FILE_SIZE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("max_cache_entries must be positive, got {0}")]
    InvalidCapacity(usize),
    #[error("file_size must be positive, got {0}")]
    InvalidFileSize(usize),
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type for configuration
pub type ConfigResult<T> = Result<T, ConfigError>;

fn default_file_size() -> usize {
    FILE_SIZE
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

/// Buffer pool settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Upper bound on resident buffers
    pub max_cache_entries: usize,
    /// Size in bytes of every cached unit
    #[serde(default = "default_file_size")]
    pub file_size: usize,
    /// Directory holding backing files (used by `open_cache`)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Longest a pin may wait for a free buffer; `None` waits forever
    #[serde(default)]
    pub pin_timeout_ms: Option<u64>,
}

impl CacheConfig {
    pub fn new(max_cache_entries: usize) -> Self {
        Self {
            max_cache_entries,
            file_size: FILE_SIZE,
            data_dir: default_data_dir(),
            pin_timeout_ms: None,
        }
    }

    pub fn with_file_size(mut self, file_size: usize) -> Self {
        self.file_size = file_size;
        self
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn with_pin_timeout(mut self, timeout: Duration) -> Self {
        self.pin_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn pin_timeout(&self) -> Option<Duration> {
        self.pin_timeout_ms.map(Duration::from_millis)
    }

    /// Parses and validates a JSON document
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: CacheConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON config file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_cache_entries == 0 {
            return Err(ConfigError::InvalidCapacity(self.max_cache_entries));
        }
        if self.file_size == 0 {
            return Err(ConfigError::InvalidFileSize(self.file_size));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_from_minimal_json() {
        let config = CacheConfig::from_json_str(r#"{ "max_cache_entries": 5 }"#).unwrap();
        assert_eq!(config, CacheConfig::new(5));
        assert_eq!(config.file_size, 10_240_000);
        assert_eq!(config.pin_timeout(), None);
    }

    #[test]
    fn test_full_json() {
        let json = r#"{
            "max_cache_entries": 3,
            "file_size": 4096,
            "data_dir": "/tmp/units",
            "pin_timeout_ms": 250
        }"#;
        let config = CacheConfig::from_json_str(json).unwrap();
        assert_eq!(config.max_cache_entries, 3);
        assert_eq!(config.file_size, 4096);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/units"));
        assert_eq!(config.pin_timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = CacheConfig::from_json_str(r#"{ "max_cache_entries": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidCapacity(0)));
        assert_eq!(err.to_string(), "max_cache_entries must be positive, got 0");
    }

    #[test]
    fn test_zero_file_size_rejected() {
        let config = CacheConfig::new(2).with_file_size(0);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidFileSize(0))));
    }

    #[test]
    fn test_malformed_json() {
        let err = CacheConfig::from_json_str("{ max_cache_entries").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cache.json");
        let config = CacheConfig::new(7)
            .with_file_size(1024)
            .with_data_dir(temp_dir.path())
            .with_pin_timeout(Duration::from_secs(1));
        fs::write(&path, config.to_json().unwrap()).unwrap();

        assert_eq!(CacheConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = CacheConfig::load(temp_dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}

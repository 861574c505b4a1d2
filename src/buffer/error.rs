//! Buffer pool error definitions

use crate::config::ConfigError;
use crate::vfs::VfsError;
use std::time::Duration;
use thiserror::Error;

/// Buffer pool errors
///
/// Unavailable data is not an error: `file_data` and `mutable_file_data`
/// return `None` for identifiers that are not pinned.
#[derive(Debug, Error)]
pub enum BufferError {
    /// A dirty buffer could not be written back; it stays resident and dirty
    #[error("Failed to persist '{identifier}': {source}")]
    PersistFailed {
        identifier: String,
        #[source]
        source: VfsError,
    },

    /// The unit for a newly pinned identifier could not be loaded or created
    #[error("Failed to load '{identifier}': {source}")]
    LoadFailed {
        identifier: String,
        #[source]
        source: VfsError,
    },

    /// No buffer became available within the configured pin timeout
    #[error("Timed out after {waited:?} waiting to pin '{identifier}'")]
    PinTimeout { identifier: String, waited: Duration },

    /// Invalid cache configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The backing store could not be opened
    #[error("Backing store unavailable: {0}")]
    StoreUnavailable(#[source] VfsError),
}

impl BufferError {
    /// Identifier the failed operation was working on, if any
    pub fn identifier(&self) -> Option<&str> {
        match self {
            BufferError::PersistFailed { identifier, .. }
            | BufferError::LoadFailed { identifier, .. }
            | BufferError::PinTimeout { identifier, .. } => Some(identifier),
            BufferError::Config(_) | BufferError::StoreUnavailable(_) => None,
        }
    }
}

/// Result type for buffer pool operations
pub type BufferResult<T> = Result<T, BufferError>;

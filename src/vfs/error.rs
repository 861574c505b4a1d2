//! VFS error definitions

use thiserror::Error;

/// VFS error types
#[derive(Debug, Error)]
pub enum VfsError {
    /// Permission denied error
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    /// File or directory not found error
    #[error("File or directory not found: {0}")]
    NotFound(String),
    /// File already exists error
    #[error("File or directory already exists: {0}")]
    AlreadyExists(String),
    /// Invalid argument error
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    /// System call error with error code
    #[error("System error (errno {0}): {1}")]
    SystemError(i32, String),
}

impl VfsError {
    /// Returns true if the error means the target does not exist
    pub fn is_not_found(&self) -> bool {
        match self {
            VfsError::NotFound(_) => true,
            VfsError::IoError(err) => err.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

impl From<std::ffi::NulError> for VfsError {
    fn from(err: std::ffi::NulError) -> Self {
        VfsError::InvalidArgument(err.to_string())
    }
}

/// Result type for VFS operations
pub type VfsResult<T> = Result<T, VfsError>;

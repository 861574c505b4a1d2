//! Backing store adapters
//!
//! The buffer pool never touches files directly. It loads and persists whole
//! units through [`BackingStore`], which keeps writeback synchronous today
//! while leaving room for a different persistence strategy behind the same
//! trait.

pub mod memory;
pub mod vfs_store;

pub use memory::MemoryStore;
pub use vfs_store::VfsStore;

use crate::vfs::VfsResult;

/// Whole-unit persistence used by the buffer pool
///
/// A unit is a flat byte sequence with no header. The caller always passes a
/// buffer of the configured unit size.
pub trait BackingStore: Send + Sync {
    /// Fills `buf` with the unit stored under `identifier`
    ///
    /// Bytes past the end of a shorter unit are left untouched, so callers
    /// zero the buffer first.
    ///
    /// # Returns
    /// * `Ok(())` - Unit loaded
    /// * `Err(VfsError::NotFound)` - No unit exists for `identifier`
    fn load(&self, identifier: &str, buf: &mut [u8]) -> VfsResult<()>;

    /// Creates an empty unit for `identifier`
    fn create(&self, identifier: &str) -> VfsResult<()>;

    /// Persists `buf` as the complete content of `identifier`
    ///
    /// On success the stored unit is exactly `buf.len()` bytes long.
    fn store(&self, identifier: &str, buf: &[u8]) -> VfsResult<()>;
}

#[cfg(test)]
mod tests {
    include!("tests.rs");
}

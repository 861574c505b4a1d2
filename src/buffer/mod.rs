//! Buffer pool for whole files
//!
//! Keeps up to `max_cache_entries` files of a fixed size in memory. Callers
//! pin files before touching their bytes and unpin them afterwards; only
//! unpinned files can be evicted. Eviction is FIFO by unpin time: the file
//! that has been unpinned the longest goes first, and a file that is pinned
//! again leaves the queue. Modified files are written back to the backing
//! store before their buffer is reused, and again at teardown.
//!
//! Pinning blocks while every buffer is pinned. The wait happens without
//! holding the directory lock, so the unpin that frees a buffer can always
//! make progress.

pub mod error;
pub mod free_list;
pub mod pool;

mod directory;
mod slot;
mod view;

pub use error::{BufferError, BufferResult};
pub use pool::BufferPool;
pub use view::{FileView, FileViewMut};

use crate::config::CacheConfig;
use crate::store::{BackingStore, VfsStore};
use crate::types::PinCount;
use crate::vfs::LocalFs;
use std::sync::Arc;

/// Point-in-time counters of a cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Maximum number of resident files
    pub capacity: usize,
    /// Files currently resident
    pub resident: usize,
    /// Resident files with a non-zero pin count
    pub pinned: usize,
    /// Resident files waiting in the eviction queue
    pub evictable: usize,
    /// Resident files with unsaved modifications
    pub dirty: usize,
}

/// Pin-based file cache
///
/// Identifiers are opaque strings naming one unit in the backing store.
/// A view is only handed out for a pinned file and must be dropped before
/// the matching unpin.
pub trait FileCache: Send + Sync {
    /// Pins every identifier in order, loading or creating absent ones
    ///
    /// Blocks while the cache is full of pinned files. On error the pins
    /// already taken by this call are released again.
    fn pin_files(&self, identifiers: &[&str]) -> BufferResult<()>;

    /// Drops one pin per identifier; unknown or unpinned identifiers are ignored
    fn unpin_files(&self, identifiers: &[&str]);

    /// Read-only bytes of a pinned file, `None` if it is not pinned
    fn file_data(&self, identifier: &str) -> Option<FileView<'_>>;

    /// Writable bytes of a pinned file, `None` if it is not pinned
    fn mutable_file_data(&self, identifier: &str) -> Option<FileViewMut<'_>>;

    /// Writes one resident file back if it is dirty, returns whether it wrote
    fn flush_file(&self, identifier: &str) -> BufferResult<bool>;

    /// Writes back every dirty resident file, returns how many were written
    fn flush_all(&self) -> BufferResult<usize>;

    /// Pin count of a resident file
    fn pin_count(&self, identifier: &str) -> Option<PinCount>;

    fn stats(&self) -> CacheStats;
}

/// Creates a cache of `max_entries` files on top of `store`
pub fn create_cache(
    max_entries: usize,
    store: Arc<dyn BackingStore>,
) -> BufferResult<Box<dyn FileCache>> {
    let pool = BufferPool::new(CacheConfig::new(max_entries), store)?;
    Ok(Box::new(pool))
}

/// Creates a cache backed by files under `config.data_dir`
pub fn open_cache(config: &CacheConfig) -> BufferResult<Box<dyn FileCache>> {
    config.validate()?;
    let store = VfsStore::new(Arc::new(LocalFs::new()), &config.data_dir)
        .map_err(BufferError::StoreUnavailable)?;
    let pool = BufferPool::new(config.clone(), Arc::new(store))?;
    Ok(Box::new(pool))
}

#[cfg(test)]
mod tests {
    include!("tests.rs");
}

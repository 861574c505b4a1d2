//! Filecache: a fixed-capacity, pin-based cache of whole files

// Global type definitions
pub mod types;

// Import various modules
pub mod buffer;
pub mod config;
pub mod store;
pub mod vfs;

// Re-export cache items for easier access
pub use buffer::{
    BufferError, BufferPool, BufferResult, CacheStats, FileCache, FileView, FileViewMut,
    create_cache, open_cache,
};
pub use config::CacheConfig;

// Re-export store and vfs items for easier access
pub use store::{BackingStore, MemoryStore, VfsStore};
pub use vfs::VfsError;
pub use vfs::VfsInterface;

/// Global type definitions
///
/// Constants and type aliases shared by the cache, the backing store and the VFS.

/// Size of one cached unit in bytes (10,240,000)
///
/// Every unit is loaded and persisted as exactly this many bytes unless the
/// cache is configured with a different `file_size`.
pub const FILE_SIZE: usize = 10_240_000;

/// Default directory that holds backing files
pub const DEFAULT_DATA_DIR: &str = ".";

/// Index of a storage slot inside the buffer pool
///
/// Slots are allocated once and reused across evictions, so a slot index
/// stays valid for the whole life of the pool.
pub type SlotId = usize;

/// Pin count type
pub type PinCount = u32;

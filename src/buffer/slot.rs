// Storage slot: one buffer plus its dirty flag

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// A pre-allocated storage slot
///
/// The slot outlives every identifier it serves; eviction only swaps the
/// content. Buffer memory is allocated on first use. Metadata that must stay
/// consistent with the directory (identifier, pin count) lives in the
/// directory, the dirty flag lives here so write views can set it without
/// taking the directory lock.
/// Aligned to cache line size to prevent false sharing
#[cfg_attr(any(target_arch = "x86", target_arch = "x86_64"), repr(align(64)))]
#[cfg_attr(any(target_arch = "arm", target_arch = "aarch64"), repr(align(128)))]
pub(crate) struct Slot {
    /// Buffer contents, shared by read views, exclusive for write views and reloads
    pub(crate) content: RwLock<Vec<u8>>,
    dirty: AtomicBool,
}

impl Slot {
    pub(crate) fn new() -> Self {
        Self {
            content: RwLock::new(Vec::new()),
            dirty: AtomicBool::new(false),
        }
    }

    #[inline]
    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn set_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    #[inline]
    pub(crate) fn clear_dirty(&self) {
        self.dirty.store(false, Ordering::Release);
    }

    /// Clears the dirty flag and reports whether it was set
    #[inline]
    pub(crate) fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }

    /// Zero-fills the buffer to `size` bytes, allocating it the first time
    pub(crate) fn reset(content: &mut Vec<u8>, size: usize) {
        if content.len() == size {
            content.fill(0);
        } else {
            content.clear();
            content.resize(size, 0);
        }
    }
}

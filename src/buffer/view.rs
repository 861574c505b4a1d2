//! Borrowed views of pinned buffers

use super::slot::Slot;
use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLockReadGuard, RwLockWriteGuard};
use std::fmt;
use std::ops::{Deref, DerefMut};

/// Shared view of a pinned file's buffer
///
/// Any number of read views may exist at once. A view must be dropped
/// before the file is unpinned; a view kept across the unpin delays the
/// slot's reuse until it is released.
pub struct FileView<'a> {
    data: MappedRwLockReadGuard<'a, [u8]>,
}

impl<'a> FileView<'a> {
    pub(crate) fn new(slot: &'a Slot) -> Self {
        let data = RwLockReadGuard::map(slot.content.read(), Vec::as_slice);
        Self { data }
    }
}

impl Deref for FileView<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl AsRef<[u8]> for FileView<'_> {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Debug for FileView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileView").field("len", &self.data.len()).finish()
    }
}

/// Exclusive view of a pinned file's buffer
///
/// The file is marked dirty when the view is handed out and again when it
/// is dropped, so a flush that ran in between cannot lose the mutation.
/// Holding a write view while asking for another view of the same file on
/// the same thread deadlocks.
pub struct FileViewMut<'a> {
    slot: &'a Slot,
    data: MappedRwLockWriteGuard<'a, [u8]>,
}

impl<'a> FileViewMut<'a> {
    pub(crate) fn new(slot: &'a Slot) -> Self {
        let data = RwLockWriteGuard::map(slot.content.write(), Vec::as_mut_slice);
        Self { slot, data }
    }
}

impl Deref for FileViewMut<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl DerefMut for FileViewMut<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl AsMut<[u8]> for FileViewMut<'_> {
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl fmt::Debug for FileViewMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileViewMut").field("len", &self.data.len()).finish()
    }
}

impl Drop for FileViewMut<'_> {
    fn drop(&mut self) {
        self.slot.set_dirty();
    }
}

//! File-per-unit backing store on top of the VFS

use super::BackingStore;
use crate::vfs::{FileHandle, VfsError, VfsInterface, VfsResult};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Stores each unit as a file named after its identifier under `root`
pub struct VfsStore {
    vfs: Arc<dyn VfsInterface>,
    root: PathBuf,
    sync_on_store: bool,
}

impl VfsStore {
    /// Creates a store rooted at `root`, creating the directory if needed
    pub fn new(vfs: Arc<dyn VfsInterface>, root: impl AsRef<Path>) -> VfsResult<Self> {
        let root = root.as_ref().to_path_buf();
        vfs.create_dir_all(Self::path_str(&root)?)?;
        Ok(Self {
            vfs,
            root,
            sync_on_store: false,
        })
    }

    /// Calls fsync after every persist
    pub fn with_sync_on_store(mut self, sync: bool) -> Self {
        self.sync_on_store = sync;
        self
    }

    /// Root directory of the store
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file that backs `identifier`
    ///
    /// An identifier must be a single plain file name, so every unit stays
    /// directly under the root.
    pub fn unit_path(&self, identifier: &str) -> VfsResult<PathBuf> {
        let mut components = Path::new(identifier).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) if name == identifier => {
                Ok(self.root.join(name))
            }
            _ => Err(VfsError::InvalidArgument(format!(
                "identifier '{}' is not a plain file name",
                identifier
            ))),
        }
    }

    fn path_str(path: &Path) -> VfsResult<&str> {
        path.to_str()
            .ok_or_else(|| VfsError::InvalidArgument(format!("non UTF-8 path: {:?}", path)))
    }

    fn write_unit(&self, file: &dyn FileHandle, buf: &[u8]) -> VfsResult<()> {
        file.pwrite_all(buf, 0)?;
        file.truncate(buf.len() as u64)?;
        if self.sync_on_store {
            file.sync()?;
        }
        Ok(())
    }
}

impl BackingStore for VfsStore {
    fn load(&self, identifier: &str, buf: &mut [u8]) -> VfsResult<()> {
        let path = self.unit_path(identifier)?;
        let file = self.vfs.open_file(Self::path_str(&path)?)?;
        let read = file.pread_full(buf, 0);
        let closed = file.close();
        let read = read?;
        closed?;
        debug!("Loaded {} bytes of '{}'", read, identifier);
        Ok(())
    }

    fn create(&self, identifier: &str) -> VfsResult<()> {
        let path = self.unit_path(identifier)?;
        self.vfs.create_file(Self::path_str(&path)?)?.close()
    }

    fn store(&self, identifier: &str, buf: &[u8]) -> VfsResult<()> {
        let path = self.unit_path(identifier)?;
        let file = self.vfs.open_or_create_file(Self::path_str(&path)?)?;
        let written = self.write_unit(file.as_ref(), buf);
        let closed = file.close();
        written?;
        closed?;
        debug!("Persisted {} bytes of '{}'", buf.len(), identifier);
        Ok(())
    }
}

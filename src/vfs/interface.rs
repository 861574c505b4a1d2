//! VFS interface definitions

use crate::vfs::error::VfsResult;

/// Handle to an open file
///
/// All I/O goes through positioned reads and writes so a handle can be
/// shared between threads without a cursor.
pub trait FileHandle: Send + Sync {
    /// Read from the file at a specific offset
    fn pread(&self, buf: &mut [u8], offset: u64) -> VfsResult<usize>;

    /// Write to the file at a specific offset
    fn pwrite(&self, buf: &[u8], offset: u64) -> VfsResult<usize>;

    /// Resize the file to the specified length
    fn truncate(&self, length: u64) -> VfsResult<()>;

    /// Flush file contents to stable storage
    fn sync(&self) -> VfsResult<()>;

    /// Close the file handle
    fn close(self: Box<Self>) -> VfsResult<()>;

    /// Fill `buf` from `offset`, stopping early at end of file
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of bytes read, less than `buf.len()` only at EOF
    fn pread_full(&self, buf: &mut [u8], offset: u64) -> VfsResult<usize> {
        let mut done = 0;
        while done < buf.len() {
            let n = self.pread(&mut buf[done..], offset + done as u64)?;
            if n == 0 {
                break;
            }
            done += n;
        }
        Ok(done)
    }

    /// Write all of `buf` at `offset`
    fn pwrite_all(&self, buf: &[u8], offset: u64) -> VfsResult<()> {
        let mut done = 0;
        while done < buf.len() {
            let n = self.pwrite(&buf[done..], offset + done as u64)?;
            if n == 0 {
                return Err(std::io::Error::from(std::io::ErrorKind::WriteZero).into());
            }
            done += n;
        }
        Ok(())
    }
}

/// VFS interface trait
/// This trait defines the interface for all VFS implementations
pub trait VfsInterface: Send + Sync {
    /// Create a directory and any missing parents
    ///
    /// # Returns
    /// * `Ok(())` if the directory exists afterwards
    /// * `Err(VfsError)` if an error occurred
    fn create_dir_all(&self, path: &str) -> VfsResult<()>;

    /// Create a new file (truncating an existing one) and return a handle to it
    ///
    /// # Arguments
    /// * `path` - The path to the file to create
    ///
    /// # Returns
    /// * `Ok(Box<dyn FileHandle>)` if the file was created successfully
    /// * `Err(VfsError)` if an error occurred
    fn create_file(&self, path: &str) -> VfsResult<Box<dyn FileHandle>>;

    /// Open an existing file and return a handle to it
    ///
    /// # Arguments
    /// * `path` - The path to the file to open
    ///
    /// # Returns
    /// * `Ok(Box<dyn FileHandle>)` if the file was opened successfully
    /// * `Err(VfsError::NotFound)` if the file does not exist
    /// * `Err(VfsError)` if another error occurred
    fn open_file(&self, path: &str) -> VfsResult<Box<dyn FileHandle>>;

    /// Open a file for writing, creating it without truncation if missing
    fn open_or_create_file(&self, path: &str) -> VfsResult<Box<dyn FileHandle>>;
}

//! Local file system implementation using libc system calls

use crate::vfs::error::{VfsError, VfsResult};
use crate::vfs::interface::{FileHandle, VfsInterface};
use libc::{self, c_int, c_void, mode_t, off_t, size_t};
use std::ffi::CString;
use std::path::{Component, Path, PathBuf};

/// Returns the errno left behind by the last failed system call
#[inline]
fn last_errno() -> c_int {
    std::io::Error::last_os_error().raw_os_error().unwrap_or(0)
}

/// Maps an errno from a path-based call to a VFS error
fn path_error(errno: c_int, call: &str, path: &str) -> VfsError {
    match errno {
        libc::ENOENT => VfsError::NotFound(path.to_string()),
        libc::EEXIST => VfsError::AlreadyExists(path.to_string()),
        libc::EACCES | libc::EPERM => VfsError::PermissionDenied(path.to_string()),
        _ => VfsError::SystemError(errno, format!("{} failed for path '{}'", call, path)),
    }
}

/// Local file handle implementation
pub struct LocalFileHandle {
    fd: c_int,
    closed: bool,
}

impl LocalFileHandle {
    /// Create a new LocalFileHandle from a file descriptor
    pub fn new(fd: c_int) -> Self {
        LocalFileHandle { fd, closed: false }
    }
}

impl FileHandle for LocalFileHandle {
    fn pread(&self, buf: &mut [u8], offset: u64) -> VfsResult<usize> {
        let result = unsafe {
            libc::pread(
                self.fd,
                buf.as_mut_ptr() as *mut c_void,
                buf.len() as size_t,
                offset as off_t,
            )
        };

        if result < 0 {
            Err(VfsError::SystemError(last_errno(), "pread failed".to_string()))
        } else {
            Ok(result as usize)
        }
    }

    fn pwrite(&self, buf: &[u8], offset: u64) -> VfsResult<usize> {
        let result = unsafe {
            libc::pwrite(
                self.fd,
                buf.as_ptr() as *const c_void,
                buf.len() as size_t,
                offset as off_t,
            )
        };

        if result < 0 {
            Err(VfsError::SystemError(last_errno(), "pwrite failed".to_string()))
        } else {
            Ok(result as usize)
        }
    }

    fn truncate(&self, length: u64) -> VfsResult<()> {
        let result = unsafe { libc::ftruncate(self.fd, length as off_t) };

        if result < 0 {
            Err(VfsError::SystemError(last_errno(), "ftruncate failed".to_string()))
        } else {
            Ok(())
        }
    }

    fn sync(&self) -> VfsResult<()> {
        let result = unsafe { libc::fsync(self.fd) };

        if result < 0 {
            Err(VfsError::SystemError(last_errno(), "fsync failed".to_string()))
        } else {
            Ok(())
        }
    }

    fn close(mut self: Box<Self>) -> VfsResult<()> {
        self.closed = true;
        let result = unsafe { libc::close(self.fd) };

        if result < 0 {
            Err(VfsError::SystemError(last_errno(), "close failed".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Drop for LocalFileHandle {
    fn drop(&mut self) {
        // Handles dropped on an error path still release their descriptor
        if !self.closed {
            let _ = unsafe { libc::close(self.fd) };
        }
    }
}

/// Local file system implementation
#[derive(Debug, Default)]
pub struct LocalFs {
    // LocalFs doesn't need any state
}

impl LocalFs {
    /// Create a new LocalFs instance
    pub fn new() -> Self {
        LocalFs {}
    }

    /// Open a file with the given flags and mode
    fn open_file_internal(&self, path: &str, flags: c_int, mode: mode_t) -> VfsResult<c_int> {
        let c_path = CString::new(path)?;

        let result = unsafe { libc::open(c_path.as_ptr(), flags | libc::O_CLOEXEC, mode) };

        if result < 0 {
            Err(path_error(last_errno(), "open", path))
        } else {
            Ok(result)
        }
    }

    fn mkdir(&self, path: &str) -> VfsResult<()> {
        let c_path = CString::new(path)?;

        let result = unsafe { libc::mkdir(c_path.as_ptr(), 0o755) };

        if result < 0 {
            Err(path_error(last_errno(), "mkdir", path))
        } else {
            Ok(())
        }
    }
}

impl VfsInterface for LocalFs {
    fn create_dir_all(&self, path: &str) -> VfsResult<()> {
        let mut prefix = PathBuf::new();
        for component in Path::new(path).components() {
            prefix.push(component);
            if matches!(component, Component::RootDir | Component::Prefix(_) | Component::CurDir) {
                continue;
            }
            let prefix_str = prefix
                .to_str()
                .ok_or_else(|| VfsError::InvalidArgument(format!("non UTF-8 path: {:?}", prefix)))?;
            match self.mkdir(prefix_str) {
                Ok(()) | Err(VfsError::AlreadyExists(_)) => {}
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    fn create_file(&self, path: &str) -> VfsResult<Box<dyn FileHandle>> {
        let flags = libc::O_CREAT | libc::O_RDWR | libc::O_TRUNC;
        let mode = 0o644;

        let fd = self.open_file_internal(path, flags, mode)?;
        Ok(Box::new(LocalFileHandle::new(fd)))
    }

    fn open_file(&self, path: &str) -> VfsResult<Box<dyn FileHandle>> {
        let fd = self.open_file_internal(path, libc::O_RDWR, 0)?;
        Ok(Box::new(LocalFileHandle::new(fd)))
    }

    fn open_or_create_file(&self, path: &str) -> VfsResult<Box<dyn FileHandle>> {
        let fd = self.open_file_internal(path, libc::O_CREAT | libc::O_RDWR, 0o644)?;
        Ok(Box::new(LocalFileHandle::new(fd)))
    }
}

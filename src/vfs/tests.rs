// VFS functionality tests

use super::*;
use tempfile::TempDir;

fn path_in(dir: &TempDir, name: &str) -> String {
    dir.path().join(name).to_str().unwrap().to_string()
}

#[test]
fn test_vfs_create_dir_all_nested() {
    let fs = LocalFs::new();
    let temp_dir = TempDir::new().unwrap();
    let nested = path_in(&temp_dir, "a/b/c");

    assert!(!temp_dir.path().join("a").exists());
    fs.create_dir_all(&nested).unwrap();
    assert!(temp_dir.path().join("a/b/c").is_dir());

    // Creating again is not an error
    fs.create_dir_all(&nested).unwrap();
}

#[test]
fn test_vfs_pwrite_pread_round_trip() {
    let fs = LocalFs::new();
    let temp_dir = TempDir::new().unwrap();
    let test_file = path_in(&temp_dir, "unit.dat");

    let file = fs.create_file(&test_file).unwrap();
    file.pwrite_all(b"Hello, VFS!", 0).unwrap();
    file.close().unwrap();

    let file = fs.open_file(&test_file).unwrap();
    let mut read_data = [0u8; 11];
    assert_eq!(file.pread_full(&mut read_data, 0).unwrap(), 11);
    assert_eq!(&read_data, b"Hello, VFS!");
    file.close().unwrap();
}

#[test]
fn test_vfs_pread_full_stops_at_eof() {
    let fs = LocalFs::new();
    let temp_dir = TempDir::new().unwrap();
    let test_file = path_in(&temp_dir, "short.dat");

    let file = fs.create_file(&test_file).unwrap();
    file.pwrite_all(b"abc", 0).unwrap();

    let mut buf = [0xFFu8; 8];
    assert_eq!(file.pread_full(&mut buf, 0).unwrap(), 3);
    assert_eq!(&buf[..3], b"abc");
    assert_eq!(&buf[3..], &[0xFF; 5]);
    file.close().unwrap();
}

#[test]
fn test_vfs_truncate_and_sync() {
    let fs = LocalFs::new();
    let temp_dir = TempDir::new().unwrap();
    let test_file = path_in(&temp_dir, "trunc.dat");

    let file = fs.create_file(&test_file).unwrap();
    file.pwrite_all(&[7u8; 64], 0).unwrap();
    file.truncate(16).unwrap();
    file.sync().unwrap();
    file.close().unwrap();

    assert_eq!(std::fs::metadata(&test_file).unwrap().len(), 16);
}

#[test]
fn test_vfs_open_or_create_keeps_contents() {
    let fs = LocalFs::new();
    let temp_dir = TempDir::new().unwrap();
    let test_file = path_in(&temp_dir, "keep.dat");

    let file = fs.open_or_create_file(&test_file).unwrap();
    file.pwrite_all(b"keep", 0).unwrap();
    file.close().unwrap();

    let file = fs.open_or_create_file(&test_file).unwrap();
    let mut buf = [0u8; 4];
    file.pread_full(&mut buf, 0).unwrap();
    assert_eq!(&buf, b"keep");
    file.close().unwrap();
}

#[test]
fn test_vfs_missing_file_is_not_found() {
    let fs = LocalFs::new();
    let temp_dir = TempDir::new().unwrap();
    let missing = path_in(&temp_dir, "missing.dat");

    let err = fs.open_file(&missing).err().unwrap();
    assert!(err.is_not_found());
    assert!(matches!(err, VfsError::NotFound(_)));
}

#[test]
fn test_vfs_error_display() {
    let err = VfsError::NotFound("One".to_string());
    assert_eq!(err.to_string(), "File or directory not found: One");

    let err = VfsError::SystemError(5, "pwrite failed".to_string());
    assert_eq!(err.to_string(), "System error (errno 5): pwrite failed");
}

#[test]
fn test_vfs_nul_in_path_is_invalid_argument() {
    let fs = LocalFs::new();
    let err = fs.open_file("bad\0path").err().unwrap();
    assert!(matches!(err, VfsError::InvalidArgument(_)));
}

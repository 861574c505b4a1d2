// Backing store tests

use super::*;
use crate::vfs::{LocalFs, VfsError};
use std::sync::Arc;
use tempfile::TempDir;

fn vfs_store(dir: &TempDir) -> VfsStore {
    VfsStore::new(Arc::new(LocalFs::new()), dir.path().join("units")).unwrap()
}

#[test]
fn test_vfs_store_creates_root() {
    let temp_dir = TempDir::new().unwrap();
    let store = vfs_store(&temp_dir);
    assert!(store.root().is_dir());
}

#[test]
fn test_vfs_store_load_missing_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let store = vfs_store(&temp_dir);

    let mut buf = vec![0u8; 32];
    let err = store.load("One", &mut buf).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_vfs_store_create_makes_empty_unit() {
    let temp_dir = TempDir::new().unwrap();
    let store = vfs_store(&temp_dir);

    store.create("One").unwrap();
    assert_eq!(std::fs::metadata(store.unit_path("One").unwrap()).unwrap().len(), 0);

    let mut buf = vec![9u8; 16];
    store.load("One", &mut buf).unwrap();
    // Nothing to read, buffer untouched
    assert_eq!(buf, vec![9u8; 16]);
}

#[test]
fn test_vfs_store_persists_exact_unit_length() {
    let temp_dir = TempDir::new().unwrap();
    let store = vfs_store(&temp_dir);
    let path = store.unit_path("Two").unwrap();

    // Longer stale content gets cut back to the unit size
    std::fs::write(&path, vec![1u8; 100]).unwrap();

    let mut unit = vec![0u8; 64];
    unit[..5].copy_from_slice(b"hello");
    store.store("Two", &unit).unwrap();

    let on_disk = std::fs::read(&path).unwrap();
    assert_eq!(on_disk.len(), 64);
    assert_eq!(on_disk, unit);
}

#[test]
fn test_vfs_store_short_unit_loads_zero_padded() {
    let temp_dir = TempDir::new().unwrap();
    let store = vfs_store(&temp_dir);
    std::fs::write(store.unit_path("Three").unwrap(), b"abc").unwrap();

    let mut buf = vec![0u8; 8];
    store.load("Three", &mut buf).unwrap();
    assert_eq!(&buf, b"abc\0\0\0\0\0");
}

#[test]
fn test_vfs_store_rejects_identifiers_outside_root() {
    let temp_dir = TempDir::new().unwrap();
    let store = vfs_store(&temp_dir);

    for identifier in ["../escape", "/tmp/absolute", "nested/unit", "..", ".", ""] {
        let err = store.unit_path(identifier).unwrap_err();
        assert!(matches!(err, VfsError::InvalidArgument(_)), "{}", identifier);
        assert!(matches!(
            store.store(identifier, b"data"),
            Err(VfsError::InvalidArgument(_))
        ));
    }
    assert!(!temp_dir.path().join("escape").exists());

    let mut buf = [0u8; 4];
    assert!(matches!(
        store.load("../units/x", &mut buf),
        Err(VfsError::InvalidArgument(_))
    ));
    assert!(store.create("plain-name").is_ok());
}

#[test]
fn test_vfs_store_with_sync() {
    let temp_dir = TempDir::new().unwrap();
    let store = vfs_store(&temp_dir).with_sync_on_store(true);

    store.store("Four", &[4u8; 16]).unwrap();
    let mut buf = vec![0u8; 16];
    store.load("Four", &mut buf).unwrap();
    assert_eq!(buf, vec![4u8; 16]);
}

#[test]
fn test_memory_store_records_persists() {
    let store = MemoryStore::new();
    store.store("A", b"aa").unwrap();
    store.store("B", b"bb").unwrap();
    store.store("A", b"cc").unwrap();

    assert_eq!(store.persist_log(), vec!["A", "B", "A"]);
    assert_eq!(store.unit("A").unwrap(), b"cc");
}

#[test]
fn test_memory_store_load_and_create() {
    let store = MemoryStore::new();
    let mut buf = vec![0u8; 4];
    assert!(store.load("X", &mut buf).unwrap_err().is_not_found());

    store.create("X").unwrap();
    assert!(store.contains("X"));
    assert_eq!(store.create_count(), 1);

    store.insert("Y", b"yyyyyy");
    store.load("Y", &mut buf).unwrap();
    assert_eq!(&buf, b"yyyy");
}

#[test]
fn test_memory_store_failure_injection() {
    let store = MemoryStore::new();
    store.fail_stores_for("bad");
    store.fail_loads_for("bad");

    let err = store.store("bad", b"x").unwrap_err();
    assert!(matches!(err, VfsError::SystemError(_, _)));
    let mut buf = [0u8; 1];
    assert!(store.load("bad", &mut buf).is_err());
    assert!(store.persist_log().is_empty());

    store.clear_failures();
    store.store("bad", b"x").unwrap();
    assert_eq!(store.persist_log(), vec!["bad"]);
}

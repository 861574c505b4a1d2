//! In-process backing store

use super::BackingStore;
use crate::vfs::{VfsError, VfsResult};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

#[derive(Default)]
struct MemoryState {
    units: HashMap<String, Vec<u8>>,
    persist_log: Vec<String>,
    load_count: usize,
    create_count: usize,
    failing_stores: HashSet<String>,
    failing_loads: HashSet<String>,
}

/// Backing store that keeps every unit in memory
///
/// Records the order of persists and can be told to fail specific
/// identifiers, which makes the writeback path observable.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a unit as if it already existed on disk
    pub fn insert(&self, identifier: &str, content: &[u8]) {
        self.state
            .lock()
            .units
            .insert(identifier.to_string(), content.to_vec());
    }

    /// Returns a copy of the stored unit
    pub fn unit(&self, identifier: &str) -> Option<Vec<u8>> {
        self.state.lock().units.get(identifier).cloned()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.state.lock().units.contains_key(identifier)
    }

    /// Identifiers passed to successful `store` calls, oldest first
    pub fn persist_log(&self) -> Vec<String> {
        self.state.lock().persist_log.clone()
    }

    pub fn load_count(&self) -> usize {
        self.state.lock().load_count
    }

    pub fn create_count(&self) -> usize {
        self.state.lock().create_count
    }

    /// Makes every following `store` of `identifier` fail
    pub fn fail_stores_for(&self, identifier: &str) {
        self.state.lock().failing_stores.insert(identifier.to_string());
    }

    /// Makes every following `load` of `identifier` fail
    pub fn fail_loads_for(&self, identifier: &str) {
        self.state.lock().failing_loads.insert(identifier.to_string());
    }

    pub fn clear_failures(&self) {
        let mut state = self.state.lock();
        state.failing_stores.clear();
        state.failing_loads.clear();
    }
}

fn injected(call: &str, identifier: &str) -> VfsError {
    VfsError::SystemError(libc::EIO, format!("{} failed for '{}'", call, identifier))
}

impl BackingStore for MemoryStore {
    fn load(&self, identifier: &str, buf: &mut [u8]) -> VfsResult<()> {
        let mut state = self.state.lock();
        if state.failing_loads.contains(identifier) {
            return Err(injected("load", identifier));
        }
        state.load_count += 1;
        let unit = state
            .units
            .get(identifier)
            .ok_or_else(|| VfsError::NotFound(identifier.to_string()))?;
        let n = unit.len().min(buf.len());
        buf[..n].copy_from_slice(&unit[..n]);
        Ok(())
    }

    fn create(&self, identifier: &str) -> VfsResult<()> {
        let mut state = self.state.lock();
        state.create_count += 1;
        state.units.insert(identifier.to_string(), Vec::new());
        Ok(())
    }

    fn store(&self, identifier: &str, buf: &[u8]) -> VfsResult<()> {
        let mut state = self.state.lock();
        if state.failing_stores.contains(identifier) {
            return Err(injected("store", identifier));
        }
        state.units.insert(identifier.to_string(), buf.to_vec());
        state.persist_log.push(identifier.to_string());
        Ok(())
    }
}

// Cache directory: identifier map and per-slot pin state

use crate::types::{PinCount, SlotId};
use std::collections::HashMap;

/// Directory-side metadata of one slot
#[derive(Debug, Default, Clone)]
pub(crate) struct EntryMeta {
    /// Identifier currently held by the slot, `None` while the slot is empty
    pub(crate) identifier: Option<String>,
    pub(crate) pin_count: PinCount,
    /// Set while a thread owns the slot for writeback or reload
    pub(crate) io_in_progress: bool,
}

impl EntryMeta {
    #[inline]
    pub(crate) fn is_pinned(&self) -> bool {
        self.pin_count > 0
    }
}

/// What the directory knows about an identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lookup {
    /// Resident and pinned
    Pinned(SlotId),
    /// Resident and waiting in the eviction queue
    Unpinned(SlotId),
    /// Being written back or loaded by another thread
    Busy,
    /// Not resident
    Absent,
}

/// Identifier to slot mapping guarded by the directory lock
///
/// `map` holds resident identifiers only. An identifier being admitted sits
/// in `inflight` until its content is loaded, so it never counts towards
/// the resident set before it is usable.
pub(crate) struct Directory {
    pub(crate) map: HashMap<String, SlotId>,
    pub(crate) inflight: HashMap<String, SlotId>,
    pub(crate) entries: Vec<EntryMeta>,
    next_unused: SlotId,
}

impl Directory {
    pub(crate) fn new(capacity: usize) -> Self {
        Directory {
            map: HashMap::with_capacity(capacity),
            inflight: HashMap::new(),
            entries: vec![EntryMeta::default(); capacity],
            next_unused: 0,
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub(crate) fn resident(&self) -> usize {
        self.map.len()
    }

    pub(crate) fn lookup(&self, identifier: &str) -> Lookup {
        if self.inflight.contains_key(identifier) {
            return Lookup::Busy;
        }
        match self.map.get(identifier) {
            Some(&slot) => {
                let entry = &self.entries[slot];
                if entry.io_in_progress {
                    Lookup::Busy
                } else if entry.is_pinned() {
                    Lookup::Pinned(slot)
                } else {
                    Lookup::Unpinned(slot)
                }
            }
            None => Lookup::Absent,
        }
    }

    /// Slot of a resident, pinned identifier that no I/O currently owns
    pub(crate) fn pinned_slot(&self, identifier: &str) -> Option<SlotId> {
        match self.lookup(identifier) {
            Lookup::Pinned(slot) => Some(slot),
            _ => None,
        }
    }

    /// Hands out a never-used slot while the pool is below capacity
    pub(crate) fn take_unused(&mut self) -> Option<SlotId> {
        if self.next_unused < self.capacity() {
            let slot = self.next_unused;
            self.next_unused += 1;
            Some(slot)
        } else {
            None
        }
    }

    /// Number of slots that have ever been handed out
    #[cfg(test)]
    pub(crate) fn slots_in_use(&self) -> usize {
        self.next_unused
    }

    /// Claims `slot` for loading `identifier`
    ///
    /// The slot keeps its old identifier in `map` until the reload finishes,
    /// so pinners of either identifier see `Busy` and wait.
    pub(crate) fn begin_reclaim(&mut self, slot: SlotId, identifier: &str) {
        let entry = &mut self.entries[slot];
        debug_assert!(!entry.is_pinned(), "reclaiming pinned slot {}", slot);
        entry.io_in_progress = true;
        self.inflight.insert(identifier.to_string(), slot);
    }

    /// Publishes `identifier` in `slot`, pinned once, replacing the old identifier
    pub(crate) fn complete_reclaim(&mut self, slot: SlotId, identifier: &str) {
        self.inflight.remove(identifier);
        if let Some(old) = self.entries[slot].identifier.take() {
            self.map.remove(&old);
        }
        self.map.insert(identifier.to_string(), slot);
        self.entries[slot] = EntryMeta {
            identifier: Some(identifier.to_string()),
            pin_count: 1,
            io_in_progress: false,
        };
    }

    /// Writeback failed: the old identifier keeps the slot, unpinned
    pub(crate) fn abort_reclaim(&mut self, slot: SlotId, identifier: &str) {
        self.inflight.remove(identifier);
        self.entries[slot].io_in_progress = false;
    }

    /// Reload failed after the old content was safe: the slot ends up empty
    pub(crate) fn vacate(&mut self, slot: SlotId, identifier: &str) {
        self.inflight.remove(identifier);
        if let Some(old) = self.entries[slot].identifier.take() {
            self.map.remove(&old);
        }
        self.entries[slot] = EntryMeta::default();
    }
}

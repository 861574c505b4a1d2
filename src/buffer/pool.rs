//! Concrete buffer pool

use super::directory::{Directory, Lookup};
use super::error::{BufferError, BufferResult};
use super::free_list::EvictionQueue;
use super::slot::Slot;
use super::view::{FileView, FileViewMut};
use super::{CacheStats, FileCache};
use crate::config::CacheConfig;
use crate::store::BackingStore;
use crate::types::{PinCount, SlotId};
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// How a reclamation went wrong
enum ReclaimFailure {
    /// Old content could not be written back; nothing was overwritten
    Writeback(BufferError),
    /// Old content is safe but the new unit could not be read or created
    Reload(BufferError),
}

/// Fixed-capacity, pin-based cache of whole files
///
/// Locking protocol:
/// 1. `directory` guards the identifier map and every slot's pin count.
/// 2. `queue` guards the eviction queue. It is only ever taken while
///    holding `directory` or with no lock at all, never the reverse.
/// 3. A pinner that has to wait for a free buffer releases `directory`
///    before it sleeps on the queue, and re-evaluates from scratch after.
/// 4. Writeback and reload run with neither lock held; the slot is flagged
///    `io_in_progress` and other pinners of the affected identifiers wait
///    on `io_done`.
/// 5. Buffer contents are behind a per-slot reader/writer lock. The
///    directory lock is never held while blocking on it.
/// 6. Flushes pin the content with a shared lock under `directory`, then
///    write it out with only that shared lock held.
pub struct BufferPool {
    config: CacheConfig,
    slots: Box<[Slot]>,
    directory: Mutex<Directory>,
    io_done: Condvar,
    queue: EvictionQueue,
    store: Arc<dyn BackingStore>,
    closed: bool,
}

impl BufferPool {
    /// Creates a pool from a validated configuration
    pub fn new(config: CacheConfig, store: Arc<dyn BackingStore>) -> BufferResult<Self> {
        config.validate()?;
        let capacity = config.max_cache_entries;
        let slots = (0..capacity).map(|_| Slot::new()).collect();

        info!(
            "Creating buffer pool with {} entries of {} bytes",
            capacity, config.file_size
        );

        Ok(BufferPool {
            slots,
            directory: Mutex::new(Directory::new(capacity)),
            io_done: Condvar::new(),
            queue: EvictionQueue::new(capacity),
            store,
            config,
            closed: false,
        })
    }

    /// Persists every dirty entry and reports the first failure
    pub fn close(mut self) -> BufferResult<()> {
        self.closed = true;
        self.write_back_all().map(|_| ())
    }

    fn deadline(&self) -> Option<Instant> {
        self.config.pin_timeout().map(|timeout| Instant::now() + timeout)
    }

    fn timeout_error(&self, identifier: &str) -> BufferError {
        let waited = self.config.pin_timeout().unwrap_or_default();
        warn!("Timed out after {:?} waiting to pin '{}'", waited, identifier);
        BufferError::PinTimeout {
            identifier: identifier.to_string(),
            waited,
        }
    }

    /// Pins a single identifier, admitting it if needed
    ///
    /// A victim whose writeback fails goes to the back of the queue and the
    /// next one is tried. The error is only returned once every queued
    /// candidate has failed for this pin.
    fn pin_one(&self, identifier: &str) -> BufferResult<()> {
        let deadline = self.deadline();
        let mut failed_victims: Vec<SlotId> = Vec::new();
        let mut writeback_failure: Option<BufferError> = None;
        let mut dir = self.directory.lock();

        loop {
            match dir.lookup(identifier) {
                Lookup::Pinned(slot) => {
                    let entry = &mut dir.entries[slot];
                    entry.pin_count += 1;
                    debug!("Pin hit for '{}' (pin count {})", identifier, entry.pin_count);
                    return Ok(());
                }
                Lookup::Unpinned(slot) => {
                    let removed = self.queue.remove(slot);
                    debug_assert!(removed, "unpinned slot {} missing from queue", slot);
                    dir.entries[slot].pin_count = 1;
                    debug!("Pin hit for '{}', taken off the eviction queue", identifier);
                    return Ok(());
                }
                Lookup::Busy => {
                    self.wait_for_io(&mut dir, identifier, deadline)?;
                    continue;
                }
                Lookup::Absent => {}
            }

            let claimed = match dir.take_unused() {
                Some(slot) => {
                    debug!("Admitting '{}' into unused slot {}", identifier, slot);
                    Some(slot)
                }
                None => self.queue.pop_front(),
            };

            if let Some(slot) = claimed {
                if let Some(err) = writeback_failure.take_if(|_| failed_victims.contains(&slot)) {
                    // Back at a victim that already failed: nothing else left to try
                    self.queue.enqueue_front(slot);
                    return Err(err);
                }
                match self.admit(dir, slot, identifier) {
                    Ok(()) => return Ok(()),
                    Err(ReclaimFailure::Reload(err)) => return Err(err),
                    Err(ReclaimFailure::Writeback(err)) => {
                        failed_victims.push(slot);
                        writeback_failure.get_or_insert(err);
                        dir = self.directory.lock();
                        continue;
                    }
                }
            }

            // Nothing evictable: sleep without the directory lock
            debug!("Pool full, '{}' waiting for an unpin", identifier);
            let available =
                MutexGuard::unlocked(&mut dir, || self.queue.wait_until_available(deadline));
            if !available {
                return Err(self.timeout_error(identifier));
            }
        }
    }

    fn wait_for_io(
        &self,
        dir: &mut MutexGuard<'_, Directory>,
        identifier: &str,
        deadline: Option<Instant>,
    ) -> BufferResult<()> {
        match deadline {
            Some(deadline) => {
                if self.io_done.wait_until(dir, deadline).timed_out() {
                    return Err(self.timeout_error(identifier));
                }
            }
            None => self.io_done.wait(dir),
        }
        Ok(())
    }

    /// Loads `identifier` into `slot`, writing back the slot's old content first
    ///
    /// Consumes the directory guard: the I/O runs unlocked and the directory
    /// is re-locked to publish the result. After a failed writeback the old
    /// identifier keeps the slot, still dirty, at the tail of the queue.
    fn admit(
        &self,
        mut dir: MutexGuard<'_, Directory>,
        slot: SlotId,
        identifier: &str,
    ) -> Result<(), ReclaimFailure> {
        let previous = dir.entries[slot].identifier.clone();
        dir.begin_reclaim(slot, identifier);
        drop(dir);

        let result = self.reclaim(slot, previous.as_deref(), identifier);

        let mut dir = self.directory.lock();
        match &result {
            Ok(()) => dir.complete_reclaim(slot, identifier),
            Err(ReclaimFailure::Writeback(_)) => {
                dir.abort_reclaim(slot, identifier);
                self.queue.enqueue(slot);
            }
            Err(ReclaimFailure::Reload(_)) => {
                dir.vacate(slot, identifier);
                self.queue.enqueue_front(slot);
            }
        }
        drop(dir);
        self.io_done.notify_all();
        result
    }

    /// Writeback and reload of a claimed slot; runs without directory lock
    fn reclaim(
        &self,
        slot_id: SlotId,
        previous: Option<&str>,
        identifier: &str,
    ) -> Result<(), ReclaimFailure> {
        let slot = &self.slots[slot_id];
        let mut content = slot.content.write();

        if let Some(previous) = previous {
            if slot.take_dirty() {
                debug!("Writing back dirty '{}' before reusing slot {}", previous, slot_id);
                if let Err(source) = self.store.store(previous, &content) {
                    slot.set_dirty();
                    error!("Failed to write back '{}': {}", previous, source);
                    return Err(ReclaimFailure::Writeback(BufferError::PersistFailed {
                        identifier: previous.to_string(),
                        source,
                    }));
                }
            }
            debug!("Evicted '{}' from slot {} for '{}'", previous, slot_id, identifier);
        }

        Slot::reset(&mut content, self.config.file_size);

        match self.store.load(identifier, &mut content) {
            Ok(()) => Ok(()),
            Err(err) if err.is_not_found() => {
                debug!("'{}' does not exist, creating it", identifier);
                if let Err(source) = self.store.create(identifier) {
                    error!("Failed to create '{}': {}", identifier, source);
                    return Err(ReclaimFailure::Reload(BufferError::LoadFailed {
                        identifier: identifier.to_string(),
                        source,
                    }));
                }
                slot.set_dirty();
                Ok(())
            }
            Err(source) => {
                error!("Failed to load '{}': {}", identifier, source);
                slot.clear_dirty();
                Err(ReclaimFailure::Reload(BufferError::LoadFailed {
                    identifier: identifier.to_string(),
                    source,
                }))
            }
        }
    }

    fn unpin_one(&self, identifier: &str) {
        let mut dir = self.directory.lock();
        let Some(&slot) = dir.map.get(identifier) else {
            return;
        };
        let entry = &mut dir.entries[slot];
        if entry.io_in_progress || !entry.is_pinned() {
            return;
        }
        entry.pin_count -= 1;
        if entry.pin_count == 0 {
            self.queue.enqueue(slot);
            debug!("'{}' unpinned, now evictable", identifier);
        }
    }

    /// Writes one resident entry back if it is dirty
    ///
    /// The content read lock is taken while the directory lock is held, so
    /// the slot cannot be reclaimed for another identifier before the write.
    /// The write itself runs with only that read lock held. A slot whose
    /// content is write-locked, or that is busy with a reclaim, is skipped and
    /// stays dirty.
    fn persist_resident(&self, identifier: &str) -> BufferResult<bool> {
        let dir = self.directory.lock();
        let slot = match dir.lookup(identifier) {
            Lookup::Pinned(slot) | Lookup::Unpinned(slot) => &self.slots[slot],
            // Busy slots are written back by the thread that owns them
            Lookup::Busy | Lookup::Absent => return Ok(false),
        };
        if !slot.is_dirty() {
            return Ok(false);
        }
        let Some(content) = slot.content.try_read() else {
            debug!("'{}' is being written to, leaving it dirty", identifier);
            return Ok(false);
        };
        drop(dir);

        if !slot.take_dirty() {
            return Ok(false);
        }
        if let Err(source) = self.store.store(identifier, &content) {
            slot.set_dirty();
            error!("Failed to flush '{}': {}", identifier, source);
            return Err(BufferError::PersistFailed {
                identifier: identifier.to_string(),
                source,
            });
        }
        debug!("Flushed '{}'", identifier);
        Ok(true)
    }

    /// Teardown writeback; exclusive access, so no locking is involved
    fn write_back_all(&mut self) -> BufferResult<usize> {
        let dir = self.directory.get_mut();
        let mut written = 0;
        let mut first_error = None;

        for (identifier, &slot_id) in dir.map.iter() {
            let slot = &mut self.slots[slot_id];
            if !slot.take_dirty() {
                continue;
            }
            match self.store.store(identifier, slot.content.get_mut()) {
                Ok(()) => written += 1,
                Err(source) => {
                    slot.set_dirty();
                    error!("Failed to persist '{}' at teardown: {}", identifier, source);
                    first_error.get_or_insert(BufferError::PersistFailed {
                        identifier: identifier.clone(),
                        source,
                    });
                }
            }
        }

        info!("Buffer pool teardown persisted {} dirty entries", written);
        match first_error {
            Some(err) => Err(err),
            None => Ok(written),
        }
    }

    #[cfg(test)]
    pub(crate) fn queue_order(&self) -> Vec<String> {
        let dir = self.directory.lock();
        self.queue
            .snapshot()
            .into_iter()
            .filter_map(|slot| dir.entries[slot].identifier.clone())
            .collect()
    }

    /// Checks the membership invariants; only meaningful while no pin is mid-admission
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        let dir = self.directory.lock();
        assert!(dir.resident() <= dir.capacity(), "directory over capacity");
        assert!(dir.slots_in_use() <= dir.capacity());
        for (identifier, &slot) in dir.map.iter() {
            let entry = &dir.entries[slot];
            assert_eq!(entry.identifier.as_deref(), Some(identifier.as_str()));
            let queued = self.queue.contains(slot);
            assert!(
                entry.is_pinned() != queued,
                "'{}' pinned={} queued={}",
                identifier,
                entry.is_pinned(),
                queued
            );
        }
    }
}

impl FileCache for BufferPool {
    fn pin_files(&self, identifiers: &[&str]) -> BufferResult<()> {
        for (done, &identifier) in identifiers.iter().enumerate() {
            if let Err(err) = self.pin_one(identifier) {
                if done > 0 {
                    warn!(
                        "Pinning '{}' failed, releasing {} pins taken earlier in the batch",
                        identifier, done
                    );
                }
                for &pinned in identifiers[..done].iter().rev() {
                    self.unpin_one(pinned);
                }
                return Err(err);
            }
        }
        Ok(())
    }

    fn unpin_files(&self, identifiers: &[&str]) {
        for &identifier in identifiers {
            self.unpin_one(identifier);
        }
    }

    fn file_data(&self, identifier: &str) -> Option<FileView<'_>> {
        let slot = self.directory.lock().pinned_slot(identifier)?;
        Some(FileView::new(&self.slots[slot]))
    }

    fn mutable_file_data(&self, identifier: &str) -> Option<FileViewMut<'_>> {
        let slot = self.directory.lock().pinned_slot(identifier)?;
        let slot = &self.slots[slot];
        slot.set_dirty();
        Some(FileViewMut::new(slot))
    }

    fn flush_file(&self, identifier: &str) -> BufferResult<bool> {
        self.persist_resident(identifier)
    }

    fn flush_all(&self) -> BufferResult<usize> {
        let identifiers: Vec<String> = self.directory.lock().map.keys().cloned().collect();
        let mut flushed = 0;
        let mut first_error = None;

        for identifier in &identifiers {
            match self.persist_resident(identifier) {
                Ok(true) => flushed += 1,
                Ok(false) => {}
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(flushed),
        }
    }

    fn pin_count(&self, identifier: &str) -> Option<PinCount> {
        let dir = self.directory.lock();
        match dir.lookup(identifier) {
            Lookup::Pinned(slot) | Lookup::Unpinned(slot) => Some(dir.entries[slot].pin_count),
            Lookup::Busy | Lookup::Absent => None,
        }
    }

    fn stats(&self) -> CacheStats {
        let dir = self.directory.lock();
        let mut stats = CacheStats {
            capacity: dir.capacity(),
            resident: dir.resident(),
            ..CacheStats::default()
        };
        for &slot in dir.map.values() {
            let entry = &dir.entries[slot];
            if entry.is_pinned() {
                stats.pinned += 1;
            } else if !entry.io_in_progress {
                stats.evictable += 1;
            }
            if self.slots[slot].is_dirty() {
                stats.dirty += 1;
            }
        }
        stats
    }
}

impl Drop for BufferPool {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        // Errors were already logged by write_back_all
        let _ = self.write_back_all();
    }
}

// Eviction queue: FIFO list of unpinned slots linked by index

use crate::types::SlotId;
use parking_lot::{Condvar, Mutex};
use std::time::Instant;

/// Doubly linked list over slot indices
///
/// Links live in side arrays indexed by slot, so membership tests, removal
/// from the middle and both ends are O(1) without any pointers. A slot is
/// linked at most once.
#[derive(Debug)]
pub struct FreeList {
    prev: Vec<Option<SlotId>>,
    next: Vec<Option<SlotId>>,
    linked: Vec<bool>,
    head: Option<SlotId>,
    tail: Option<SlotId>,
    len: usize,
}

impl FreeList {
    /// Create an empty list able to hold slots `0..capacity`
    pub fn with_capacity(capacity: usize) -> Self {
        FreeList {
            prev: vec![None; capacity],
            next: vec![None; capacity],
            linked: vec![false; capacity],
            head: None,
            tail: None,
            len: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn contains(&self, slot: SlotId) -> bool {
        self.linked[slot]
    }

    /// Append a slot at the tail
    ///
    /// Returns false (and leaves the list alone) if the slot is already linked.
    pub fn push_back(&mut self, slot: SlotId) -> bool {
        if self.linked[slot] {
            return false;
        }
        self.prev[slot] = self.tail;
        self.next[slot] = None;
        match self.tail {
            Some(tail) => self.next[tail] = Some(slot),
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
        self.linked[slot] = true;
        self.len += 1;
        true
    }

    /// Insert a slot at the head so it is the next one popped
    pub fn push_front(&mut self, slot: SlotId) -> bool {
        if self.linked[slot] {
            return false;
        }
        self.prev[slot] = None;
        self.next[slot] = self.head;
        match self.head {
            Some(head) => self.prev[head] = Some(slot),
            None => self.tail = Some(slot),
        }
        self.head = Some(slot);
        self.linked[slot] = true;
        self.len += 1;
        true
    }

    /// Remove and return the oldest slot
    pub fn pop_front(&mut self) -> Option<SlotId> {
        let head = self.head?;
        self.remove(head);
        Some(head)
    }

    /// Unlink a slot from anywhere in the list
    ///
    /// Returns false if the slot was not linked.
    pub fn remove(&mut self, slot: SlotId) -> bool {
        if !self.linked[slot] {
            return false;
        }
        let prev = self.prev[slot].take();
        let next = self.next[slot].take();

        match prev {
            Some(p) => self.next[p] = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.prev[n] = prev,
            None => self.tail = prev,
        }

        self.linked[slot] = false;
        self.len -= 1;
        true
    }

    /// Slots from head (next to evict) to tail
    pub fn iter(&self) -> FreeListIter<'_> {
        FreeListIter {
            list: self,
            cursor: self.head,
        }
    }
}

pub struct FreeListIter<'a> {
    list: &'a FreeList,
    cursor: Option<SlotId>,
}

impl Iterator for FreeListIter<'_> {
    type Item = SlotId;

    fn next(&mut self) -> Option<SlotId> {
        let slot = self.cursor?;
        self.cursor = self.list.next[slot];
        Some(slot)
    }
}

/// Unpinned slots in the order they became unpinned, plus a wake-up
/// condition for pinners waiting on a full pool
///
/// Lock order: callers may hold the directory lock while calling into the
/// queue, never the other way round. `wait_until_available` must be called
/// without the directory lock.
pub struct EvictionQueue {
    list: Mutex<FreeList>,
    available: Condvar,
}

impl EvictionQueue {
    pub fn new(capacity: usize) -> Self {
        EvictionQueue {
            list: Mutex::new(FreeList::with_capacity(capacity)),
            available: Condvar::new(),
        }
    }

    /// Append a newly unpinned slot and wake waiting pinners
    pub fn enqueue(&self, slot: SlotId) {
        let mut list = self.list.lock();
        let linked = list.push_back(slot);
        debug_assert!(linked, "slot {} enqueued twice", slot);
        self.available.notify_all();
    }

    /// Put a slot back at the head, ahead of everything already queued
    pub fn enqueue_front(&self, slot: SlotId) {
        let mut list = self.list.lock();
        let linked = list.push_front(slot);
        debug_assert!(linked, "slot {} enqueued twice", slot);
        self.available.notify_all();
    }

    /// Take the oldest unpinned slot without waiting
    pub fn pop_front(&self) -> Option<SlotId> {
        self.list.lock().pop_front()
    }

    /// Drop a slot that is being pinned again
    pub fn remove(&self, slot: SlotId) -> bool {
        self.list.lock().remove(slot)
    }

    pub fn len(&self) -> usize {
        self.list.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.lock().is_empty()
    }

    pub fn contains(&self, slot: SlotId) -> bool {
        self.list.lock().contains(slot)
    }

    /// Queue contents, next victim first
    pub fn snapshot(&self) -> Vec<SlotId> {
        self.list.lock().iter().collect()
    }

    /// Block until the queue is non-empty or `deadline` passes
    ///
    /// Re-checks after every wake-up, so spurious wake-ups are harmless. A
    /// `true` result is only a hint: another thread may take the slot before
    /// the caller gets back to it.
    pub fn wait_until_available(&self, deadline: Option<Instant>) -> bool {
        let mut list = self.list.lock();
        while list.is_empty() {
            match deadline {
                Some(deadline) => {
                    if self.available.wait_until(&mut list, deadline).timed_out() {
                        return !list.is_empty();
                    }
                }
                None => self.available.wait(&mut list),
            }
        }
        true
    }
}

//! FIFO of slots waiting for a background read.

use std::collections::VecDeque;

/// Work queue shared by the consumers and the I/O thread.
///
/// Lives inside the fileset's shared state and is only touched with the
/// shared mutex held. A slot is queued at most once: consumers enqueue it
/// right after a swap and the I/O thread dequeues it right before reading,
/// so at most one background read is ever outstanding per slot.
#[derive(Debug)]
pub(crate) struct WorkQueue {
    entries: VecDeque<usize>,
    queued: Vec<bool>,
}

impl WorkQueue {
    /// Create an empty queue for `slots` files.
    pub(crate) fn new(slots: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(slots),
            queued: vec![false; slots],
        }
    }

    /// Append a slot to the tail.
    pub(crate) fn push(&mut self, slot: usize) {
        assert!(!self.queued[slot], "slot {slot} queued twice");
        self.queued[slot] = true;
        self.entries.push_back(slot);
    }

    /// Remove the slot at the head.
    pub(crate) fn pop(&mut self) -> Option<usize> {
        let slot = self.entries.pop_front()?;
        self.queued[slot] = false;
        Some(slot)
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, slot: usize) -> bool {
        self.queued[slot]
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

//! Array-backed binary min-heap of expiry deadlines
//!
//! The root always holds the earliest `execute_at`. Push and pop are O(log n).
//! `remove` finds its target with a linear scan, so it is O(n): fine for the
//! number of live interview sessions a single process holds, but a key→index
//! map would be needed for high key cardinality.
//!
//! The heap does not deduplicate keys. Callers renewing a key must `remove` it
//! before pushing the new deadline. Ordering among equal deadlines is
//! unspecified.

use tokio::time::Instant;

use crate::store::types::ScheduledExpiry;

#[derive(Debug, Default)]
pub struct MinHeapScheduler {
    heap: Vec<ScheduledExpiry>,
}

impl MinHeapScheduler {
    pub fn new() -> Self {
        Self { heap: Vec::new() }
    }

    /// Number of pending entries
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Schedules `key` to expire at `execute_at`
    pub fn push(&mut self, key: impl Into<String>, execute_at: Instant) {
        self.heap.push(ScheduledExpiry::new(key, execute_at));
        let last = self.heap.len() - 1;
        self.bubble_up(last);
    }

    /// Earliest pending entry without removing it
    pub fn peek(&self) -> Option<&ScheduledExpiry> {
        self.heap.first()
    }

    /// Removes and returns the earliest pending entry
    pub fn pop(&mut self) -> Option<ScheduledExpiry> {
        if self.heap.is_empty() {
            return None;
        }
        let last = self.heap.len() - 1;
        self.heap.swap(0, last);
        let root = self.heap.pop();
        if !self.heap.is_empty() {
            self.trickle_down(0);
        }
        root
    }

    /// Drops the entry for `key`, if any.
    ///
    /// Returns whether an entry was found. Unknown keys are a no-op.
    pub fn remove(&mut self, key: &str) -> bool {
        let Some(index) = self.heap.iter().position(|entry| entry.key == key) else {
            return false;
        };

        let last = self.heap.len() - 1;
        if index == last {
            self.heap.pop();
            return true;
        }

        self.heap.swap(index, last);
        self.heap.pop();
        // The moved element may belong above or below its new slot
        self.bubble_up(index);
        self.trickle_down(index);
        true
    }

    /// Returns true if an entry for `key` is pending
    pub fn contains(&self, key: &str) -> bool {
        self.heap.iter().any(|entry| entry.key == key)
    }

    fn bubble_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if self.heap[parent].execute_at <= self.heap[index].execute_at {
                break;
            }
            self.heap.swap(parent, index);
            index = parent;
        }
    }

    fn trickle_down(&mut self, mut index: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * index + 1;
            let right = left + 1;
            let mut smallest = index;

            if left < len && self.heap[left].execute_at < self.heap[smallest].execute_at {
                smallest = left;
            }
            if right < len && self.heap[right].execute_at < self.heap[smallest].execute_at {
                smallest = right;
            }
            if smallest == index {
                break;
            }
            self.heap.swap(index, smallest);
            index = smallest;
        }
    }
}

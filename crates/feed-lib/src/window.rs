//! Bounded FIFO of the most recent readings
//!
//! One window per ingestion loop. When an append would exceed the capacity,
//! the oldest entry is evicted first, so `len() <= capacity()` always holds.

use std::collections::VecDeque;

/// Fixed-capacity sliding window
#[derive(Debug, Clone)]
pub struct SlidingWindow<T> {
    buffer: VecDeque<T>,
    capacity: usize,
}

impl<T: Clone> SlidingWindow<T> {
    /// Create a window holding at most `capacity` entries (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: VecDeque::with_capacity(capacity.min(10_000)),
            capacity,
        }
    }

    /// Add an entry at the back, evicting from the front when full
    pub fn append(&mut self, item: T) {
        while self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(item);
    }

    /// Append entries in iteration order
    pub fn extend<I: IntoIterator<Item = T>>(&mut self, items: I) {
        for item in items {
            self.append(item);
        }
    }

    /// Current contents, oldest first
    pub fn snapshot(&self) -> Vec<T> {
        self.buffer.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buffer.iter()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

//! Fixed-capacity rolling window over the most recent observations.
//!
//! Circular buffer with overwrite-on-full semantics, optimized for a single
//! writer and a single reader. The logical sequence (oldest→newest) is
//! exposed either as up to two zero-copy slices over the backing storage or
//! materialized into a caller-owned buffer with at most two memcpys.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("window capacity must be positive")]
    InvalidCapacity,
    #[error("destination too small: needed {needed}, got {got}")]
    DestinationTooSmall { needed: usize, got: usize },
}

/// Fixed-size circular buffer holding the most recent `capacity` items.
///
/// Items are never removed individually; once full, each push overwrites the
/// oldest item. Not synchronized: single-writer / single-reader per instance,
/// with any fan-out handled at the queue boundary.
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
    items: Vec<T>,
    capacity: usize,
    start: usize,
}

impl<T> RollingWindow<T> {
    /// Creates a window with the given fixed capacity.
    ///
    /// A zero capacity is a configuration error; the pipeline must not start
    /// with one, so it is rejected here rather than surfacing on push.
    pub fn new(capacity: usize) -> Result<Self, WindowError> {
        if capacity == 0 {
            return Err(WindowError::InvalidCapacity);
        }
        Ok(Self {
            items: Vec::with_capacity(capacity),
            capacity,
            start: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of logically valid items (≤ capacity).
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True once the window has been filled to capacity at least once.
    /// Window-based computation is undefined before warmup.
    pub fn has_warmup(&self) -> bool {
        self.items.len() == self.capacity
    }

    /// Appends a value, overwriting the oldest item when full.
    pub fn push(&mut self, value: T) {
        if self.items.len() < self.capacity {
            self.items.push(value);
            return;
        }
        self.items[self.start] = value;
        self.start = (self.start + 1) % self.capacity;
    }

    /// Zero-copy view of the logical window as up to two contiguous slices.
    ///
    /// Iterating `left` fully then `right` fully yields the exact
    /// oldest→newest sequence; `right` is empty unless the buffer has
    /// wrapped. Does not allocate.
    pub fn segments(&self) -> (&[T], &[T]) {
        if !self.has_warmup() {
            // Not wrapped: items are contiguous from index 0.
            return (&self.items, &[]);
        }
        let (head, tail) = self.items.split_at(self.start);
        (tail, head)
    }

    /// Iterates the logical window oldest→newest without copying.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let (left, right) = self.segments();
        left.iter().chain(right.iter())
    }
}

impl<T: Copy> RollingWindow<T> {
    /// Materializes the logical window (oldest→newest) into `destination`
    /// and returns the number of items written.
    ///
    /// Performs at most two contiguous copies. Fails without writing anything
    /// when `destination` is shorter than `len()`.
    pub fn copy_into(&self, destination: &mut [T]) -> Result<usize, WindowError> {
        let count = self.items.len();
        if destination.len() < count {
            return Err(WindowError::DestinationTooSmall {
                needed: count,
                got: destination.len(),
            });
        }

        let (left, right) = self.segments();
        destination[..left.len()].copy_from_slice(left);
        destination[left.len()..count].copy_from_slice(right);
        Ok(count)
    }
}

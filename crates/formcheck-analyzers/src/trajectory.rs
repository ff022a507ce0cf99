//! Fixed-capacity history of a reference joint's positions, kept for
//! on-screen path drawing.

use formcheck_core::{Error, Point2D, Result};

/// Ring buffer over a preallocated arena: pushing beyond capacity
/// overwrites the oldest entry, and no reallocation happens after
/// construction.
#[derive(Debug, Clone)]
pub struct TrajectoryBuffer {
    arena: Vec<Point2D>,
    head: usize,
    capacity: usize,
}

impl TrajectoryBuffer {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::Config(
                "trajectory capacity must be at least 1".into(),
            ));
        }
        Ok(Self {
            arena: Vec::with_capacity(capacity),
            head: 0,
            capacity,
        })
    }

    pub fn push(&mut self, point: Point2D) {
        if self.arena.len() < self.capacity {
            self.arena.push(point);
        } else {
            self.arena[self.head] = point;
            self.head = (self.head + 1) % self.capacity;
        }
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.arena.clear();
        self.head = 0;
    }

    /// Iterate oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Point2D> {
        self.arena[self.head..].iter().chain(self.arena[..self.head].iter())
    }

    /// Chronological copy of the history, oldest first.
    pub fn snapshot(&self) -> Vec<Point2D> {
        self.iter().copied().collect()
    }
}

//! Bounded trajectory history

use crate::core::Position2D;
use std::collections::VecDeque;

/// Fixed-capacity FIFO of computed positions, oldest first
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryHistory {
    points: VecDeque<Position2D>,
    capacity: usize,
}

impl TrajectoryHistory {
    /// `capacity` must be non-zero; the engine validates this at startup.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a position, evicting and returning the oldest one when full
    pub fn push(&mut self, position: Position2D) -> Option<Position2D> {
        self.points.push_back(position);
        if self.points.len() > self.capacity {
            self.points.pop_front()
        } else {
            None
        }
    }

    pub fn latest(&self) -> Option<&Position2D> {
        self.points.back()
    }

    pub fn oldest(&self) -> Option<&Position2D> {
        self.points.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Position2D> {
        self.points.iter()
    }

    pub fn to_vec(&self) -> Vec<Position2D> {
        self.points.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

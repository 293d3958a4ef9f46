use crate::models::ActivityEvent;
use serde::Serialize;
use std::collections::VecDeque;

/// Bounded activity log. Newest entry first; the oldest is evicted once the
/// capacity is exceeded.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityLog {
    capacity: usize,
    entries: VecDeque<ActivityEvent>,
}

impl ActivityLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity + 1),
        }
    }

    pub fn push(&mut self, event: ActivityEvent) {
        self.entries.push_front(event);
        while self.entries.len() > self.capacity {
            self.entries.pop_back();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActivityEvent> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

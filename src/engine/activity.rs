use std::collections::VecDeque;

use crate::entity::ActivityEvent;

pub const DEFAULT_ACTIVITY_LIMIT: usize = 100;

/// Newest-first, bounded log of delete/restore events.
///
/// Recording never fails; once the limit is reached the oldest entry is
/// silently dropped.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    events: VecDeque<ActivityEvent>,
    limit: usize,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new(DEFAULT_ACTIVITY_LIMIT)
    }
}

impl ActivityLog {
    pub fn new(limit: usize) -> Self {
        Self {
            events: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    /// Rebuild from persisted events (newest first), trimming to `limit`.
    pub fn from_events(events: Vec<ActivityEvent>, limit: usize) -> Self {
        let mut log = Self::new(limit);
        log.events = events.into_iter().take(log.limit).collect();
        log
    }

    pub fn record(&mut self, event: ActivityEvent) {
        self.events.push_front(event);
        self.events.truncate(self.limit);
    }

    /// Events, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &ActivityEvent> {
        self.events.iter()
    }

    pub fn recent(&self, n: usize) -> Vec<ActivityEvent> {
        self.events.iter().take(n).cloned().collect()
    }

    pub fn to_vec(&self) -> Vec<ActivityEvent> {
        self.events.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

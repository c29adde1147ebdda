//! Click queue — tick-scoped buffer of click events.
//!
//! Events are appended by intake and drained in one batch by the broadcast
//! tick. The queue is capped so a burst between two ticks cannot grow it
//! without bound; overflow is dropped at push time.

use crate::protocol::ClickEvent;

/// Default per-tick cap on queued clicks.
pub const DEFAULT_CLICK_QUEUE_CAPACITY: usize = 4096;

#[derive(Debug)]
pub struct ClickQueue {
    events: Vec<ClickEvent>,
    limit: usize,
}

impl ClickQueue {
    #[must_use]
    pub fn with_capacity_limit(limit: usize) -> Self {
        Self { events: Vec::new(), limit }
    }

    /// Append an event. Returns `false` and drops it when the queue is full.
    #[must_use]
    pub fn push(&mut self, event: ClickEvent) -> bool {
        if self.events.len() >= self.limit {
            return false;
        }
        self.events.push(event);
        true
    }

    /// Take every queued event in arrival order, leaving the queue empty.
    pub fn drain_all(&mut self) -> Vec<ClickEvent> {
        std::mem::take(&mut self.events)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for ClickQueue {
    fn default() -> Self {
        Self::with_capacity_limit(DEFAULT_CLICK_QUEUE_CAPACITY)
    }
}

#[cfg(test)]
#[path = "clicks_test.rs"]
mod tests;

//! Single-threaded timer queue driven by a virtual clock.
//!
//! Timers are popped one at a time in deadline order, so callbacks never
//! overlap. Timers sharing a deadline fire in creation order.

use std::collections::{BTreeMap, HashMap};

/// Handle to a pending timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Entry<E> {
    /// Repeat period for intervals, `None` for one-shot timeouts.
    period_ms: Option<u64>,
    event: E,
}

/// Timer queue holding events of type `E`.
#[derive(Debug)]
pub struct Timers<E> {
    now_ms: u64,
    next_id: u64,
    queue: BTreeMap<(u64, TimerId), Entry<E>>,
    deadlines: HashMap<TimerId, u64>,
}

impl<E> Default for Timers<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Timers<E> {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            next_id: 0,
            queue: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }

    /// Current virtual time in milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Move the clock forward. The clock never goes backwards.
    pub fn advance_clock(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }

    /// Fire `event` every `period_ms`, first at `now + period_ms`.
    pub fn set_interval(&mut self, period_ms: u64, event: E) -> TimerId {
        let period_ms = period_ms.max(1);
        self.insert(self.now_ms.saturating_add(period_ms), Some(period_ms), event)
    }

    /// Fire `event` once, `delay_ms` from now.
    pub fn set_timeout(&mut self, delay_ms: u64, event: E) -> TimerId {
        self.insert(self.now_ms.saturating_add(delay_ms), None, event)
    }

    fn insert(&mut self, due_ms: u64, period_ms: Option<u64>, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.queue.insert((due_ms, id), Entry { period_ms, event });
        self.deadlines.insert(id, due_ms);
        id
    }

    /// Cancel a timer. Returns false if it already fired or was cleared.
    pub fn clear(&mut self, id: TimerId) -> bool {
        match self.deadlines.remove(&id) {
            Some(due_ms) => self.queue.remove(&(due_ms, id)).is_some(),
            None => false,
        }
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.deadlines.contains_key(&id)
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<u64> {
        self.queue.first_key_value().map(|(&(due_ms, _), _)| due_ms)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl<E: Clone> Timers<E> {
    /// Pop the earliest timer due at or before `until_ms`, moving the clock to
    /// its deadline. Intervals are re-armed one period later unless that
    /// would pass the end of time.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<(TimerId, E)> {
        let (&(due_ms, id), _) = self.queue.first_key_value()?;
        if due_ms > until_ms {
            return None;
        }
        let entry = self.queue.remove(&(due_ms, id))?;
        self.advance_clock(due_ms);

        match entry.period_ms.and_then(|period_ms| {
            due_ms.checked_add(period_ms).map(|next_ms| (period_ms, next_ms))
        }) {
            Some((period_ms, next_ms)) => {
                self.queue.insert(
                    (next_ms, id),
                    Entry {
                        period_ms: Some(period_ms),
                        event: entry.event.clone(),
                    },
                );
                self.deadlines.insert(id, next_ms);
            }
            None => {
                self.deadlines.remove(&id);
            }
        }
        Some((id, entry.event))
    }
}

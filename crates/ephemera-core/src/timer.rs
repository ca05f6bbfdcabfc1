//! Cancellable timer queue.
//!
//! Timers are ordered by `(deadline, id)`. Ids are handed out monotonically,
//! so timers sharing a deadline fire in the order they were scheduled. This
//! keeps chained timers (delivery, then read) strictly ordered even when a
//! test advances time past both deadlines in one step.

use std::collections::{BTreeMap, HashMap};

use crate::types::Timestamp;

/// Handle to a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

impl TimerId {
    /// Raw id value.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Deadline-ordered queue of timer payloads.
#[derive(Debug, Clone)]
pub struct TimerQueue<T> {
    queue: BTreeMap<(Timestamp, TimerId), T>,
    deadlines: HashMap<TimerId, Timestamp>,
    next_id: u64,
}

impl<T> TimerQueue<T> {
    /// Empty queue.
    pub fn new() -> Self {
        Self { queue: BTreeMap::new(), deadlines: HashMap::new(), next_id: 0 }
    }

    /// Schedule `payload` to fire at `deadline`.
    pub fn schedule(&mut self, deadline: Timestamp, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.queue.insert((deadline, id), payload);
        self.deadlines.insert(id, deadline);
        id
    }

    /// Cancel a pending timer, returning its payload.
    ///
    /// Unknown or already fired ids return `None`.
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        let deadline = self.deadlines.remove(&id)?;
        self.queue.remove(&(deadline, id))
    }

    /// Whether `id` is still pending.
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.deadlines.contains_key(&id)
    }

    /// Remove and return the earliest timer whose deadline is at or before
    /// `now`.
    pub fn pop_due(&mut self, now: Timestamp) -> Option<(TimerId, Timestamp, T)> {
        let (&(deadline, id), _) = self.queue.first_key_value()?;
        if deadline > now {
            return None;
        }
        let payload = self.queue.remove(&(deadline, id))?;
        self.deadlines.remove(&id);
        Some((id, deadline, payload))
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.queue.first_key_value().map(|(&(deadline, _), _)| deadline)
    }

    /// Number of pending timers.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether no timers are pending.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn pops_in_deadline_then_schedule_order() {
        let mut timers = TimerQueue::new();
        timers.schedule(Timestamp(30), "late");
        timers.schedule(Timestamp(10), "first");
        timers.schedule(Timestamp(10), "second");

        assert_eq!(timers.next_deadline(), Some(Timestamp(10)));
        assert_eq!(timers.pop_due(Timestamp(100)).map(|(_, _, p)| p), Some("first"));
        assert_eq!(timers.pop_due(Timestamp(100)).map(|(_, _, p)| p), Some("second"));
        assert_eq!(timers.pop_due(Timestamp(100)).map(|(_, _, p)| p), Some("late"));
        assert!(timers.is_empty());
    }

    #[test]
    fn nothing_due_before_deadline() {
        let mut timers = TimerQueue::new();
        timers.schedule(Timestamp(50), ());
        assert!(timers.pop_due(Timestamp(49)).is_none());
        assert!(timers.pop_due(Timestamp(50)).is_some());
    }

    #[test]
    fn cancel_removes_and_is_idempotent() {
        let mut timers = TimerQueue::new();
        let keep = timers.schedule(Timestamp(5), 1);
        let drop = timers.schedule(Timestamp(5), 2);

        assert_eq!(timers.cancel(drop), Some(2));
        assert_eq!(timers.cancel(drop), None);
        assert!(!timers.is_pending(drop));
        assert!(timers.is_pending(keep));
        assert_eq!(timers.len(), 1);

        let fired = timers.pop_due(Timestamp(5));
        assert_eq!(fired.map(|(id, _, p)| (id, p)), Some((keep, 1)));
        assert_eq!(timers.cancel(keep), None);
    }

    proptest! {
        #[test]
        fn drains_sorted_without_cancelled(
            deadlines in prop::collection::vec(0u64..50, 0..40),
            cancel_mask in prop::collection::vec(any::<bool>(), 40)
        ) {
            let mut timers = TimerQueue::new();
            let mut expected = Vec::new();
            for (index, deadline) in deadlines.iter().enumerate() {
                let id = timers.schedule(Timestamp(*deadline), index);
                if cancel_mask[index] {
                    prop_assert_eq!(timers.cancel(id), Some(index));
                } else {
                    expected.push((*deadline, index));
                }
            }
            expected.sort_unstable();

            let mut fired = Vec::new();
            while let Some((_, deadline, index)) = timers.pop_due(Timestamp(u64::MAX)) {
                fired.push((deadline.as_millis(), index));
            }

            prop_assert_eq!(fired, expected);
            prop_assert!(timers.is_empty());
        }
    }
}

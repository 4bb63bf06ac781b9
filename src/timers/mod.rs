//! Virtual-time timer queue.
//!
//! The queue never reads the wall clock. Time moves only when the owner calls
//! [`TimerQueue::pop_due`] with a target instant, which makes every schedule
//! reproducible under test. Timers fire in deadline order; timers sharing a
//! deadline fire in the order they were armed.
//!
//! Each armed timer is identified by a [`TimerId`] handle. Whoever arms a
//! timer owns its cancellation, and [`TimerQueue::len`] exposes the number of
//! live timers so leaks show up as a growing count.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Handle to an armed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// A timer that reached its deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<T> {
    pub id: TimerId,
    pub at: Duration,
    pub tag: T,
}

#[derive(Debug, Clone)]
struct Entry<T> {
    id: TimerId,
    period: Option<Duration>,
    tag: T,
}

type Slot = (Duration, u64);

#[derive(Debug, Clone)]
pub struct TimerQueue<T> {
    now: Duration,
    next_id: u64,
    next_seq: u64,
    queue: BTreeMap<Slot, Entry<T>>,
    slots: HashMap<TimerId, Slot>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            next_seq: 0,
            queue: BTreeMap::new(),
            slots: HashMap::new(),
        }
    }
}

impl<T: Clone> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time since the queue was created.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Arm a one-shot timer firing `delay` from now.
    pub fn schedule_once(&mut self, delay: Duration, tag: T) -> TimerId {
        self.arm(delay, None, tag)
    }

    /// Arm a timer firing every `period`, first at `now + period`.
    ///
    /// A zero period is bumped to one millisecond so the queue always makes
    /// progress.
    pub fn schedule_repeating(&mut self, period: Duration, tag: T) -> TimerId {
        let period = period.max(Duration::from_millis(1));
        self.arm(period, Some(period), tag)
    }

    /// Disarm `id`. Returns false when it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.slots.remove(&id) {
            Some(slot) => self.queue.remove(&slot).is_some(),
            None => false,
        }
    }

    pub fn is_armed(&self, id: TimerId) -> bool {
        self.slots.contains_key(&id)
    }

    /// Deadline of `id` if it is still armed.
    pub fn deadline(&self, id: TimerId) -> Option<Duration> {
        self.slots.get(&id).map(|(deadline, _)| *deadline)
    }

    /// Number of live timers.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Pop the earliest timer due at or before `until`, moving the clock to
    /// its deadline. Repeating timers are re-armed for their next period under
    /// the same id. When nothing is due the clock moves to `until` and `None`
    /// is returned.
    pub fn pop_due(&mut self, until: Duration) -> Option<Fired<T>> {
        let due = self
            .queue
            .first_key_value()
            .map(|(slot, _)| *slot)
            .filter(|(deadline, _)| *deadline <= until);

        let Some(slot) = due else {
            self.now = self.now.max(until);
            return None;
        };

        let entry = self.queue.remove(&slot)?;
        self.slots.remove(&entry.id);
        self.now = self.now.max(slot.0);

        if let Some(period) = entry.period {
            let next = (slot.0 + period, self.bump_seq());
            self.slots.insert(entry.id, next);
            self.queue.insert(next, entry.clone());
        }

        Some(Fired {
            id: entry.id,
            at: slot.0,
            tag: entry.tag,
        })
    }

    fn arm(&mut self, delay: Duration, period: Option<Duration>, tag: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let slot = (self.now + delay, self.bump_seq());
        self.slots.insert(id, slot);
        self.queue.insert(slot, Entry { id, period, tag });
        id
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}

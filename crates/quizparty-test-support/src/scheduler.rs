//! Manual scheduler: a `Scheduler` that never fires on its own.

use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use quizparty_core::clock::Clock;
use quizparty_core::scheduler::{Scheduler, TimerId, TimerIdSequence};

use crate::clock::ManualClock;

#[derive(Debug)]
struct Pending<T> {
    id: TimerId,
    due: DateTime<Utc>,
    payload: T,
}

/// A scheduler that records requests against a [`ManualClock`]. Tests pull
/// due deliveries with [`ManualScheduler::next_due`] and feed them to the code
/// under test themselves.
#[derive(Debug)]
pub struct ManualScheduler<T> {
    clock: ManualClock,
    ids: TimerIdSequence,
    pending: Mutex<Vec<Pending<T>>>,
}

impl<T: Clone> ManualScheduler<T> {
    /// Creates a scheduler measuring delays against `clock`.
    #[must_use]
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            ids: TimerIdSequence::new(),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Number of deliveries still pending.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// Payloads of all pending deliveries, earliest first.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn pending_payloads(&self) -> Vec<T> {
        let pending = self.pending.lock().unwrap();
        let mut entries: Vec<&Pending<T>> = pending.iter().collect();
        entries.sort_by_key(|p| (p.due, p.id));
        entries.iter().map(|p| p.payload.clone()).collect()
    }

    /// Removes and returns the earliest delivery due at or before `until`.
    /// The clock is moved to the delivery's due time.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn next_due(&self, until: DateTime<Utc>) -> Option<(TimerId, T)> {
        let mut pending = self.pending.lock().unwrap();
        let position = pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due <= until)
            .min_by_key(|(_, p)| (p.due, p.id))
            .map(|(i, _)| i)?;
        let entry = pending.remove(position);
        if entry.due > self.clock.now() {
            self.clock.set(entry.due);
        }
        Some((entry.id, entry.payload))
    }
}

impl<T: Clone + Send> Scheduler<T> for ManualScheduler<T> {
    fn schedule(&self, delay: Duration, payload: T) -> TimerId {
        let id = self.ids.next_id();
        let due = self
            .clock
            .now()
            .checked_add_signed(TimeDelta::from_std(delay).unwrap_or(TimeDelta::MAX))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.pending.lock().unwrap().push(Pending { id, due, payload });
        id
    }

    fn cancel(&self, id: TimerId) {
        self.pending.lock().unwrap().retain(|p| p.id != id);
    }
}

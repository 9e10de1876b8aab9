//! Cancellable delayed actions.
//!
//! State machines never sleep. They ask a [`Scheduler`] to deliver a payload
//! back to them after a delay, and keep the returned [`TimerId`] so the
//! request can be cancelled or a late delivery recognised as stale.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Identifier of one scheduled delivery. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    /// Wraps a raw id. Schedulers should use [`TimerIdSequence`] instead.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

/// Monotonic source of [`TimerId`]s.
#[derive(Debug, Default)]
pub struct TimerIdSequence(AtomicU64);

impl TimerIdSequence {
    /// Creates a sequence starting at 1.
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Returns the next unused id.
    pub fn next_id(&self) -> TimerId {
        TimerId(self.0.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

/// Delivers `payload` back to its owner after `delay` unless cancelled.
pub trait Scheduler<T>: Send + Sync {
    /// Schedules a delivery and returns its id.
    fn schedule(&self, delay: Duration, payload: T) -> TimerId;

    /// Cancels a pending delivery. Unknown or already fired ids are ignored.
    fn cancel(&self, id: TimerId);
}

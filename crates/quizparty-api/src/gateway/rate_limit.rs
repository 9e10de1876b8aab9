//! Per-connection sliding-window rate limiting.

use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

/// Allows at most `limit` events in any window of `window` length.
#[derive(Debug, Clone)]
pub struct SlidingWindowLimiter {
    limit: usize,
    window: TimeDelta,
    accepted: VecDeque<DateTime<Utc>>,
}

impl SlidingWindowLimiter {
    #[must_use]
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            limit,
            window: TimeDelta::from_std(window).unwrap_or(TimeDelta::MAX),
            accepted: VecDeque::with_capacity(limit),
        }
    }

    /// A limiter allowing `limit` events per minute.
    #[must_use]
    pub fn per_minute(limit: usize) -> Self {
        Self::new(limit, Duration::from_secs(60))
    }

    /// Records an event at `now` if the window has room. Rejected events are
    /// not counted.
    pub fn try_acquire(&mut self, now: DateTime<Utc>) -> bool {
        while let Some(oldest) = self.accepted.front() {
            if now - *oldest >= self.window {
                self.accepted.pop_front();
            } else {
                break;
            }
        }
        if self.accepted.len() >= self.limit {
            return false;
        }
        self.accepted.push_back(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_fifty_first_event_in_a_minute_is_dropped() {
        // Arrange
        let mut limiter = SlidingWindowLimiter::per_minute(50);
        let now = start();

        // Act
        let accepted = (0..50)
            .filter(|i| limiter.try_acquire(now + TimeDelta::milliseconds(i * 100)))
            .count();
        let fifty_first = limiter.try_acquire(now + TimeDelta::seconds(30));

        // Assert
        assert_eq!(accepted, 50);
        assert!(!fifty_first);
    }

    #[test]
    fn test_window_slides() {
        let mut limiter = SlidingWindowLimiter::per_minute(2);
        let now = start();
        assert!(limiter.try_acquire(now));
        assert!(limiter.try_acquire(now + TimeDelta::seconds(10)));
        assert!(!limiter.try_acquire(now + TimeDelta::seconds(59)));

        assert!(limiter.try_acquire(now + TimeDelta::seconds(60)));
        assert!(!limiter.try_acquire(now + TimeDelta::seconds(61)));
        assert!(limiter.try_acquire(now + TimeDelta::seconds(70)));
    }
}

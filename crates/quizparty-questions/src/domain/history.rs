//! Bounded, recency-ordered set of recently played question ids.

use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, Utc};
use quizparty_core::repository::HistorySnapshot;

/// Default number of ids remembered.
pub const DEFAULT_HISTORY_CAPACITY: usize = 200;

/// Recently used question ids, oldest first. Adding an id that is already
/// present moves it to the most-recent end; exceeding the capacity evicts
/// from the oldest end.
#[derive(Debug, Clone)]
pub struct UsageHistory {
    capacity: usize,
    order: VecDeque<String>,
    members: HashSet<String>,
}

impl UsageHistory {
    /// Creates an empty history holding at most `capacity` ids.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            members: HashSet::with_capacity(capacity),
        }
    }

    /// Rebuilds a history from a persisted snapshot, keeping the newest ids
    /// if the snapshot is larger than `capacity`.
    #[must_use]
    pub fn from_snapshot(capacity: usize, snapshot: &HistorySnapshot) -> Self {
        let mut history = Self::new(capacity);
        history.record(snapshot.used_question_ids.iter().cloned());
        history
    }

    /// Number of remembered ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing is remembered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Whether `id` was used recently.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    /// Remembered ids, oldest first.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Set view of the remembered ids.
    #[must_use]
    pub fn id_set(&self) -> HashSet<&str> {
        self.members.iter().map(String::as_str).collect()
    }

    /// Unions `ids` into the history. Returns whether anything changed.
    pub fn record<I>(&mut self, ids: I) -> bool
    where
        I: IntoIterator<Item = String>,
    {
        let mut changed = false;
        for id in ids {
            if self.members.contains(&id) {
                if self.order.back() != Some(&id) {
                    self.order.retain(|existing| existing != &id);
                    self.order.push_back(id);
                    changed = true;
                }
            } else {
                self.members.insert(id.clone());
                self.order.push_back(id);
                changed = true;
            }
        }
        while self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.members.remove(&evicted);
            }
        }
        changed
    }

    /// Forgets everything except the `keep` most recent ids. Returns whether
    /// anything was dropped.
    pub fn retain_recent(&mut self, keep: usize) -> bool {
        if self.order.len() <= keep {
            return false;
        }
        let drop = self.order.len() - keep;
        for evicted in self.order.drain(..drop) {
            self.members.remove(&evicted);
        }
        true
    }

    /// Snapshot for persistence.
    #[must_use]
    pub fn snapshot(&self, now: DateTime<Utc>) -> HistorySnapshot {
        HistorySnapshot {
            used_question_ids: self.order.iter().cloned().collect(),
            last_updated: now,
        }
    }
}

impl Default for UsageHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ids(range: std::ops::Range<u32>) -> Vec<String> {
        range.map(|i| format!("q{i}")).collect()
    }

    #[test]
    fn test_record_evicts_oldest_beyond_capacity() {
        let mut history = UsageHistory::new(3);

        history.record(ids(0..5));

        assert_eq!(history.ids().collect::<Vec<_>>(), vec!["q2", "q3", "q4"]);
        assert!(!history.contains("q0"));
        assert!(!history.contains("q1"));
    }

    #[test]
    fn test_record_is_a_set_union_that_refreshes_recency() {
        let mut history = UsageHistory::new(10);
        history.record(ids(0..3));

        let changed = history.record(vec!["q0".to_owned(), "q9".to_owned()]);

        assert!(changed);
        assert_eq!(history.len(), 4);
        assert_eq!(history.ids().collect::<Vec<_>>(), vec!["q1", "q2", "q0", "q9"]);
    }

    #[test]
    fn test_record_of_most_recent_id_is_not_a_change() {
        let mut history = UsageHistory::new(10);
        history.record(ids(0..2));

        assert!(!history.record(vec!["q1".to_owned()]));
    }

    #[test]
    fn test_retain_recent_keeps_tail() {
        let mut history = UsageHistory::new(100);
        history.record(ids(0..60));

        assert!(history.retain_recent(50));

        assert_eq!(history.len(), 50);
        assert!(!history.contains("q9"));
        assert!(history.contains("q10"));
        assert!(!history.retain_recent(50));
    }

    #[test]
    fn test_snapshot_round_trip_preserves_membership() {
        let mut history = UsageHistory::new(200);
        history.record(ids(0..20));
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();

        let restored = UsageHistory::from_snapshot(200, &history.snapshot(now));

        assert_eq!(restored.id_set(), history.id_set());
    }
}

//! Process-wide usage history with write-through persistence.
//!
//! Reads come from the in-memory [`UsageHistory`]; every mutation is saved
//! as a whole snapshot through the injected [`HistoryRepository`]. The lock
//! is held across the save, so concurrent commits are serialised and the
//! last write always contains the union of all of them.

use std::sync::Arc;

use quizparty_core::clock::Clock;
use quizparty_core::repository::{HistoryRepository, HistorySnapshot};
use quizparty_core::rng::DeterministicRng;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::application::selector::{SelectorConfig, select_fresh};
use crate::domain::corpus::QuestionCorpus;
use crate::domain::history::UsageHistory;
use crate::domain::question::Question;

/// Shared, persisted usage history.
pub struct UsageHistoryStore {
    history: Mutex<UsageHistory>,
    repository: Arc<dyn HistoryRepository>,
    clock: Arc<dyn Clock>,
    selector: SelectorConfig,
}

impl UsageHistoryStore {
    /// Loads the persisted history. A missing, unreadable or corrupt file is
    /// logged and treated as an empty history.
    pub async fn open(
        capacity: usize,
        selector: SelectorConfig,
        repository: Arc<dyn HistoryRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let history = match repository.load().await {
            Ok(Some(snapshot)) => UsageHistory::from_snapshot(capacity, &snapshot),
            Ok(None) => UsageHistory::new(capacity),
            Err(e) => {
                warn!(error = %e, "usage history unavailable, starting empty");
                UsageHistory::new(capacity)
            }
        };
        debug!(remembered = history.len(), "usage history loaded");

        Self {
            history: Mutex::new(history),
            repository,
            clock,
            selector,
        }
    }

    /// Picks up to `count` questions not played recently. See
    /// [`select_fresh`] for the fallback rules.
    pub async fn select_fresh(
        &self,
        corpus: &QuestionCorpus,
        count: usize,
        rng: &mut dyn DeterministicRng,
    ) -> Vec<Arc<Question>> {
        let mut history = self.history.lock().await;
        let selection = select_fresh(corpus, &mut history, count, self.selector, rng);
        if selection.compacted {
            debug!(remaining = history.len(), "usage history compacted");
            self.persist(&history).await;
        }
        selection.questions
    }

    /// Records `ids` as played and persists the result.
    pub async fn commit<I>(&self, ids: I)
    where
        I: IntoIterator<Item = String> + Send,
        I::IntoIter: Send,
    {
        let mut history = self.history.lock().await;
        if history.record(ids) {
            self.persist(&history).await;
        }
    }

    /// Current in-memory snapshot.
    pub async fn snapshot(&self) -> HistorySnapshot {
        self.history.lock().await.snapshot(self.clock.now())
    }

    /// Number of remembered ids.
    pub async fn len(&self) -> usize {
        self.history.lock().await.len()
    }

    /// Whether nothing is remembered.
    pub async fn is_empty(&self) -> bool {
        self.history.lock().await.is_empty()
    }

    async fn persist(&self, history: &UsageHistory) {
        let snapshot = history.snapshot(self.clock.now());
        if let Err(e) = self.repository.save(&snapshot).await {
            warn!(error = %e, "failed to persist usage history");
        }
    }
}

impl std::fmt::Debug for UsageHistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsageHistoryStore")
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::domain::question::Question;
    use quizparty_test_support::{
        FailingHistoryRepository, InMemoryHistoryRepository, ManualClock, MockRng,
    };

    fn corpus(n: usize) -> QuestionCorpus {
        let questions = (0..n)
            .map(|i| Question {
                id: format!("q{i}"),
                text: format!("Question {i}?"),
                answers: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                correct: 0,
                category: "general".to_owned(),
                explanation: None,
                image: None,
                source: None,
            })
            .collect();
        QuestionCorpus::build(vec![], questions).unwrap()
    }

    async fn open_store(repo: Arc<dyn HistoryRepository>) -> UsageHistoryStore {
        UsageHistoryStore::open(
            200,
            SelectorConfig::default(),
            repo,
            Arc::new(ManualClock::at_default_epoch()),
        )
        .await
    }

    #[tokio::test]
    async fn test_commit_persists_union() {
        // Arrange
        let repo = Arc::new(InMemoryHistoryRepository::default());
        let store = open_store(repo.clone()).await;

        // Act
        store.commit(vec!["q1".to_owned(), "q2".to_owned()]).await;
        store.commit(vec!["q2".to_owned(), "q3".to_owned()]).await;

        // Assert
        let stored = repo.stored().unwrap();
        let ids: HashSet<String> = stored.used_question_ids.into_iter().collect();
        assert_eq!(ids.len(), 3);
        assert!(ids.contains("q1") && ids.contains("q2") && ids.contains("q3"));
        assert_eq!(repo.save_count(), 2);
    }

    #[tokio::test]
    async fn test_reopen_restores_membership() {
        let repo = Arc::new(InMemoryHistoryRepository::default());
        let store = open_store(repo.clone()).await;
        store.commit((0..30).map(|i| format!("q{i}"))).await;
        let before: HashSet<String> = store.snapshot().await.used_question_ids.into_iter().collect();

        let reopened = open_store(repo).await;

        let after: HashSet<String> = reopened
            .snapshot()
            .await
            .used_question_ids
            .into_iter()
            .collect();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_failing_repository_is_not_fatal() {
        let store = open_store(Arc::new(FailingHistoryRepository)).await;

        store.commit(vec!["q1".to_owned()]).await;

        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_selection_does_not_record_usage() {
        let repo = Arc::new(InMemoryHistoryRepository::default());
        let store = open_store(repo.clone()).await;

        let deck = store.select_fresh(&corpus(40), 10, &mut MockRng).await;

        assert_eq!(deck.len(), 10);
        assert!(store.is_empty().await);
        assert_eq!(repo.save_count(), 0);
    }
}

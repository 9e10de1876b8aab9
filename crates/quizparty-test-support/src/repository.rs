//! Test repositories: mock `HistoryRepository` implementations for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use quizparty_core::error::DomainError;
use quizparty_core::repository::{HistoryRepository, HistorySnapshot};

/// A history repository that keeps the last saved snapshot in memory and
/// counts saves.
#[derive(Debug, Default)]
pub struct InMemoryHistoryRepository {
    stored: Mutex<Option<HistorySnapshot>>,
    saves: Mutex<usize>,
}

impl InMemoryHistoryRepository {
    /// Creates a repository pre-loaded with `snapshot`.
    #[must_use]
    pub fn with_snapshot(snapshot: HistorySnapshot) -> Self {
        Self {
            stored: Mutex::new(Some(snapshot)),
            saves: Mutex::new(0),
        }
    }

    /// Returns the last saved snapshot.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn stored(&self) -> Option<HistorySnapshot> {
        self.stored.lock().unwrap().clone()
    }

    /// Number of `save` calls so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

#[async_trait]
impl HistoryRepository for InMemoryHistoryRepository {
    async fn load(&self) -> Result<Option<HistorySnapshot>, DomainError> {
        Ok(self.stored.lock().unwrap().clone())
    }

    async fn save(&self, snapshot: &HistorySnapshot) -> Result<(), DomainError> {
        *self.stored.lock().unwrap() = Some(snapshot.clone());
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }
}

/// A history repository that always returns a persistence error. Useful for
/// testing that gameplay survives an unwritable history file.
#[derive(Debug)]
pub struct FailingHistoryRepository;

#[async_trait]
impl HistoryRepository for FailingHistoryRepository {
    async fn load(&self) -> Result<Option<HistorySnapshot>, DomainError> {
        Err(DomainError::Persistence("disk unavailable".into()))
    }

    async fn save(&self, _snapshot: &HistorySnapshot) -> Result<(), DomainError> {
        Err(DomainError::Persistence("disk unavailable".into()))
    }
}

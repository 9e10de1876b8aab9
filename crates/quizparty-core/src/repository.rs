//! Usage history persistence port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Persisted layout of the used-question history.
///
/// Serialized as `{"usedQuestionIds": [...], "lastUpdated": "<ISO8601>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySnapshot {
    /// Question ids, oldest first.
    pub used_question_ids: Vec<String>,
    /// When the snapshot was taken.
    pub last_updated: DateTime<Utc>,
}

/// Repository trait for loading and replacing the usage history.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Loads the last persisted snapshot, or `None` when nothing was saved.
    async fn load(&self) -> Result<Option<HistorySnapshot>, DomainError>;

    /// Replaces the persisted snapshot as a whole.
    async fn save(&self, snapshot: &HistorySnapshot) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_snapshot_serializes_with_camel_case_keys() {
        let snapshot = HistorySnapshot {
            used_question_ids: vec!["geo_1".to_owned(), "hist_2".to_owned()],
            last_updated: Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
        };

        let json = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(json["usedQuestionIds"][0], "geo_1");
        assert_eq!(json["lastUpdated"], "2026-01-15T10:00:00Z");
    }
}

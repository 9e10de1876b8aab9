//! Integration tests for `JsonHistoryRepository`.

use chrono::{TimeZone, Utc};
use quizparty_core::error::DomainError;
use quizparty_core::repository::{HistoryRepository, HistorySnapshot};
use quizparty_history_store::json_history_repository::JsonHistoryRepository;

fn snapshot(ids: &[&str]) -> HistorySnapshot {
    HistorySnapshot {
        used_question_ids: ids.iter().map(|s| (*s).to_owned()).collect(),
        last_updated: Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
    }
}

// --- load ---

#[tokio::test]
async fn test_load_returns_none_when_file_missing() {
    let dir = tempfile::tempdir().unwrap();
    let repo = JsonHistoryRepository::new(dir.path().join("used-questions.json"));

    let loaded = repo.load().await.unwrap();

    assert!(loaded.is_none());
}

#[tokio::test]
async fn test_load_returns_none_for_blank_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("used-questions.json");
    std::fs::write(&path, "  \n").unwrap();
    let repo = JsonHistoryRepository::new(path);

    assert!(repo.load().await.unwrap().is_none());
}

#[tokio::test]
async fn test_load_reports_corrupt_file_as_persistence_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("used-questions.json");
    std::fs::write(&path, "{\"usedQuestionIds\": [").unwrap();
    let repo = JsonHistoryRepository::new(path);

    let result = repo.load().await;

    assert!(matches!(result, Err(DomainError::Persistence(_))));
}

// --- save + load round-trip ---

#[tokio::test]
async fn test_save_then_load_preserves_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let repo = JsonHistoryRepository::new(dir.path().join("data").join("used-questions.json"));
    let original = snapshot(&["geo_1", "hist_4", "sport_9"]);

    repo.save(&original).await.unwrap();
    let loaded = repo.load().await.unwrap().unwrap();

    assert_eq!(loaded, original);
}

#[tokio::test]
async fn test_save_writes_documented_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("used-questions.json");
    let repo = JsonHistoryRepository::new(&path);

    repo.save(&snapshot(&["a", "b"])).await.unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["usedQuestionIds"], serde_json::json!(["a", "b"]));
    assert_eq!(raw["lastUpdated"], "2026-01-15T10:00:00Z");
}

#[tokio::test]
async fn test_save_replaces_whole_file_and_leaves_no_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("used-questions.json");
    let repo = JsonHistoryRepository::new(&path);

    repo.save(&snapshot(&["a", "b", "c", "d"])).await.unwrap();
    repo.save(&snapshot(&["z"])).await.unwrap();

    let loaded = repo.load().await.unwrap().unwrap();
    assert_eq!(loaded.used_question_ids, vec!["z"]);
    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(leftovers.len(), 1);
}

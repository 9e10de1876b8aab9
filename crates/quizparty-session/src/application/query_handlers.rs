//! Query handlers for the session context.
//!
//! These read the registry or the corpus and return read-only view DTOs.

use chrono::{DateTime, Utc};
use quizparty_core::error::DomainError;
use quizparty_questions::domain::corpus::{CorpusStats, QuestionCorpus};
use serde::Serialize;

use crate::application::registry::SessionRegistry;
use crate::domain::code::SessionCode;
use crate::domain::events::SessionStatus;
use crate::domain::game_session::GameSession;
use crate::domain::player::PlayerView;
use crate::domain::settings::{GameSettings, SessionTimings};

/// Response to a successful session creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionCreated {
    pub code: SessionCode,
    pub status: SessionStatus,
}

/// Read-only view of an active session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub code: SessionCode,
    pub status: SessionStatus,
    pub player_count: usize,
    pub players: Vec<PlayerView>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    /// Index of the next question to be asked.
    pub current_question: usize,
    pub total_questions: usize,
    pub settings: GameSettings,
}

impl From<&GameSession> for SessionView {
    fn from(session: &GameSession) -> Self {
        Self {
            code: session.code().clone(),
            status: session.status(),
            player_count: session.players().len(),
            players: session.player_views(),
            created_at: session.created_at(),
            last_activity: session.last_activity(),
            current_question: session.current_index(),
            total_questions: session.total_questions(),
            settings: session.settings(),
        }
    }
}

/// Game parameters advertised alongside corpus stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSettingsInfo {
    pub rounds: u32,
    pub questions_per_round: u32,
    /// Seconds per question.
    pub time_per_question: u64,
    /// Category display names.
    pub categories: Vec<String>,
}

/// Corpus statistics plus the default game layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionStatsView {
    #[serde(flatten)]
    pub corpus: CorpusStats,
    pub game_settings: GameSettingsInfo,
}

/// Looks up an active session.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if no session uses `code`.
pub fn get_session(code: &SessionCode, registry: &SessionRegistry) -> Result<SessionView, DomainError> {
    registry
        .get(code)
        .map(SessionView::from)
        .ok_or_else(|| DomainError::NotFound(format!("session {code}")))
}

/// Summarises the corpus and the default settings.
#[must_use]
pub fn question_stats(
    corpus: &QuestionCorpus,
    defaults: GameSettings,
    timings: &SessionTimings,
) -> QuestionStatsView {
    let stats = corpus.stats();
    let categories = stats.categories.values().map(|c| c.name.clone()).collect();
    QuestionStatsView {
        corpus: stats,
        game_settings: GameSettingsInfo {
            rounds: defaults.rounds(),
            questions_per_round: defaults.questions_per_round(),
            time_per_question: timings.question_time_limit.as_secs(),
            categories,
        },
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::test_fixtures::{code, corpus};

    #[test]
    fn test_get_session_returns_view() {
        // Arrange
        let created = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        let mut registry = SessionRegistry::new();
        registry.insert(GameSession::new(
            code("4821"),
            GameSettings::default(),
            Vec::new(),
            created,
        ));

        // Act
        let view = get_session(&code("4821"), &registry).unwrap();

        // Assert
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["code"], "4821");
        assert_eq!(json["status"], "lobby");
        assert_eq!(json["playerCount"], 0);
        assert_eq!(json["createdAt"], "2026-01-15T10:00:00Z");
    }

    #[test]
    fn test_get_session_unknown_code_is_not_found() {
        let registry = SessionRegistry::new();

        let result = get_session(&code("1234"), &registry);

        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }

    #[test]
    fn test_question_stats_flattens_corpus_and_settings() {
        let view = question_stats(&corpus(3), GameSettings::default(), &SessionTimings::default());

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["totalQuestions"], 3);
        assert_eq!(json["totalCategories"], 1);
        assert_eq!(json["categories"]["general"]["count"], 3);
        assert_eq!(json["gameSettings"]["timePerQuestion"], 15);
        assert_eq!(json["gameSettings"]["categories"][0], "General");
    }
}

//! Game settings chosen by the host and the fixed phase timings.

use std::time::Duration;

use quizparty_core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Allowed number of rounds.
pub const ROUNDS_RANGE: std::ops::RangeInclusive<u32> = 1..=10;
/// Allowed number of questions per round.
pub const QUESTIONS_PER_ROUND_RANGE: std::ops::RangeInclusive<u32> = 1..=20;

const DEFAULT_ROUNDS: u32 = 5;
const DEFAULT_QUESTIONS_PER_ROUND: u32 = 5;

/// Validated round layout for one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSettings {
    rounds: u32,
    questions_per_round: u32,
}

impl GameSettings {
    /// Builds settings, checking both bounds.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if either value is out of range.
    pub fn new(rounds: u32, questions_per_round: u32) -> Result<Self, DomainError> {
        if !ROUNDS_RANGE.contains(&rounds) {
            return Err(DomainError::Validation(format!(
                "rounds must be between {} and {}",
                ROUNDS_RANGE.start(),
                ROUNDS_RANGE.end()
            )));
        }
        if !QUESTIONS_PER_ROUND_RANGE.contains(&questions_per_round) {
            return Err(DomainError::Validation(format!(
                "questionsPerRound must be between {} and {}",
                QUESTIONS_PER_ROUND_RANGE.start(),
                QUESTIONS_PER_ROUND_RANGE.end()
            )));
        }
        Ok(Self {
            rounds,
            questions_per_round,
        })
    }

    #[must_use]
    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    #[must_use]
    pub fn questions_per_round(&self) -> u32 {
        self.questions_per_round
    }

    /// Deck size requested by these settings.
    #[must_use]
    pub fn total_questions(&self) -> usize {
        (self.rounds * self.questions_per_round) as usize
    }
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            rounds: DEFAULT_ROUNDS,
            questions_per_round: DEFAULT_QUESTIONS_PER_ROUND,
        }
    }
}

/// Optional overrides sent with `start-game`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRequest {
    pub rounds: Option<u32>,
    pub questions_per_round: Option<u32>,
}

impl SettingsRequest {
    /// Whether the request overrides anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rounds.is_none() && self.questions_per_round.is_none()
    }

    /// Applies the overrides on top of `base`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if a supplied value is out of range.
    pub fn resolve(&self, base: GameSettings) -> Result<GameSettings, DomainError> {
        GameSettings::new(
            self.rounds.unwrap_or(base.rounds),
            self.questions_per_round.unwrap_or(base.questions_per_round),
        )
    }
}

/// Durations of every timed phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimings {
    /// Pause between `game-started` and the first question.
    pub intro_delay: Duration,
    /// Time players have to answer.
    pub question_time_limit: Duration,
    /// Pause after a question resolves inside a round.
    pub result_pause: Duration,
    /// Pause after the last question of a round.
    pub round_pause: Duration,
    /// How long a finished session lingers before it removes itself.
    pub finish_grace: Duration,
    /// Inactivity after which a session removes itself.
    pub idle_timeout: Duration,
}

impl Default for SessionTimings {
    fn default() -> Self {
        Self {
            intro_delay: Duration::from_secs(2),
            question_time_limit: Duration::from_secs(15),
            result_pause: Duration::from_secs(3),
            round_pause: Duration::from_secs(10),
            finish_grace: Duration::from_secs(5 * 60),
            idle_timeout: Duration::from_secs(30 * 60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_five_by_five() {
        let settings = GameSettings::default();
        assert_eq!(settings.rounds(), 5);
        assert_eq!(settings.questions_per_round(), 5);
        assert_eq!(settings.total_questions(), 25);
    }

    #[test]
    fn test_bounds_are_enforced() {
        assert!(GameSettings::new(0, 5).is_err());
        assert!(GameSettings::new(11, 5).is_err());
        assert!(GameSettings::new(5, 0).is_err());
        assert!(GameSettings::new(5, 21).is_err());
        assert!(GameSettings::new(10, 20).is_ok());
    }

    #[test]
    fn test_partial_request_keeps_base_values() {
        // Arrange
        let request = SettingsRequest {
            rounds: Some(2),
            questions_per_round: None,
        };

        // Act
        let settings = request.resolve(GameSettings::default()).unwrap();

        // Assert
        assert_eq!(settings, GameSettings::new(2, 5).unwrap());
    }

    #[test]
    fn test_request_deserializes_camel_case() {
        let request: SettingsRequest =
            serde_json::from_str(r#"{"rounds":1,"questionsPerRound":2}"#).unwrap();
        assert_eq!(request.questions_per_round, Some(2));
        assert!(!request.is_empty());
    }
}

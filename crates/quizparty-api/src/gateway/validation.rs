//! Field-level validation of inbound WebSocket payloads.
//!
//! Payload fields arrive as loose JSON values; each helper either produces a
//! typed value or a `DomainError::Validation` naming the field.

use quizparty_core::error::DomainError;
use quizparty_questions::domain::question::ANSWER_COUNT;
use quizparty_session::domain::code::SessionCode;
use quizparty_session::domain::player::{Avatar, PlayerId, PlayerName};
use quizparty_session::domain::settings::{
    QUESTIONS_PER_ROUND_RANGE, ROUNDS_RANGE, SettingsRequest,
};
use serde_json::Value;

fn invalid(message: impl Into<String>) -> DomainError {
    DomainError::Validation(message.into())
}

fn required<'a>(value: Option<&'a Value>, field: &str) -> Result<&'a Value, DomainError> {
    match value {
        None | Some(Value::Null) => Err(invalid(format!("{field} is required"))),
        Some(value) => Ok(value),
    }
}

fn text<'a>(value: Option<&'a Value>, field: &str) -> Result<&'a str, DomainError> {
    required(value, field)?
        .as_str()
        .ok_or_else(|| invalid(format!("{field} must be a string")))
}

/// A four-digit session code, given as a string or a number.
pub fn session_code(value: Option<&Value>) -> Result<SessionCode, DomainError> {
    match required(value, "code")? {
        Value::String(raw) => SessionCode::parse(raw),
        Value::Number(number) => SessionCode::parse(&number.to_string()),
        _ => Err(invalid("invalid session code format")),
    }
}

pub fn player_name(value: Option<&Value>) -> Result<PlayerName, DomainError> {
    PlayerName::parse(text(value, "name")?)
}

pub fn avatar(value: Option<&Value>) -> Result<Avatar, DomainError> {
    Avatar::parse(text(value, "avatar")?)
}

pub fn player_id(value: Option<&Value>) -> Result<PlayerId, DomainError> {
    PlayerId::parse(text(value, "playerId")?)
}

/// An answer index in `0..ANSWER_COUNT`.
pub fn answer_index(value: Option<&Value>) -> Result<usize, DomainError> {
    required(value, "answer")?
        .as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .filter(|n| *n < ANSWER_COUNT)
        .ok_or_else(|| {
            invalid(format!(
                "answer must be an integer between 0 and {}",
                ANSWER_COUNT - 1
            ))
        })
}

/// Optional `{rounds, questionsPerRound}` overrides, each bounds-checked.
pub fn settings(value: Option<&Value>) -> Result<SettingsRequest, DomainError> {
    let object = match value {
        None | Some(Value::Null) => return Ok(SettingsRequest::default()),
        Some(Value::Object(object)) => object,
        Some(_) => return Err(invalid("settings must be an object")),
    };
    Ok(SettingsRequest {
        rounds: bounded(object.get("rounds"), "rounds", &ROUNDS_RANGE)?,
        questions_per_round: bounded(
            object.get("questionsPerRound"),
            "questionsPerRound",
            &QUESTIONS_PER_ROUND_RANGE,
        )?,
    })
}

fn bounded(
    value: Option<&Value>,
    field: &str,
    range: &std::ops::RangeInclusive<u32>,
) -> Result<Option<u32>, DomainError> {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return Ok(None);
    };
    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .filter(|n| range.contains(n))
        .map(Some)
        .ok_or_else(|| {
            invalid(format!(
                "{field} must be an integer between {} and {}",
                range.start(),
                range.end()
            ))
        })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_session_code_accepts_string_or_number() {
        assert_eq!(session_code(Some(&json!("4821"))).unwrap().as_str(), "4821");
        assert_eq!(session_code(Some(&json!(4821))).unwrap().as_str(), "4821");
    }

    #[test]
    fn test_session_code_rejects_malformed_values() {
        assert!(session_code(None).is_err());
        assert!(session_code(Some(&json!("48a1"))).is_err());
        assert!(session_code(Some(&json!(999))).is_err());
        assert!(session_code(Some(&json!(["4821"]))).is_err());
    }

    #[test]
    fn test_answer_index_bounds() {
        assert_eq!(answer_index(Some(&json!(3))).unwrap(), 3);
        assert!(answer_index(Some(&json!(4))).is_err());
        assert!(answer_index(Some(&json!(-1))).is_err());
        assert!(answer_index(Some(&json!(1.5))).is_err());
        assert!(answer_index(Some(&json!("1"))).is_err());
    }

    #[test]
    fn test_settings_are_optional_and_bounded() {
        assert_eq!(settings(None).unwrap(), SettingsRequest::default());

        let partial = settings(Some(&json!({"rounds": 2}))).unwrap();
        assert_eq!(partial.rounds, Some(2));
        assert_eq!(partial.questions_per_round, None);

        assert!(settings(Some(&json!({"rounds": 11}))).is_err());
        assert!(settings(Some(&json!({"questionsPerRound": 0}))).is_err());
        assert!(settings(Some(&json!("fast"))).is_err());
    }

    #[test]
    fn test_text_fields_must_be_strings() {
        assert!(player_name(Some(&json!(42))).is_err());
        assert!(avatar(None).is_err());
        assert!(player_id(Some(&json!("not-a-uuid"))).is_err());
    }
}

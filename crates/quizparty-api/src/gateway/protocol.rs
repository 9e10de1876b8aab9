//! Wire protocol of the WebSocket gateway.
//!
//! Every frame is a JSON envelope `{"event": "<name>", "data": {...}}`.
//! Inbound envelopes are parsed into validated [`ClientCommand`]s; the
//! gateway's own replies are [`GatewayMessage`]s.

use quizparty_core::error::{CapacityLimit, DomainError};
use quizparty_session::domain::commands::ClientCommand;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::validation;

#[derive(Debug, Deserialize)]
struct InboundEnvelope {
    event: String,
    #[serde(default)]
    data: Value,
}

/// An inbound frame that could not be turned into a command.
#[derive(Debug)]
pub struct Rejection {
    /// The event name, when the envelope itself was readable.
    pub event: Option<String>,
    pub error: DomainError,
}

impl Rejection {
    /// Whether the rejected event was a join attempt.
    #[must_use]
    pub fn is_join(&self) -> bool {
        matches!(self.event.as_deref(), Some("host-join" | "player-join"))
    }
}

/// Parses and validates one text frame.
///
/// # Errors
///
/// Returns a [`Rejection`] for malformed JSON, unknown events or invalid
/// payload fields.
pub fn parse(frame: &str) -> Result<ClientCommand, Rejection> {
    let envelope: InboundEnvelope = serde_json::from_str(frame).map_err(|e| Rejection {
        event: None,
        error: DomainError::Validation(format!("malformed message: {e}")),
    })?;
    let event = envelope.event;
    command_for(&event, &envelope.data).map_err(|error| Rejection {
        event: Some(event),
        error,
    })
}

fn command_for(event: &str, data: &Value) -> Result<ClientCommand, DomainError> {
    let empty = Map::new();
    let fields = match data {
        Value::Object(fields) => fields,
        Value::Null => &empty,
        _ => return Err(DomainError::Validation("data must be an object".to_owned())),
    };
    let code = || validation::session_code(fields.get("code"));

    match event {
        "host-join" => Ok(ClientCommand::HostJoin { code: code()? }),
        "player-join" => Ok(ClientCommand::PlayerJoin {
            code: code()?,
            name: validation::player_name(fields.get("name"))?,
            avatar: validation::avatar(fields.get("avatar"))?,
        }),
        "start-game" => Ok(ClientCommand::StartGame {
            code: code()?,
            settings: validation::settings(fields.get("settings"))?,
        }),
        "player-answer" => Ok(ClientCommand::SubmitAnswer {
            code: code()?,
            player_id: validation::player_id(fields.get("playerId"))?,
            answer: validation::answer_index(fields.get("answer"))?,
        }),
        "player-leave" => Ok(ClientCommand::LeaveSession { code: code()? }),
        other => Err(DomainError::Validation(format!("unknown event: {other}"))),
    }
}

/// Messages the gateway itself sends to a single connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum GatewayMessage {
    /// A refused `host-join` or `player-join`.
    JoinError {
        reason: &'static str,
        message: String,
    },
    /// Any other refused event.
    Error {
        kind: &'static str,
        message: String,
    },
    RateLimited { message: String },
}

impl GatewayMessage {
    /// Reply for a refused command.
    #[must_use]
    pub fn refusal(error: &DomainError, is_join: bool) -> Self {
        if is_join {
            Self::JoinError {
                reason: join_reason(error),
                message: error.to_string(),
            }
        } else {
            Self::Error {
                kind: error.code(),
                message: error.to_string(),
            }
        }
    }

    /// Serialized frame.
    #[must_use]
    pub fn to_frame(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"event":"error","data":{"kind":"internal","message":"serialization failed"}}"#
                .to_owned()
        })
    }
}

fn join_reason(error: &DomainError) -> &'static str {
    match error {
        DomainError::NotFound(_) => "not-found",
        DomainError::StateConflict(_) => "already-started",
        DomainError::Capacity(CapacityLimit::DuplicateName) => "duplicate-name",
        DomainError::Capacity(_) => "full",
        DomainError::Validation(_) | DomainError::Persistence(_) => "invalid",
    }
}

//! Domain error types.

use std::fmt;

use thiserror::Error;

/// The capacity limit that rejected an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityLimit {
    /// The registry already holds the maximum number of sessions.
    RegistryFull,
    /// No unused session code could be found within the retry budget.
    CodeSpaceExhausted,
    /// The session already holds the maximum number of players.
    SessionFull,
    /// Another player in the session already uses the requested name.
    DuplicateName,
}

impl fmt::Display for CapacityLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::RegistryFull => "session registry is full",
            Self::CodeSpaceExhausted => "no free session code available",
            Self::SessionFull => "session is full",
            Self::DuplicateName => "player name already taken",
        };
        f.write_str(text)
    }
}

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Malformed input: code, name, avatar, answer or settings.
    #[error("validation error: {0}")]
    Validation(String),

    /// An unknown session (or player) was referenced.
    #[error("not found: {0}")]
    NotFound(String),

    /// The action is not valid in the current state.
    #[error("state conflict: {0}")]
    StateConflict(String),

    /// A capacity or uniqueness limit was hit.
    #[error("capacity exceeded: {0}")]
    Capacity(CapacityLimit),

    /// The usage history could not be read or written.
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl DomainError {
    /// Machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::NotFound(_) => "not_found",
            Self::StateConflict(_) => "state_conflict",
            Self::Capacity(_) => "capacity_exceeded",
            Self::Persistence(_) => "persistence_error",
        }
    }
}

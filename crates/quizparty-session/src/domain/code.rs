//! Short numeric session codes.

use std::fmt;
use std::str::FromStr;

use quizparty_core::error::DomainError;
use serde::Serialize;

/// Four-digit code identifying an active session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SessionCode(String);

impl SessionCode {
    /// Smallest generated code.
    pub const MIN: u32 = 1000;
    /// Largest generated code.
    pub const MAX: u32 = 9999;

    /// Parses a client-supplied code: exactly four ASCII digits after
    /// trimming.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for anything else.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.len() == 4 && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(trimmed.to_owned()))
        } else {
            Err(DomainError::Validation("invalid session code format".to_owned()))
        }
    }

    /// Builds a code from a number in `MIN..=MAX`.
    #[must_use]
    pub fn from_number(number: u32) -> Self {
        Self(format!("{number:04}"))
    }

    /// The code as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SessionCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_four_digits() {
        assert_eq!(SessionCode::parse(" 4821 ").unwrap().as_str(), "4821");
        assert_eq!(SessionCode::parse("0042").unwrap().as_str(), "0042");
    }

    #[test]
    fn test_parse_rejects_other_shapes() {
        for raw in ["", "482", "48211", "48a1", "４８２１", "-482"] {
            assert!(
                matches!(SessionCode::parse(raw), Err(DomainError::Validation(_))),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_from_number_round_trips_through_display() {
        let code = SessionCode::from_number(4821);
        assert_eq!(code.to_string(), "4821");
        assert_eq!("4821".parse::<SessionCode>().unwrap(), code);
    }
}

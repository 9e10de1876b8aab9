//! Players, their validated profile fields, and connection identity.

use std::fmt;

use quizparty_core::error::DomainError;
use serde::Serialize;
use uuid::Uuid;

/// Maximum player name length in characters.
pub const MAX_NAME_CHARS: usize = 20;
/// Maximum emoji avatar length in UTF-16 code units.
pub const MAX_EMOJI_UNITS: usize = 8;
/// Maximum length of an encoded image avatar.
pub const MAX_IMAGE_AVATAR_LEN: usize = 1_400_000;

const NAME_EXTRA_LETTERS: &str = "ąćęłńóśźżĄĆĘŁŃÓŚŹŻ";
const NAME_PUNCTUATION: &str = "-_.";
const IMAGE_AVATAR_PREFIX: &str = "data:image/";
const IMAGE_AVATAR_FORMATS: [&str; 4] = ["jpeg", "jpg", "png", "webp"];

/// Identifies one transport connection (a socket).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Allocates a fresh connection id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque player identifier assigned at join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PlayerId(Uuid);

impl PlayerId {
    /// Allocates a fresh player id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses a client-supplied player id.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `raw` is not a UUID.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        Uuid::parse_str(raw.trim())
            .map(Self)
            .map_err(|_| DomainError::Validation("invalid player id".to_owned()))
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A trimmed display name of 1–20 characters drawn from letters (including
/// Polish diacritics), digits, whitespace and `-_.`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PlayerName(String);

impl PlayerName {
    /// Validates and trims a client-supplied name.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` describing the first violated rule.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        let chars = trimmed.chars().count();
        if chars == 0 {
            return Err(DomainError::Validation("player name is required".to_owned()));
        }
        if chars > MAX_NAME_CHARS {
            return Err(DomainError::Validation(format!(
                "player name must be 1 to {MAX_NAME_CHARS} characters"
            )));
        }
        if !trimmed.chars().all(is_name_char) {
            return Err(DomainError::Validation(
                "player name contains forbidden characters".to_owned(),
            ));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// The name as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether two names collide, ignoring case.
    #[must_use]
    pub fn collides_with(&self, other: &PlayerName) -> bool {
        self.0.to_lowercase() == other.0.to_lowercase()
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || c.is_whitespace()
        || NAME_EXTRA_LETTERS.contains(c)
        || NAME_PUNCTUATION.contains(c)
}

/// A player's avatar: a short emoji sequence or a base64 image data URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Avatar(String);

impl Avatar {
    /// Validates a client-supplied avatar.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the avatar is empty, a malformed
    /// or oversized image, or not an emoji sequence.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::Validation("avatar is required".to_owned()));
        }

        if let Some(rest) = trimmed.strip_prefix(IMAGE_AVATAR_PREFIX) {
            if !is_valid_image_payload(rest) {
                return Err(DomainError::Validation(
                    "invalid avatar image format".to_owned(),
                ));
            }
            if trimmed.len() > MAX_IMAGE_AVATAR_LEN {
                return Err(DomainError::Validation("avatar image is too large".to_owned()));
            }
            return Ok(Self(trimmed.to_owned()));
        }

        if trimmed.encode_utf16().count() > MAX_EMOJI_UNITS || !trimmed.chars().all(is_emoji_char)
        {
            return Err(DomainError::Validation("invalid avatar format".to_owned()));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// The avatar as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the avatar is an uploaded image rather than an emoji.
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.0.starts_with(IMAGE_AVATAR_PREFIX)
    }
}

fn is_valid_image_payload(rest: &str) -> bool {
    let Some((format, data)) = rest.split_once(";base64,") else {
        return false;
    };
    IMAGE_AVATAR_FORMATS.contains(&format)
        && !data.is_empty()
        && data
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'='))
}

fn is_emoji_char(c: char) -> bool {
    matches!(
        u32::from(c),
        0x1F000..=0x1FAFF | 0x2600..=0x27BF | 0xFE00..=0xFE0F | 0x200D | 0x20E3
    )
}

/// The answer a player gave for the last resolved question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LastOutcome {
    /// Submitted answer index, if any.
    pub answer: Option<usize>,
    /// Whether it was correct.
    pub correct: bool,
    /// Points awarded.
    pub points: u32,
    /// Milliseconds between question start and submission.
    pub latency_ms: Option<i64>,
}

/// A participant in one session.
#[derive(Debug, Clone)]
pub struct Player {
    /// Player identifier.
    pub id: PlayerId,
    /// Display name.
    pub name: PlayerName,
    /// Avatar.
    pub avatar: Avatar,
    /// Connection that owns this player.
    pub connection: ConnectionId,
    /// Accumulated score; never decreases.
    pub score: u32,
    /// Outcome of the last resolved question.
    pub last: LastOutcome,
}

impl Player {
    /// A new player with a zero score.
    #[must_use]
    pub fn new(id: PlayerId, name: PlayerName, avatar: Avatar, connection: ConnectionId) -> Self {
        Self {
            id,
            name,
            avatar,
            connection,
            score: 0,
            last: LastOutcome::default(),
        }
    }

    /// Applies a question outcome.
    pub fn apply_outcome(&mut self, outcome: LastOutcome) {
        self.score = self.score.saturating_add(outcome.points);
        self.last = outcome;
    }

    /// Client-facing projection.
    #[must_use]
    pub fn view(&self) -> PlayerView {
        PlayerView {
            id: self.id,
            name: self.name.as_str().to_owned(),
            avatar: self.avatar.as_str().to_owned(),
            score: self.score,
            last_answer: self.last.answer,
            last_correct: self.last.correct,
            last_points: self.last.points,
            last_latency_ms: self.last.latency_ms,
        }
    }
}

/// Player as sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    /// Player identifier.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Avatar.
    pub avatar: String,
    /// Accumulated score.
    pub score: u32,
    /// Last submitted answer.
    pub last_answer: Option<usize>,
    /// Whether the last answer was correct.
    pub last_correct: bool,
    /// Points from the last question.
    pub last_points: u32,
    /// Latency of the last answer.
    pub last_latency_ms: Option<i64>,
}

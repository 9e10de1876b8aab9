//! Validated commands issued by connected clients.

use super::code::SessionCode;
use super::player::{Avatar, PlayerId, PlayerName};
use super::settings::SettingsRequest;

/// A command that has passed payload validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    /// Bind the connection as host of an existing session.
    HostJoin { code: SessionCode },
    /// Join a session in the lobby as a player.
    PlayerJoin {
        code: SessionCode,
        name: PlayerName,
        avatar: Avatar,
    },
    /// Start the game; host only.
    StartGame {
        code: SessionCode,
        settings: SettingsRequest,
    },
    /// Answer the current question.
    SubmitAnswer {
        code: SessionCode,
        player_id: PlayerId,
        answer: usize,
    },
    /// Leave the session voluntarily.
    LeaveSession { code: SessionCode },
}

impl ClientCommand {
    /// The session the command targets.
    #[must_use]
    pub fn code(&self) -> &SessionCode {
        match self {
            Self::HostJoin { code }
            | Self::PlayerJoin { code, .. }
            | Self::StartGame { code, .. }
            | Self::SubmitAnswer { code, .. }
            | Self::LeaveSession { code } => code,
        }
    }

    /// Wire name of the originating event.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::HostJoin { .. } => "host-join",
            Self::PlayerJoin { .. } => "player-join",
            Self::StartGame { .. } => "start-game",
            Self::SubmitAnswer { .. } => "player-answer",
            Self::LeaveSession { .. } => "player-leave",
        }
    }

    /// Whether failures are reported as `join-error`.
    #[must_use]
    pub fn is_join(&self) -> bool {
        matches!(self, Self::HostJoin { .. } | Self::PlayerJoin { .. })
    }
}

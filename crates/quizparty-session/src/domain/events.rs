//! Events a session publishes to its connections, and the outbox that
//! collects them in emission order.

use quizparty_questions::domain::question::QuestionView;
use serde::Serialize;

use super::code::SessionCode;
use super::player::{ConnectionId, PlayerId, PlayerView};
use super::settings::GameSettings;

/// Lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Lobby,
    Playing,
    Finished,
}

impl SessionStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lobby => "lobby",
            Self::Playing => "playing",
            Self::Finished => "finished",
        }
    }
}

/// Why a session was torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CloseReason {
    Idle,
    MaxAgeExceeded,
    Finished,
    HostLeft,
    ServerShutdown,
}

impl CloseReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::MaxAgeExceeded => "max-age-exceeded",
            Self::Finished => "finished",
            Self::HostLeft => "host-left",
            Self::ServerShutdown => "server-shutdown",
        }
    }
}

/// A server-to-client event. Serializes as `{"event": ..., "data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum SessionEvent {
    HostJoined {
        code: SessionCode,
        status: SessionStatus,
        players: Vec<PlayerView>,
        settings: GameSettings,
    },
    PlayerJoined {
        player_id: PlayerId,
        code: SessionCode,
    },
    PlayerListUpdated {
        players: Vec<PlayerView>,
    },
    GameStarted {
        rounds: u32,
        questions_per_round: u32,
        total_questions: usize,
    },
    NewQuestion {
        question: QuestionView,
        question_number: usize,
        total_questions: usize,
        round_number: usize,
        time_limit_secs: u64,
    },
    PlayerAnswerRealtime {
        player_id: PlayerId,
        total_answers: usize,
        total_players: usize,
    },
    QuestionEnded {
        correct_answer_index: usize,
        explanation: Option<String>,
        updated_players: Vec<PlayerView>,
    },
    RoundEnd {
        round_number: usize,
        total_rounds: u32,
        standings: Vec<PlayerView>,
    },
    GameFinished {
        standings: Vec<PlayerView>,
    },
    HostDisconnected {},
    SessionClosed {
        reason: CloseReason,
    },
}

impl SessionEvent {
    /// Wire name of the event.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::HostJoined { .. } => "host-joined",
            Self::PlayerJoined { .. } => "player-joined",
            Self::PlayerListUpdated { .. } => "player-list-updated",
            Self::GameStarted { .. } => "game-started",
            Self::NewQuestion { .. } => "new-question",
            Self::PlayerAnswerRealtime { .. } => "player-answer-realtime",
            Self::QuestionEnded { .. } => "question-ended",
            Self::RoundEnd { .. } => "round-end",
            Self::GameFinished { .. } => "game-finished",
            Self::HostDisconnected {} => "host-disconnected",
            Self::SessionClosed { .. } => "session-closed",
        }
    }
}

/// An event addressed to specific connections.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub recipients: Vec<ConnectionId>,
    pub event: SessionEvent,
}

/// Ordered buffer of pending deliveries.
#[derive(Debug, Default)]
pub struct Outbox {
    pending: Vec<Envelope>,
}

impl Outbox {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `event` for a single connection.
    pub fn send(&mut self, to: ConnectionId, event: SessionEvent) {
        self.pending.push(Envelope {
            recipients: vec![to],
            event,
        });
    }

    /// Queues `event` for every connection in `recipients`. Empty
    /// recipient lists are dropped.
    pub fn broadcast(&mut self, recipients: Vec<ConnectionId>, event: SessionEvent) {
        if recipients.is_empty() {
            return;
        }
        self.pending.push(Envelope { recipients, event });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Takes every queued envelope, oldest first.
    pub fn drain(&mut self) -> Vec<Envelope> {
        std::mem::take(&mut self.pending)
    }
}

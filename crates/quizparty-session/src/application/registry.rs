//! The set of active sessions keyed by join code.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use quizparty_core::error::{CapacityLimit, DomainError};
use quizparty_core::rng::DeterministicRng;

use crate::domain::code::SessionCode;
use crate::domain::events::CloseReason;
use crate::domain::game_session::GameSession;

/// Bounds on the registry and its sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryLimits {
    /// Maximum number of concurrently active sessions.
    pub max_sessions: usize,
    /// Maximum players per session.
    pub max_players: usize,
    /// Random draws tried before giving up on a free code.
    pub code_attempts: u32,
    /// Age after which the sweep evicts a session regardless of activity.
    pub max_age: Duration,
}

impl Default for RegistryLimits {
    fn default() -> Self {
        Self {
            max_sessions: 100,
            max_players: 20,
            code_attempts: 50,
            max_age: Duration::from_secs(2 * 60 * 60),
        }
    }
}

/// Active sessions. Only the owning engine adds or removes entries.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<SessionCode, GameSession>,
}

impl SessionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws a code not used by any active session.
    ///
    /// # Errors
    ///
    /// Returns `Capacity(RegistryFull)` when `limits.max_sessions` sessions
    /// are active, or `Capacity(CodeSpaceExhausted)` when every draw
    /// collided.
    pub fn allocate_code(
        &self,
        limits: &RegistryLimits,
        rng: &mut dyn DeterministicRng,
    ) -> Result<SessionCode, DomainError> {
        if self.sessions.len() >= limits.max_sessions {
            return Err(DomainError::Capacity(CapacityLimit::RegistryFull));
        }
        for _ in 0..limits.code_attempts {
            let code =
                SessionCode::from_number(rng.next_u32_range(SessionCode::MIN, SessionCode::MAX));
            if !self.sessions.contains_key(&code) {
                return Ok(code);
            }
        }
        Err(DomainError::Capacity(CapacityLimit::CodeSpaceExhausted))
    }

    pub fn insert(&mut self, session: GameSession) {
        self.sessions.insert(session.code().clone(), session);
    }

    #[must_use]
    pub fn get(&self, code: &SessionCode) -> Option<&GameSession> {
        self.sessions.get(code)
    }

    pub fn get_mut(&mut self, code: &SessionCode) -> Option<&mut GameSession> {
        self.sessions.get_mut(code)
    }

    pub fn remove(&mut self, code: &SessionCode) -> Option<GameSession> {
        self.sessions.remove(code)
    }

    #[must_use]
    pub fn contains(&self, code: &SessionCode) -> bool {
        self.sessions.contains_key(code)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Codes of every active session.
    #[must_use]
    pub fn codes(&self) -> Vec<SessionCode> {
        self.sessions.keys().cloned().collect()
    }

    /// Sessions the sweep should evict at `now`: older than `max_age`, or
    /// idle for longer than `idle_timeout`.
    #[must_use]
    pub fn expired(
        &self,
        now: DateTime<Utc>,
        max_age: Duration,
        idle_timeout: Duration,
    ) -> Vec<(SessionCode, CloseReason)> {
        let max_age = TimeDelta::from_std(max_age).unwrap_or(TimeDelta::MAX);
        let idle_timeout = TimeDelta::from_std(idle_timeout).unwrap_or(TimeDelta::MAX);

        let mut expired: Vec<(SessionCode, CloseReason)> = self
            .sessions
            .values()
            .filter_map(|session| {
                if now - session.created_at() > max_age {
                    Some((session.code().clone(), CloseReason::MaxAgeExceeded))
                } else if now - session.last_activity() > idle_timeout {
                    Some((session.code().clone(), CloseReason::Idle))
                } else {
                    None
                }
            })
            .collect();
        expired.sort_by(|a, b| a.0.cmp(&b.0));
        expired
    }
}

//! The session engine: the single sequential owner of every active session.
//!
//! Client commands, disconnects, timer firings and sweeps are applied one at
//! a time, so each handler sees a consistent registry and runs to completion
//! before the next begins. Client-visible effects accumulate in the engine's
//! outbox until the caller drains and delivers them.

use std::collections::HashMap;
use std::sync::Arc;

use quizparty_core::clock::Clock;
use quizparty_core::error::DomainError;
use quizparty_core::rng::DeterministicRng;
use quizparty_core::scheduler::{Scheduler, TimerId};
use quizparty_questions::application::history_store::UsageHistoryStore;
use quizparty_questions::domain::corpus::QuestionCorpus;
use tracing::{debug, info, instrument, warn};

use crate::application::query_handlers::{
    self, QuestionStatsView, SessionCreated, SessionView,
};
use crate::application::registry::{RegistryLimits, SessionRegistry};
use crate::domain::code::SessionCode;
use crate::domain::commands::ClientCommand;
use crate::domain::events::{CloseReason, Envelope, Outbox, SessionStatus};
use crate::domain::game_session::{DeckQuestion, GameSession, SessionContext, Transition};
use crate::domain::player::{Avatar, ConnectionId, PlayerId, PlayerName};
use crate::domain::settings::{GameSettings, SessionTimings, SettingsRequest};
use crate::domain::timers::SessionTimer;

/// Engine tunables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineConfig {
    pub timings: SessionTimings,
    pub limits: RegistryLimits,
    /// Layout used for new sessions and when `start-game` omits settings.
    pub default_settings: GameSettings,
}

/// The part a connection plays in its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Host,
    Player(PlayerId),
}

/// Which session a connection belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub code: SessionCode,
    pub role: Role,
}

/// Owns the registry and applies every state change to it.
pub struct SessionEngine {
    registry: SessionRegistry,
    memberships: HashMap<ConnectionId, Membership>,
    corpus: Arc<QuestionCorpus>,
    history: Arc<UsageHistoryStore>,
    clock: Arc<dyn Clock>,
    rng: Box<dyn DeterministicRng>,
    scheduler: Arc<dyn Scheduler<SessionTimer>>,
    config: EngineConfig,
    outbox: Outbox,
}

impl SessionEngine {
    #[must_use]
    pub fn new(
        corpus: Arc<QuestionCorpus>,
        history: Arc<UsageHistoryStore>,
        clock: Arc<dyn Clock>,
        rng: Box<dyn DeterministicRng>,
        scheduler: Arc<dyn Scheduler<SessionTimer>>,
        config: EngineConfig,
    ) -> Self {
        Self {
            registry: SessionRegistry::new(),
            memberships: HashMap::new(),
            corpus,
            history,
            clock,
            rng,
            scheduler,
            config,
            outbox: Outbox::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn session(&self, code: &SessionCode) -> Option<&GameSession> {
        self.registry.get(code)
    }

    #[must_use]
    pub fn session_count(&self) -> usize {
        self.registry.len()
    }

    #[must_use]
    pub fn membership(&self, connection: ConnectionId) -> Option<&Membership> {
        self.memberships.get(&connection)
    }

    /// Creates a session in the lobby with a fresh default-sized deck.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Capacity` when the registry is full or no free
    /// code could be drawn.
    #[instrument(skip(self))]
    pub async fn create_session(&mut self) -> Result<SessionCreated, DomainError> {
        let code = self
            .registry
            .allocate_code(&self.config.limits, self.rng.as_mut())?;
        let deck = self
            .select_deck(self.config.default_settings.total_questions())
            .await;

        let mut session = GameSession::new(
            code.clone(),
            self.config.default_settings,
            deck,
            self.clock.now(),
        );
        let mut ctx = SessionContext {
            clock: self.clock.as_ref(),
            scheduler: self.scheduler.as_ref(),
            outbox: &mut self.outbox,
            timings: &self.config.timings,
        };
        session.touch(&mut ctx);
        self.registry.insert(session);

        info!(code = %code, active_sessions = self.registry.len(), "Session created");
        Ok(SessionCreated {
            code,
            status: SessionStatus::Lobby,
        })
    }

    /// Read-only view of one session.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` for an unknown code.
    pub fn session_view(&self, code: &SessionCode) -> Result<SessionView, DomainError> {
        query_handlers::get_session(code, &self.registry)
    }

    /// Corpus statistics and default game parameters.
    #[must_use]
    pub fn stats(&self) -> QuestionStatsView {
        query_handlers::question_stats(
            &self.corpus,
            self.config.default_settings,
            &self.config.timings,
        )
    }

    /// Applies one client command. A successful command refreshes the
    /// session's activity.
    ///
    /// # Errors
    ///
    /// Returns the domain error explaining why the command was refused; the
    /// session is left unchanged.
    #[instrument(skip(self, command), fields(event = command.name(), code = %command.code()))]
    pub async fn dispatch(
        &mut self,
        connection: ConnectionId,
        command: ClientCommand,
    ) -> Result<(), DomainError> {
        let code = command.code().clone();
        if !self.registry.contains(&code) {
            return Err(not_found(&code));
        }

        match command {
            ClientCommand::HostJoin { .. } => self.host_join(connection, &code)?,
            ClientCommand::PlayerJoin { name, avatar, .. } => {
                self.player_join(connection, &code, name, avatar)?;
            }
            ClientCommand::StartGame { settings, .. } => {
                self.start_game(connection, &code, settings).await?;
            }
            ClientCommand::SubmitAnswer {
                player_id, answer, ..
            } => self.submit_answer(connection, &code, player_id, answer)?,
            ClientCommand::LeaveSession { .. } => self.leave(connection, &code)?,
        }

        if let Some(session) = self.registry.get_mut(&code) {
            let mut ctx = SessionContext {
                clock: self.clock.as_ref(),
                scheduler: self.scheduler.as_ref(),
                outbox: &mut self.outbox,
                timings: &self.config.timings,
            };
            session.touch(&mut ctx);
        }
        Ok(())
    }

    /// Releases whatever the closed connection held.
    pub fn disconnect(&mut self, connection: ConnectionId) {
        if let Some(membership) = self.memberships.remove(&connection) {
            debug!(connection = %connection, code = %membership.code, "Connection closed");
            self.release(connection, &membership);
        }
    }

    /// Delivers a timer firing to its session.
    pub async fn fire_timer(&mut self, id: TimerId, timer: SessionTimer) {
        let Some(session) = self.registry.get_mut(&timer.code) else {
            debug!(code = %timer.code, timer = %id, "Timer for removed session");
            return;
        };
        let mut ctx = SessionContext {
            clock: self.clock.as_ref(),
            scheduler: self.scheduler.as_ref(),
            outbox: &mut self.outbox,
            timings: &self.config.timings,
        };
        let transition = session.on_timer(timer.kind, id, &mut ctx);
        self.apply_transition(&timer.code, transition).await;
    }

    /// Evicts sessions past their maximum age or idle for too long. Returns
    /// how many were removed.
    pub fn sweep(&mut self) -> usize {
        let expired = self.registry.expired(
            self.clock.now(),
            self.config.limits.max_age,
            self.config.timings.idle_timeout,
        );
        let count = expired.len();
        for (code, reason) in expired {
            self.remove_session(&code, reason);
        }
        if count > 0 {
            info!(evicted = count, active_sessions = self.registry.len(), "Sweep evicted sessions");
        }
        count
    }

    /// Closes every session.
    pub fn shutdown(&mut self) {
        for code in self.registry.codes() {
            self.remove_session(&code, CloseReason::ServerShutdown);
        }
    }

    /// Takes every pending delivery, oldest first.
    pub fn drain_outbox(&mut self) -> Vec<Envelope> {
        self.outbox.drain()
    }

    /// Tears a session down and forgets its connections. Returns false if
    /// the code was not active.
    pub fn remove_session(&mut self, code: &SessionCode, reason: CloseReason) -> bool {
        let Some(mut session) = self.registry.remove(code) else {
            return false;
        };
        let mut ctx = SessionContext {
            clock: self.clock.as_ref(),
            scheduler: self.scheduler.as_ref(),
            outbox: &mut self.outbox,
            timings: &self.config.timings,
        };
        session.teardown(reason, &mut ctx);
        self.memberships.retain(|_, m| &m.code != code);
        true
    }

    fn host_join(&mut self, connection: ConnectionId, code: &SessionCode) -> Result<(), DomainError> {
        if let Some(existing) = self.memberships.get(&connection)
            && !(existing.code == *code && existing.role == Role::Host)
        {
            return Err(already_member(&existing.code));
        }
        let session = session_in(&mut self.registry, code)?;
        let previous = session.host();
        let mut ctx = SessionContext {
            clock: self.clock.as_ref(),
            scheduler: self.scheduler.as_ref(),
            outbox: &mut self.outbox,
            timings: &self.config.timings,
        };
        session.attach_host(connection, &mut ctx);

        if let Some(previous) = previous
            && previous != connection
        {
            self.memberships.remove(&previous);
        }
        self.memberships.insert(
            connection,
            Membership {
                code: code.clone(),
                role: Role::Host,
            },
        );
        Ok(())
    }

    fn player_join(
        &mut self,
        connection: ConnectionId,
        code: &SessionCode,
        name: PlayerName,
        avatar: Avatar,
    ) -> Result<(), DomainError> {
        if let Some(existing) = self.memberships.get(&connection) {
            return Err(already_member(&existing.code));
        }
        let max_players = self.config.limits.max_players;
        let session = session_in(&mut self.registry, code)?;
        let mut ctx = SessionContext {
            clock: self.clock.as_ref(),
            scheduler: self.scheduler.as_ref(),
            outbox: &mut self.outbox,
            timings: &self.config.timings,
        };
        let player_id = session.add_player(name, avatar, connection, max_players, &mut ctx)?;
        self.memberships.insert(
            connection,
            Membership {
                code: code.clone(),
                role: Role::Player(player_id),
            },
        );
        Ok(())
    }

    async fn start_game(
        &mut self,
        connection: ConnectionId,
        code: &SessionCode,
        request: SettingsRequest,
    ) -> Result<(), DomainError> {
        let current = {
            let session = self
                .registry
                .get(code)
                .ok_or_else(|| not_found(code))?;
            session.ensure_can_start(connection)?;
            session.settings()
        };
        let settings = request.resolve(current)?;
        let deck = if request.is_empty() {
            None
        } else {
            Some(self.select_deck(settings.total_questions()).await)
        };

        let session = session_in(&mut self.registry, code)?;
        let mut ctx = SessionContext {
            clock: self.clock.as_ref(),
            scheduler: self.scheduler.as_ref(),
            outbox: &mut self.outbox,
            timings: &self.config.timings,
        };
        session.start(connection, settings, deck, &mut ctx)
    }

    fn submit_answer(
        &mut self,
        connection: ConnectionId,
        code: &SessionCode,
        player_id: PlayerId,
        answer: usize,
    ) -> Result<(), DomainError> {
        let session = session_in(&mut self.registry, code)?;
        let mut ctx = SessionContext {
            clock: self.clock.as_ref(),
            scheduler: self.scheduler.as_ref(),
            outbox: &mut self.outbox,
            timings: &self.config.timings,
        };
        session.record_answer(player_id, connection, answer, &mut ctx)
    }

    fn leave(&mut self, connection: ConnectionId, code: &SessionCode) -> Result<(), DomainError> {
        match self.memberships.get(&connection) {
            Some(membership) if membership.code == *code => {}
            _ => {
                return Err(DomainError::StateConflict(format!(
                    "connection is not part of session {code}"
                )));
            }
        }
        if let Some(membership) = self.memberships.remove(&connection) {
            self.release(connection, &membership);
        }
        Ok(())
    }

    fn release(&mut self, connection: ConnectionId, membership: &Membership) {
        let Some(session) = self.registry.get_mut(&membership.code) else {
            return;
        };
        let mut ctx = SessionContext {
            clock: self.clock.as_ref(),
            scheduler: self.scheduler.as_ref(),
            outbox: &mut self.outbox,
            timings: &self.config.timings,
        };
        match membership.role {
            Role::Host => {
                if session.host() == Some(connection) && session.detach_host(&mut ctx) {
                    self.remove_session(&membership.code, CloseReason::HostLeft);
                }
            }
            Role::Player(player_id) => {
                if session.remove_player(player_id, &mut ctx) && session.is_abandoned() {
                    self.remove_session(&membership.code, CloseReason::HostLeft);
                }
            }
        }
    }

    async fn apply_transition(&mut self, code: &SessionCode, transition: Transition) {
        match transition {
            Transition::None => {}
            Transition::GameFinished { played } => {
                info!(code = %code, questions = played.len(), "Recording played questions");
                self.history.commit(played).await;
            }
            Transition::Expired(reason) => {
                self.remove_session(code, reason);
            }
        }
    }

    async fn select_deck(&mut self, count: usize) -> Vec<DeckQuestion> {
        let questions = self
            .history
            .select_fresh(&self.corpus, count, self.rng.as_mut())
            .await;
        if questions.len() < count {
            warn!(requested = count, available = questions.len(), "Corpus too small for full deck");
        }
        questions
            .into_iter()
            .map(|question| DeckQuestion {
                category_name: self.corpus.category_name(&question.category).to_owned(),
                question,
            })
            .collect()
    }
}

fn session_in<'a>(
    registry: &'a mut SessionRegistry,
    code: &SessionCode,
) -> Result<&'a mut GameSession, DomainError> {
    registry.get_mut(code).ok_or_else(|| not_found(code))
}

fn not_found(code: &SessionCode) -> DomainError {
    DomainError::NotFound(format!("session {code}"))
}

fn already_member(code: &SessionCode) -> DomainError {
    DomainError::Validation(format!("connection already belongs to session {code}"))
}

impl std::fmt::Debug for SessionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEngine")
            .field("sessions", &self.registry.len())
            .field("connections", &self.memberships.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

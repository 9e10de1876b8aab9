//! The per-session game state machine.
//!
//! A `GameSession` moves one way through `lobby -> playing -> finished`.
//! While playing, each question goes through
//! intro/pause -> awaiting answers -> showing results (or a round summary).
//! Every deferred step is a timer armed in the session's own slots. Every
//! client-visible effect is pushed into the caller's outbox.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use quizparty_core::clock::Clock;
use quizparty_core::error::{CapacityLimit, DomainError};
use quizparty_core::scheduler::{Scheduler, TimerId};
use quizparty_questions::domain::question::Question;
use tracing::{debug, info};

use super::code::SessionCode;
use super::events::{CloseReason, Outbox, SessionEvent, SessionStatus};
use super::player::{Avatar, ConnectionId, LastOutcome, Player, PlayerId, PlayerName, PlayerView};
use super::scoring::points_for;
use super::settings::{GameSettings, SessionTimings};
use super::timers::{SessionTimer, TimerKind, TimerSlots};

/// Collaborators a session needs while handling one step.
pub struct SessionContext<'a> {
    pub clock: &'a dyn Clock,
    pub scheduler: &'a dyn Scheduler<SessionTimer>,
    pub outbox: &'a mut Outbox,
    pub timings: &'a SessionTimings,
}

/// A question placed in a session's deck.
#[derive(Debug, Clone)]
pub struct DeckQuestion {
    pub question: Arc<Question>,
    /// Display name of the question's category.
    pub category_name: String,
}

/// Where the current question stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    /// Lobby; nothing scheduled.
    Idle,
    /// Between `game-started` and the first question.
    Intro,
    AwaitingAnswers,
    /// Short pause after a question inside a round.
    ShowingResults,
    /// Longer pause after the last question of a round.
    RoundSummary,
    Finished,
}

/// What the owner of a session must do after a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    None,
    /// The game just finished; these question ids were played.
    GameFinished { played: Vec<String> },
    /// The session removed itself and must be dropped.
    Expired(CloseReason),
}

#[derive(Debug, Clone, Copy)]
struct SubmittedAnswer {
    answer: usize,
    at: DateTime<Utc>,
}

/// One quiz game, from lobby to final standings.
#[derive(Debug)]
pub struct GameSession {
    code: SessionCode,
    status: SessionStatus,
    settings: GameSettings,
    deck: Vec<DeckQuestion>,
    index: usize,
    phase: RoundPhase,
    question_started_at: Option<DateTime<Utc>>,
    answers: HashMap<PlayerId, SubmittedAnswer>,
    players: Vec<Player>,
    host: Option<ConnectionId>,
    /// Set once a joined host has gone; cleared when a host attaches.
    host_left: bool,
    created_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
    timers: TimerSlots,
}

impl GameSession {
    /// A new session in the lobby.
    #[must_use]
    pub fn new(
        code: SessionCode,
        settings: GameSettings,
        deck: Vec<DeckQuestion>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            code,
            status: SessionStatus::Lobby,
            settings,
            deck,
            index: 0,
            phase: RoundPhase::Idle,
            question_started_at: None,
            answers: HashMap::new(),
            players: Vec::new(),
            host: None,
            host_left: false,
            created_at: now,
            last_activity: now,
            timers: TimerSlots::default(),
        }
    }

    #[must_use]
    pub fn code(&self) -> &SessionCode {
        &self.code
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    #[must_use]
    pub fn settings(&self) -> GameSettings {
        self.settings
    }

    #[must_use]
    pub fn host(&self) -> Option<ConnectionId> {
        self.host
    }

    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    #[must_use]
    pub fn player_views(&self) -> Vec<PlayerView> {
        self.players.iter().map(Player::view).collect()
    }

    /// Index of the next question to be asked.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.deck.len()
    }

    #[must_use]
    pub fn deck_ids(&self) -> Vec<String> {
        self.deck.iter().map(|d| d.question.id.clone()).collect()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    #[must_use]
    pub fn answer_count(&self) -> usize {
        self.answers.len()
    }

    /// Whether a timer of `kind` is currently armed.
    #[must_use]
    pub fn is_timer_armed(&self, kind: TimerKind) -> bool {
        self.timers.is_armed(kind)
    }

    /// Host first, then players in join order.
    #[must_use]
    pub fn recipients(&self) -> Vec<ConnectionId> {
        self.host
            .into_iter()
            .chain(self.players.iter().map(|p| p.connection))
            .collect()
    }

    /// Players ordered by score, highest first. Ties keep join order.
    #[must_use]
    pub fn standings(&self) -> Vec<PlayerView> {
        let mut views = self.player_views();
        views.sort_by(|a, b| b.score.cmp(&a.score));
        views
    }

    /// Refreshes last activity and re-arms the inactivity timer.
    pub fn touch(&mut self, ctx: &mut SessionContext<'_>) {
        self.last_activity = ctx.clock.now();
        self.timers.arm(
            ctx.scheduler,
            &self.code,
            TimerKind::Inactivity,
            ctx.timings.idle_timeout,
        );
    }

    /// Binds `connection` as the host and sends it the current state.
    pub fn attach_host(&mut self, connection: ConnectionId, ctx: &mut SessionContext<'_>) {
        self.host = Some(connection);
        self.host_left = false;
        ctx.outbox.send(
            connection,
            SessionEvent::HostJoined {
                code: self.code.clone(),
                status: self.status,
                players: self.player_views(),
                settings: self.settings,
            },
        );
        info!(code = %self.code, connection = %connection, "Host joined session");
    }

    /// Drops the host binding. Returns true when no players remain and the
    /// session should be torn down.
    pub fn detach_host(&mut self, ctx: &mut SessionContext<'_>) -> bool {
        self.host = None;
        self.host_left = true;
        if self.players.is_empty() {
            return true;
        }
        ctx.outbox
            .broadcast(self.recipients(), SessionEvent::HostDisconnected {});
        false
    }

    /// Whether the host has left and the last player is gone too.
    #[must_use]
    pub fn is_abandoned(&self) -> bool {
        self.host_left && self.players.is_empty()
    }

    /// Adds a player to the lobby.
    ///
    /// # Errors
    ///
    /// Returns `StateConflict` once the game has started, `Capacity` when the
    /// session is full or the name is taken.
    pub fn add_player(
        &mut self,
        name: PlayerName,
        avatar: Avatar,
        connection: ConnectionId,
        max_players: usize,
        ctx: &mut SessionContext<'_>,
    ) -> Result<PlayerId, DomainError> {
        if self.status != SessionStatus::Lobby {
            return Err(DomainError::StateConflict("game already started".to_owned()));
        }
        if self.players.len() >= max_players {
            return Err(DomainError::Capacity(CapacityLimit::SessionFull));
        }
        if self.players.iter().any(|p| p.name.collides_with(&name)) {
            return Err(DomainError::Capacity(CapacityLimit::DuplicateName));
        }

        let id = PlayerId::new();
        info!(code = %self.code, player_id = %id, name = name.as_str(), "Player joined session");
        self.players.push(Player::new(id, name, avatar, connection));

        ctx.outbox.send(
            connection,
            SessionEvent::PlayerJoined {
                player_id: id,
                code: self.code.clone(),
            },
        );
        self.broadcast_player_list(ctx);
        Ok(id)
    }

    /// Removes a player and any answer they submitted. If the remaining
    /// players have all answered, the open question resolves now.
    pub fn remove_player(&mut self, id: PlayerId, ctx: &mut SessionContext<'_>) -> bool {
        let Some(position) = self.players.iter().position(|p| p.id == id) else {
            return false;
        };
        self.players.remove(position);
        self.answers.remove(&id);
        info!(code = %self.code, player_id = %id, "Player left session");

        self.broadcast_player_list(ctx);
        if self.phase == RoundPhase::AwaitingAnswers && self.all_answered() {
            self.timers.cancel(ctx.scheduler, TimerKind::QuestionTimeout);
            self.end_question(ctx);
        }
        true
    }

    /// Checks that `requester` may start the game now.
    ///
    /// # Errors
    ///
    /// Returns `StateConflict` if the requester is not the host, the game is
    /// not in the lobby or nobody has joined.
    pub fn ensure_can_start(&self, requester: ConnectionId) -> Result<(), DomainError> {
        if self.host != Some(requester) {
            return Err(DomainError::StateConflict(
                "only the host can start the game".to_owned(),
            ));
        }
        if self.status != SessionStatus::Lobby {
            return Err(DomainError::StateConflict("game already started".to_owned()));
        }
        if self.players.is_empty() {
            return Err(DomainError::StateConflict(
                "at least one player must join before starting".to_owned(),
            ));
        }
        Ok(())
    }

    /// Starts the game, optionally with a new deck, and schedules the first
    /// question after the intro delay.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::ensure_can_start`], or `StateConflict`
    /// when the deck is empty.
    pub fn start(
        &mut self,
        requester: ConnectionId,
        settings: GameSettings,
        deck: Option<Vec<DeckQuestion>>,
        ctx: &mut SessionContext<'_>,
    ) -> Result<(), DomainError> {
        self.ensure_can_start(requester)?;
        if deck.as_ref().map_or(self.deck.is_empty(), Vec::is_empty) {
            return Err(DomainError::StateConflict(
                "no questions available".to_owned(),
            ));
        }
        if let Some(deck) = deck {
            self.deck = deck;
        }

        self.settings = settings;
        self.status = SessionStatus::Playing;
        self.phase = RoundPhase::Intro;
        self.index = 0;
        ctx.outbox.broadcast(
            self.recipients(),
            SessionEvent::GameStarted {
                rounds: settings.rounds(),
                questions_per_round: settings.questions_per_round(),
                total_questions: self.deck.len(),
            },
        );
        self.timers.arm(
            ctx.scheduler,
            &self.code,
            TimerKind::Advance,
            ctx.timings.intro_delay,
        );
        info!(
            code = %self.code,
            rounds = settings.rounds(),
            questions_per_round = settings.questions_per_round(),
            total_questions = self.deck.len(),
            "Game started"
        );
        Ok(())
    }

    /// Publishes the next question, or finishes the game when the deck is
    /// exhausted.
    pub fn start_question(&mut self, ctx: &mut SessionContext<'_>) -> Transition {
        if self.status != SessionStatus::Playing {
            return Transition::None;
        }
        let Some(entry) = self.deck.get(self.index) else {
            return self.finish(ctx);
        };

        let view = entry.question.redacted(&entry.category_name);
        let per_round = self.settings.questions_per_round() as usize;
        self.answers.clear();
        self.question_started_at = Some(ctx.clock.now());
        self.phase = RoundPhase::AwaitingAnswers;

        ctx.outbox.broadcast(
            self.recipients(),
            SessionEvent::NewQuestion {
                question: view,
                question_number: self.index + 1,
                total_questions: self.deck.len(),
                round_number: self.index / per_round + 1,
                time_limit_secs: ctx.timings.question_time_limit.as_secs(),
            },
        );
        self.timers.arm(
            ctx.scheduler,
            &self.code,
            TimerKind::QuestionTimeout,
            ctx.timings.question_time_limit,
        );
        debug!(code = %self.code, index = self.index, "Question opened");
        Transition::None
    }

    /// Records one player's answer to the open question.
    ///
    /// # Errors
    ///
    /// Returns `StateConflict` when no question is open, the player belongs
    /// to another connection or already answered; `NotFound` for an unknown
    /// player; `Validation` for an out-of-range answer.
    pub fn record_answer(
        &mut self,
        player_id: PlayerId,
        connection: ConnectionId,
        answer: usize,
        ctx: &mut SessionContext<'_>,
    ) -> Result<(), DomainError> {
        if self.status != SessionStatus::Playing {
            return Err(DomainError::StateConflict("game is not in progress".to_owned()));
        }
        if self.phase != RoundPhase::AwaitingAnswers {
            return Err(DomainError::StateConflict("no question is open".to_owned()));
        }
        let player = self
            .player(player_id)
            .ok_or_else(|| DomainError::NotFound(format!("player {player_id}")))?;
        if player.connection != connection {
            return Err(DomainError::StateConflict(
                "player belongs to another connection".to_owned(),
            ));
        }
        let answer_count = self
            .deck
            .get(self.index)
            .map_or(0, |entry| entry.question.answers.len());
        if answer >= answer_count {
            return Err(DomainError::Validation(format!(
                "answer must be between 0 and {}",
                answer_count.saturating_sub(1)
            )));
        }
        if self.answers.contains_key(&player_id) {
            return Err(DomainError::StateConflict("answer already submitted".to_owned()));
        }

        self.answers.insert(
            player_id,
            SubmittedAnswer {
                answer,
                at: ctx.clock.now(),
            },
        );
        ctx.outbox.broadcast(
            self.recipients(),
            SessionEvent::PlayerAnswerRealtime {
                player_id,
                total_answers: self.answers.len(),
                total_players: self.players.len(),
            },
        );

        if self.all_answered() {
            self.timers.cancel(ctx.scheduler, TimerKind::QuestionTimeout);
            self.end_question(ctx);
        }
        Ok(())
    }

    /// Scores the open question, publishes the results and schedules what
    /// comes next.
    pub fn end_question(&mut self, ctx: &mut SessionContext<'_>) {
        if self.phase != RoundPhase::AwaitingAnswers {
            return;
        }
        let Some(entry) = self.deck.get(self.index) else {
            return;
        };
        let question = Arc::clone(&entry.question);
        let started = self.question_started_at.unwrap_or_else(|| ctx.clock.now());

        for player in &mut self.players {
            let outcome = match self.answers.get(&player.id) {
                Some(submitted) => {
                    let latency_ms = (submitted.at - started).num_milliseconds();
                    let correct = question.is_correct(submitted.answer);
                    LastOutcome {
                        answer: Some(submitted.answer),
                        correct,
                        points: points_for(correct, latency_ms),
                        latency_ms: Some(latency_ms),
                    }
                }
                None => LastOutcome::default(),
            };
            player.apply_outcome(outcome);
        }
        self.answers.clear();

        ctx.outbox.broadcast(
            self.recipients(),
            SessionEvent::QuestionEnded {
                correct_answer_index: question.correct,
                explanation: question.explanation.clone(),
                updated_players: self.player_views(),
            },
        );

        self.index += 1;
        let per_round = self.settings.questions_per_round() as usize;
        let pause = if self.index % per_round == 0 && self.index < self.deck.len() {
            self.phase = RoundPhase::RoundSummary;
            ctx.outbox.broadcast(
                self.recipients(),
                SessionEvent::RoundEnd {
                    round_number: self.index / per_round,
                    total_rounds: self.settings.rounds(),
                    standings: self.standings(),
                },
            );
            ctx.timings.round_pause
        } else {
            self.phase = RoundPhase::ShowingResults;
            ctx.timings.result_pause
        };
        self.timers
            .arm(ctx.scheduler, &self.code, TimerKind::Advance, pause);
        debug!(code = %self.code, index = self.index, "Question resolved");
    }

    /// Handles a timer firing. Firings whose id no longer matches the armed
    /// slot are ignored.
    pub fn on_timer(
        &mut self,
        kind: TimerKind,
        id: TimerId,
        ctx: &mut SessionContext<'_>,
    ) -> Transition {
        if !self.timers.take_if_current(kind, id) {
            debug!(code = %self.code, timer = %id, "Ignoring stale timer");
            return Transition::None;
        }
        match kind {
            TimerKind::QuestionTimeout => {
                self.end_question(ctx);
                Transition::None
            }
            TimerKind::Advance => self.start_question(ctx),
            TimerKind::Inactivity => Transition::Expired(CloseReason::Idle),
            TimerKind::Cleanup => Transition::Expired(CloseReason::Finished),
        }
    }

    /// Cancels every timer and tells all connections the session is gone.
    pub fn teardown(&mut self, reason: CloseReason, ctx: &mut SessionContext<'_>) {
        self.timers.cancel_all(ctx.scheduler);
        ctx.outbox
            .broadcast(self.recipients(), SessionEvent::SessionClosed { reason });
        info!(code = %self.code, reason = reason.as_str(), "Session closed");
    }

    fn finish(&mut self, ctx: &mut SessionContext<'_>) -> Transition {
        self.status = SessionStatus::Finished;
        self.phase = RoundPhase::Finished;
        self.question_started_at = None;
        self.timers.cancel_all(ctx.scheduler);
        ctx.outbox.broadcast(
            self.recipients(),
            SessionEvent::GameFinished {
                standings: self.standings(),
            },
        );
        self.timers.arm(
            ctx.scheduler,
            &self.code,
            TimerKind::Cleanup,
            ctx.timings.finish_grace,
        );
        info!(code = %self.code, "Game finished");
        Transition::GameFinished {
            played: self.deck_ids(),
        }
    }

    fn all_answered(&self) -> bool {
        !self.players.is_empty() && self.players.iter().all(|p| self.answers.contains_key(&p.id))
    }

    fn broadcast_player_list(&self, ctx: &mut SessionContext<'_>) {
        ctx.outbox.broadcast(
            self.recipients(),
            SessionEvent::PlayerListUpdated {
                players: self.player_views(),
            },
        );
    }
}

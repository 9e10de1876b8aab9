//! Shared builders for session tests.

use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use quizparty_core::clock::Clock;
use quizparty_questions::domain::corpus::{CategoryDefinition, QuestionCorpus};
use quizparty_questions::domain::question::Question;
use quizparty_test_support::{ManualClock, ManualScheduler};

use crate::domain::code::SessionCode;
use crate::domain::events::{Envelope, Outbox};
use crate::domain::game_session::{DeckQuestion, GameSession, SessionContext, Transition};
use crate::domain::player::{Avatar, PlayerName};
use crate::domain::settings::{GameSettings, SessionTimings};
use crate::domain::timers::{SessionTimer, TimerKind};

pub(crate) fn question(id: &str, correct: usize) -> Question {
    Question {
        id: id.to_owned(),
        text: format!("Question {id}?"),
        answers: vec!["A".to_owned(), "B".to_owned(), "C".to_owned(), "D".to_owned()],
        correct,
        category: "general".to_owned(),
        explanation: Some(format!("Because {id}.")),
        image: None,
        source: None,
    }
}

/// `n` questions `q1..=qn`, all with answer 0 correct.
pub(crate) fn deck(n: usize) -> Vec<DeckQuestion> {
    (1..=n)
        .map(|i| DeckQuestion {
            question: Arc::new(question(&format!("q{i}"), 0)),
            category_name: "General".to_owned(),
        })
        .collect()
}

pub(crate) fn corpus(n: usize) -> QuestionCorpus {
    QuestionCorpus::build(
        vec![CategoryDefinition {
            key: "general".to_owned(),
            name: "General".to_owned(),
            color: "#123456".to_owned(),
            icon: "❓".to_owned(),
        }],
        (1..=n).map(|i| question(&format!("q{i}"), 0)).collect(),
    )
    .unwrap()
}

pub(crate) fn code(raw: &str) -> SessionCode {
    SessionCode::parse(raw).unwrap()
}

pub(crate) fn name(raw: &str) -> PlayerName {
    PlayerName::parse(raw).unwrap()
}

pub(crate) fn avatar() -> Avatar {
    Avatar::parse("🦊").unwrap()
}

/// Clock, scheduler and outbox for driving a lone `GameSession`.
pub(crate) struct Harness {
    pub clock: ManualClock,
    pub scheduler: ManualScheduler<SessionTimer>,
    pub outbox: Outbox,
    pub timings: SessionTimings,
}

impl Harness {
    pub fn new() -> Self {
        let clock = ManualClock::at_default_epoch();
        Self {
            scheduler: ManualScheduler::new(clock.clone()),
            clock,
            outbox: Outbox::new(),
            timings: SessionTimings::default(),
        }
    }

    pub fn ctx(&mut self) -> SessionContext<'_> {
        SessionContext {
            clock: &self.clock,
            scheduler: &self.scheduler,
            outbox: &mut self.outbox,
            timings: &self.timings,
        }
    }

    pub fn session(&self, n: usize, settings: GameSettings) -> GameSession {
        GameSession::new(code("4821"), settings, deck(n), self.clock.now())
    }

    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    /// Fires the earliest timer due within `within` of now.
    pub fn fire_next(
        &mut self,
        session: &mut GameSession,
        within: Duration,
    ) -> Option<(TimerKind, Transition)> {
        let until = self.clock.now() + TimeDelta::from_std(within).ok()?;
        let (id, timer) = self.scheduler.next_due(until)?;
        let transition = session.on_timer(timer.kind, id, &mut self.ctx());
        Some((timer.kind, transition))
    }

    pub fn drain_names(&mut self) -> Vec<&'static str> {
        self.outbox.drain().iter().map(|e| e.event.name()).collect()
    }

    pub fn drain(&mut self) -> Vec<Envelope> {
        self.outbox.drain()
    }
}

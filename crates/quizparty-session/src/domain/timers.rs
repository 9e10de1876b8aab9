//! Per-session timer slots.
//!
//! A session owns at most one armed timer per [`TimerKind`]. Arming a slot
//! cancels whatever it held, and a firing is only honoured if its id still
//! matches the slot.

use std::collections::HashMap;
use std::time::Duration;

use quizparty_core::scheduler::{Scheduler, TimerId};

use super::code::SessionCode;

/// Which deferred continuation a timer drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Resolves an unanswered question.
    QuestionTimeout,
    /// Moves on to the next question after a pause.
    Advance,
    /// Evicts the session after inactivity.
    Inactivity,
    /// Removes a finished session.
    Cleanup,
}

/// Payload delivered back to the engine when a timer fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTimer {
    pub code: SessionCode,
    pub kind: TimerKind,
}

/// Armed timer ids, one per kind.
#[derive(Debug, Default)]
pub struct TimerSlots {
    armed: HashMap<TimerKind, TimerId>,
}

impl TimerSlots {
    /// Arms `kind`, cancelling the previous timer in that slot.
    pub fn arm(
        &mut self,
        scheduler: &dyn Scheduler<SessionTimer>,
        code: &SessionCode,
        kind: TimerKind,
        delay: Duration,
    ) -> TimerId {
        self.cancel(scheduler, kind);
        let id = scheduler.schedule(
            delay,
            SessionTimer {
                code: code.clone(),
                kind,
            },
        );
        self.armed.insert(kind, id);
        id
    }

    /// Cancels the timer in `kind`, if any.
    pub fn cancel(&mut self, scheduler: &dyn Scheduler<SessionTimer>, kind: TimerKind) {
        if let Some(id) = self.armed.remove(&kind) {
            scheduler.cancel(id);
        }
    }

    pub fn cancel_all(&mut self, scheduler: &dyn Scheduler<SessionTimer>) {
        for (_, id) in self.armed.drain() {
            scheduler.cancel(id);
        }
    }

    /// Clears the slot if `id` is the timer currently armed in it. Returns
    /// false for stale firings.
    pub fn take_if_current(&mut self, kind: TimerKind, id: TimerId) -> bool {
        if self.armed.get(&kind) == Some(&id) {
            self.armed.remove(&kind);
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.armed.contains_key(&kind)
    }
}

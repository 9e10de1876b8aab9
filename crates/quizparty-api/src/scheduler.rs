//! Timer scheduler backed by tokio tasks.
//!
//! Each scheduled timer is a task that sleeps and then posts its payload to
//! a channel the engine task reads. Cancelling aborts the sleeping task.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use quizparty_core::scheduler::{Scheduler, TimerId, TimerIdSequence};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;

type TaskMap = Arc<Mutex<HashMap<TimerId, JoinHandle<()>>>>;

/// A fired timer: its id and payload.
pub type Firing<T> = (TimerId, T);

/// Scheduler whose timers fire into an unbounded channel.
#[derive(Debug)]
pub struct TokioScheduler<T> {
    ids: TimerIdSequence,
    tasks: TaskMap,
    fired: UnboundedSender<Firing<T>>,
}

impl<T: Send + 'static> TokioScheduler<T> {
    /// Creates a scheduler and the receiver its firings arrive on.
    #[must_use]
    pub fn channel() -> (Self, UnboundedReceiver<Firing<T>>) {
        let (fired, receiver) = unbounded_channel();
        let scheduler = Self {
            ids: TimerIdSequence::new(),
            tasks: Arc::new(Mutex::new(HashMap::new())),
            fired,
        };
        (scheduler, receiver)
    }

    #[cfg(test)]
    fn pending(&self) -> usize {
        lock(&self.tasks).len()
    }
}

impl<T: Send + 'static> Scheduler<T> for TokioScheduler<T> {
    fn schedule(&self, delay: Duration, payload: T) -> TimerId {
        let id = self.ids.next_id();
        let fired = self.fired.clone();
        let tasks = Arc::clone(&self.tasks);

        // The map stays locked until the handle is stored, so a timer that
        // fires immediately cannot try to remove itself before insertion.
        let mut guard = lock(&self.tasks);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            lock(&tasks).remove(&id);
            let _ = fired.send((id, payload));
        });
        guard.insert(id, handle);
        id
    }

    fn cancel(&self, id: TimerId) {
        if let Some(handle) = lock(&self.tasks).remove(&id) {
            handle.abort();
        }
    }
}

impl<T> Drop for TokioScheduler<T> {
    fn drop(&mut self) {
        for (_, handle) in lock(&self.tasks).drain() {
            handle.abort();
        }
    }
}

fn lock(tasks: &TaskMap) -> MutexGuard<'_, HashMap<TimerId, JoinHandle<()>>> {
    tasks.lock().unwrap_or_else(PoisonError::into_inner)
}

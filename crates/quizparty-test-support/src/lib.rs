//! Shared test mocks and utilities for the Quiz Party game server.

mod clock;
mod repository;
mod rng;
mod scheduler;

pub use clock::{FixedClock, ManualClock};
pub use repository::{FailingHistoryRepository, InMemoryHistoryRepository};
pub use rng::{CyclingRng, MockRng, SequenceRng};
pub use scheduler::ManualScheduler;

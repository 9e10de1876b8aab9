//! Quiz Party: game session bounded context.
//!
//! Responsible for the per-game state machine (lobby, timed questions,
//! scoring, rounds, completion), the registry of active sessions and its
//! expiry sweep, and the engine that sequences client commands and timer
//! firings into sessions.

pub mod application;
pub mod domain;

#[cfg(test)]
pub(crate) mod test_fixtures;

//! Quiz Party: questions bounded context.
//!
//! Responsible for the in-memory question corpus, picking decks of
//! questions that were not played recently, and remembering which
//! questions were played.

pub mod application;
pub mod domain;

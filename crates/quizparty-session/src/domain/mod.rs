//! Domain model for the session context.

pub mod code;
pub mod commands;
pub mod events;
pub mod game_session;
pub mod player;
pub mod scoring;
pub mod settings;
pub mod timers;

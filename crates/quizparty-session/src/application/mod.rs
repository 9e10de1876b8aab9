//! Application services for the session context.

pub mod engine;
pub mod query_handlers;
pub mod registry;

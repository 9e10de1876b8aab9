//! Application services for the questions context.

pub mod history_store;
pub mod selector;

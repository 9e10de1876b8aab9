//! Domain model for the questions context.

pub mod corpus;
pub mod history;
pub mod question;

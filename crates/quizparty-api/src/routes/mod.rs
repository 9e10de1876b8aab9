//! HTTP route modules.

pub mod health;
pub mod questions;
pub mod session;

//! Quiz Party Core: shared abstractions.
//!
//! This crate defines the traits and types every other crate depends on:
//! time, randomness, deferred timers, the error taxonomy and the usage
//! history persistence port. It contains no infrastructure code.

pub mod clock;
pub mod error;
pub mod repository;
pub mod rng;
pub mod scheduler;

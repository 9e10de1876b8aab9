//! Quiz Party: flat-file persistence for the used-question history.

pub mod json_history_repository;

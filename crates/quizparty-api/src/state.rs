//! Shared application state.

use std::sync::Arc;

use quizparty_core::clock::Clock;

use crate::config::AppConfig;
use crate::engine_task::EngineHandle;
use crate::hub::ConnectionHub;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Front door to the session engine task.
    pub engine: EngineHandle,
    /// Open WebSocket connections.
    pub hub: ConnectionHub,
    /// Clock used for rate limiting.
    pub clock: Arc<dyn Clock>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        engine: EngineHandle,
        hub: ConnectionHub,
        clock: Arc<dyn Clock>,
        config: AppConfig,
    ) -> Self {
        Self {
            engine,
            hub,
            clock,
            config: Arc::new(config),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("engine", &self.engine)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

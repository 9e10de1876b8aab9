//! Quiz Party HTTP and WebSocket server.

pub mod config;
pub mod corpus_loader;
pub mod engine_task;
pub mod error;
pub mod gateway;
pub mod hub;
pub mod routes;
pub mod scheduler;
pub mod state;

use std::sync::Arc;

use axum::Router;
use quizparty_core::clock::Clock;
use quizparty_core::repository::HistoryRepository;
use quizparty_core::rng::DeterministicRng;
use quizparty_questions::application::history_store::UsageHistoryStore;
use quizparty_questions::application::selector::SelectorConfig;
use quizparty_questions::domain::corpus::QuestionCorpus;
use quizparty_questions::domain::history::DEFAULT_HISTORY_CAPACITY;
use quizparty_session::application::engine::{EngineConfig, SessionEngine};
use quizparty_session::application::registry::RegistryLimits;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::engine_task::spawn_engine;
use crate::hub::ConnectionHub;
use crate::scheduler::TokioScheduler;
use crate::state::AppState;

/// Builds the full router: health, REST endpoints and the WebSocket gateway.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/session", routes::session::router())
        .nest("/api/questions", routes::questions::router())
        .merge(gateway::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Opens the usage history, builds the session engine and spawns its task.
///
/// Returns the state for [`app`] and the engine task handle.
pub async fn start_engine(
    config: AppConfig,
    corpus: QuestionCorpus,
    repository: Arc<dyn HistoryRepository>,
    clock: Arc<dyn Clock>,
    rng: Box<dyn DeterministicRng>,
) -> (AppState, JoinHandle<()>) {
    let history = Arc::new(
        UsageHistoryStore::open(
            DEFAULT_HISTORY_CAPACITY,
            SelectorConfig::default(),
            repository,
            clock.clone(),
        )
        .await,
    );

    let (scheduler, timers) = TokioScheduler::channel();
    let engine_config = EngineConfig {
        limits: RegistryLimits {
            max_sessions: config.max_sessions,
            ..RegistryLimits::default()
        },
        ..EngineConfig::default()
    };
    let engine = SessionEngine::new(
        Arc::new(corpus),
        history,
        clock.clone(),
        rng,
        Arc::new(scheduler),
        engine_config,
    );

    let hub = ConnectionHub::new();
    let (engine_handle, task) = spawn_engine(engine, hub.clone(), timers);
    (AppState::new(engine_handle, hub, clock, config), task)
}

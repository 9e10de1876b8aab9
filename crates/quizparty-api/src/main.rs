//! Quiz Party server entry point.

use std::error::Error;
use std::sync::Arc;

use quizparty_api::config::AppConfig;
use quizparty_api::corpus_loader::load_corpus;
use quizparty_api::engine_task::spawn_sweeper;
use quizparty_core::clock::SystemClock;
use quizparty_core::rng::SystemRng;
use quizparty_history_store::json_history_repository::JsonHistoryRepository;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Quiz Party server");

    let config = AppConfig::from_env()?;
    let corpus = load_corpus(&config.questions_path).await?;
    let repository = Arc::new(JsonHistoryRepository::new(config.history_path.clone()));
    let addr = config.bind_address();
    let sweep_interval = config.sweep_interval;

    let (state, engine_task) = quizparty_api::start_engine(
        config,
        corpus,
        repository,
        Arc::new(SystemClock),
        Box::new(SystemRng::new()),
    )
    .await;
    let engine = state.engine.clone();
    let sweeper = spawn_sweeper(engine.clone(), sweep_interval);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, quizparty_api::app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down, closing open sessions");
    sweeper.abort();
    engine.shutdown().await;
    engine_task.await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}

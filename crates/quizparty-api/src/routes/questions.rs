//! Question corpus statistics.

use axum::extract::State;
use axum::{Json, Router, routing::get};
use quizparty_session::application::query_handlers::QuestionStatsView;
use tracing::instrument;

use crate::error::ApiError;
use crate::state::AppState;

/// GET /stats
#[instrument(skip(state))]
async fn stats(State(state): State<AppState>) -> Result<Json<QuestionStatsView>, ApiError> {
    Ok(Json(state.engine.stats().await?))
}

/// Returns the router for the question endpoints.
pub fn router() -> Router<AppState> {
    Router::new().route("/stats", get(stats))
}

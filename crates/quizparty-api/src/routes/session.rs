//! Routes for creating and inspecting game sessions.

use axum::extract::{Path, State};
use axum::{
    Json, Router,
    routing::{get, post},
};
use quizparty_session::application::query_handlers::{SessionCreated, SessionView};
use quizparty_session::domain::code::SessionCode;
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::state::AppState;

/// POST /create
#[instrument(skip(state))]
async fn create_session(State(state): State<AppState>) -> Result<Json<SessionCreated>, ApiError> {
    let created = state.engine.create_session().await?;
    info!(code = %created.code, "Session created over HTTP");
    Ok(Json(created))
}

/// GET /{code}
#[instrument(skip(state))]
async fn get_session(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    let code = SessionCode::parse(&code)?;
    let view = state.engine.session(code).await?;
    Ok(Json(view))
}

/// Returns the router for the session endpoints.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create_session))
        .route("/{code}", get(get_session))
}

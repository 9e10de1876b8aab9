//! Quiz Party: API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use quizparty_core::error::DomainError;
use serde::Serialize;
use thiserror::Error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// An environment variable is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The question corpus could not be loaded.
    #[error("question corpus error: {0}")]
    Corpus(String),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// Failure of a request routed to the session engine.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The engine task has stopped and can no longer answer.
    #[error("session engine unavailable")]
    EngineUnavailable,
}

impl ApiError {
    /// Machine-readable code, shared with WebSocket error messages.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Domain(err) => err.code(),
            Self::EngineUnavailable => "engine_unavailable",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Domain(DomainError::Validation(_)) => StatusCode::BAD_REQUEST,
            Self::Domain(DomainError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Domain(DomainError::StateConflict(_)) => StatusCode::CONFLICT,
            Self::Domain(DomainError::Capacity(_)) | Self::EngineUnavailable => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Domain(DomainError::Persistence(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.code(),
            message: self.to_string(),
        };

        (self.status(), Json(body)).into_response()
    }
}

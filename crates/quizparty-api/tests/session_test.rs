//! Integration tests for the session endpoints.

mod common;

use axum::http::StatusCode;
use quizparty_api::config::AppConfig;
use serde_json::json;

#[tokio::test]
async fn test_create_session_returns_lobby_code() {
    // Arrange
    let app = common::build_test_app().await;

    // Act
    let (status, json) = common::post_json(app, "/api/session/create", &json!({})).await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "lobby");
    let code = json["code"].as_str().unwrap();
    assert_eq!(code.len(), 4);
    assert!(code.bytes().all(|b| b.is_ascii_digit()));
}

#[tokio::test]
async fn test_get_session_returns_created_session() {
    // Arrange
    let app = common::build_test_app().await;
    let (_, created) = common::post_json(app.clone(), "/api/session/create", &json!({})).await;
    let code = created["code"].as_str().unwrap();

    // Act
    let (status, json) = common::get_json(app, &format!("/api/session/{code}")).await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["code"], code);
    assert_eq!(json["status"], "lobby");
    assert_eq!(json["playerCount"], 0);
    assert_eq!(json["players"], json!([]));
    assert_eq!(json["currentQuestion"], 0);
    assert_eq!(json["settings"]["rounds"], 5);
    assert_eq!(json["settings"]["questionsPerRound"], 5);
    assert_eq!(json["createdAt"], "2026-01-15T10:00:00Z");
}

#[tokio::test]
async fn test_get_session_with_malformed_code_returns_400() {
    let app = common::build_test_app().await;

    let (status, json) = common::get_json(app, "/api/session/12ab").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "validation_error");
}

#[tokio::test]
async fn test_get_unknown_session_returns_404() {
    let app = common::build_test_app().await;

    let (status, json) = common::get_json(app, "/api/session/9999").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "not_found");
}

#[tokio::test]
async fn test_create_session_beyond_limit_returns_503() {
    // Arrange
    let config = AppConfig {
        max_sessions: 1,
        ..AppConfig::default()
    };
    let app = common::build_test_app_with(config).await;
    let (status, _) = common::post_json(app.clone(), "/api/session/create", &json!({})).await;
    assert_eq!(status, StatusCode::OK);

    // Act
    let (status, json) = common::post_json(app, "/api/session/create", &json!({})).await;

    // Assert
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error"], "capacity_exceeded");
}

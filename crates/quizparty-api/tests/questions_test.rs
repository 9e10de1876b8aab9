//! Integration tests for the question statistics endpoint.

mod common;

use axum::http::StatusCode;

#[tokio::test]
async fn test_stats_summarises_corpus_and_defaults() {
    // Arrange
    let app = common::build_test_app().await;

    // Act
    let (status, json) = common::get_json(app, "/api/questions/stats").await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["totalQuestions"], 5);
    assert_eq!(json["totalCategories"], 2);
    assert_eq!(json["categories"]["geo"]["name"], "Geografia");
    assert_eq!(json["categories"]["geo"]["count"], 3);
    assert_eq!(json["categories"]["history"]["count"], 2);
    assert_eq!(json["gameSettings"]["rounds"], 5);
    assert_eq!(json["gameSettings"]["questionsPerRound"], 5);
    assert_eq!(json["gameSettings"]["timePerQuestion"], 15);
}

//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use quizparty_api::config::AppConfig;
use quizparty_core::clock::Clock;
use quizparty_questions::domain::corpus::{CorpusDocument, QuestionCorpus};
use quizparty_test_support::{CyclingRng, FixedClock, InMemoryHistoryRepository};
use serde_json::json;
use tower::ServiceExt;

/// Fixed timestamp used across all integration tests.
fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(
        chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2026, 1, 15, 10, 0, 0).unwrap(),
    ))
}

/// Three geography questions and two history questions.
pub fn sample_corpus() -> QuestionCorpus {
    let document: CorpusDocument = serde_json::from_value(json!({
        "categories": [
            {"key": "geo", "name": "Geografia", "color": "#2e7d32", "icon": "🌍"},
            {"key": "history", "name": "Historia", "color": "#6d4c41", "icon": "📜"}
        ],
        "questions": [
            {"id": "geo_1", "question": "Stolica Polski?", "answers": ["Kraków", "Warszawa", "Gdańsk", "Poznań"], "correct": 1, "category": "geo"},
            {"id": "geo_2", "question": "Najdłuższa rzeka Polski?", "answers": ["Odra", "Warta", "Wisła", "Bug"], "correct": 2, "category": "geo"},
            {"id": "geo_3", "question": "Najwyższy szczyt Polski?", "answers": ["Rysy", "Śnieżka", "Babia Góra", "Giewont"], "correct": 0, "category": "geo"},
            {"id": "his_1", "question": "Rok chrztu Polski?", "answers": ["966", "1025", "1410", "1569"], "correct": 0, "category": "history"},
            {"id": "his_2", "question": "Rok bitwy pod Grunwaldem?", "answers": ["1385", "1410", "1466", "1525"], "correct": 1, "category": "history"}
        ]
    }))
    .unwrap();
    QuestionCorpus::from_document(document).unwrap()
}

/// Build the full app router with the sample corpus, an in-memory history
/// and deterministic Clock/RNG. Uses the same wiring as `main.rs`.
pub async fn build_test_app() -> Router {
    build_test_app_with(AppConfig::default()).await
}

/// Build the full app router with a custom configuration.
pub async fn build_test_app_with(config: AppConfig) -> Router {
    let (state, _task) = quizparty_api::start_engine(
        config,
        sample_corpus(),
        Arc::new(InMemoryHistoryRepository::default()),
        fixed_clock(),
        Box::new(CyclingRng::default()),
    )
    .await;
    quizparty_api::app(state)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

// tests/router_tests.rs

use avtotest_backend::{
    config::Config,
    db::memory::{MemoryHistoryRepository, MemoryQuestionBank, MemoryUserRepository},
    exam::{ExamService, ExamSettings, InMemorySessionStore},
    routes,
    state::AppState,
};
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use std::sync::Arc;
use tower::ServiceExt;

fn app(static_dir: &str) -> Router {
    let config = Config {
        database_url: String::new(),
        jwt_secret: "router_test_secret".to_string(),
        rust_log: "error".to_string(),
        port: 0,
        free_test_limit: 5,
        session_retention_minutes: 30,
        static_dir: static_dir.to_string(),
    };

    let exams = Arc::new(ExamService::new(
        Arc::new(InMemorySessionStore::new()),
        Arc::new(MemoryQuestionBank::new()),
        Arc::new(MemoryUserRepository::new()),
        Arc::new(MemoryHistoryRepository::new()),
        ExamSettings::from(&config),
    ));

    routes::create_router(AppState { config, exams })
}

#[tokio::test]
async fn unknown_path_is_404() {
    let response = app(".")
        .oneshot(Request::builder().uri("/random_path_that_does_not_exist").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn question_images_are_served() {
    let root = std::env::temp_dir().join(format!("avtotest_static_{}", std::process::id()));
    std::fs::create_dir_all(root.join("ru-test-images")).unwrap();
    std::fs::write(root.join("ru-test-images").join("12.png"), b"png-bytes").unwrap();

    let response = app(root.to_str().unwrap())
        .oneshot(Request::builder().uri("/ru-test-images/12.png").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app(root.to_str().unwrap())
        .oneshot(Request::builder().uri("/uz-test-images/12.png").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    std::fs::remove_dir_all(root).ok();
}

#[tokio::test]
async fn exam_status_without_token_is_401() {
    let response = app(".")
        .oneshot(Request::builder().uri("/api/exam/status/exam_1_abc").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

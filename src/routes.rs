// src/routes.rs

use std::path::Path;

use axum::{
    Router,
    http::Method,
    middleware,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{
    handlers::{exam, health},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Directories of question images, each served under its own name.
const IMAGE_DIRS: [&str; 3] = ["uz-test-images", "ru-test-images", "kiril-test-images"];

/// Assembles the main application router.
///
/// * Nests the exam routes under `/api/exam`, all behind bearer auth.
/// * Serves question images from `config.static_dir`.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let exam_routes = Router::new()
        .route("/create-exam", post(exam::create_exam))
        .route("/question/{exam_id}/{index}", get(exam::get_question))
        .route("/answer/{exam_id}", post(exam::submit_answer))
        .route("/complete/{exam_id}", post(exam::complete_exam))
        .route("/status/{exam_id}", get(exam::get_status))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let static_root = Path::new(&state.config.static_dir);
    let mut router = Router::new()
        .route("/", get(health::health_check))
        .nest("/api/exam", exam_routes);

    for dir in IMAGE_DIRS {
        router = router.nest_service(&format!("/{}", dir), ServeDir::new(static_root.join(dir)));
    }

    router
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

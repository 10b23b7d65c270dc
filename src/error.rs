// src/error.rs

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::models::user::TestAllowance;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request (bad language, question count, index, body)
    BadRequest(String),

    // 400 Operation not permitted in the session's lifecycle state
    InvalidState(String),

    // 400 The question already has a recorded answer in this session
    AlreadyAnswered(i64),

    // 401 Unauthorized
    AuthError(String),

    // 403 The user's plan does not allow another exam
    LimitExceeded(TestAllowance),

    // 404 Not Found. Also used for sessions owned by someone else.
    NotFound(String),

    // 404 Not enough questions stored for the requested language
    InsufficientPool { available: usize, required: usize },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into the `{status: "error", message, data?}` envelope.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, data) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                    None,
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::InvalidState(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::AlreadyAnswered(question_id) => (
                StatusCode::BAD_REQUEST,
                format!("Question {} has already been answered", question_id),
                None,
            ),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            AppError::LimitExceeded(allowance) => (
                StatusCode::FORBIDDEN,
                "Test limit reached for the current plan".to_string(),
                Some(json!(allowance)),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            AppError::InsufficientPool { available, required } => (
                StatusCode::NOT_FOUND,
                format!(
                    "Only {} questions are available in this language, {} required",
                    available, required
                ),
                None,
            ),
        };

        let body = match data {
            Some(data) => json!({ "status": "error", "message": message, "data": data }),
            None => json!({ "status": "error", "message": message }),
        };

        (status, Json(body)).into_response()
    }
}

/// Converts `sqlx::Error` into `AppError::InternalServerError`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

/// Malformed or mistyped request bodies are client errors.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

// src/handlers/exam.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    exam::ExamService,
    models::{
        exam::{CreateExamRequest, ExamLength, Language, SubmitAnswerRequest},
        response::success,
    },
    utils::jwt::Claims,
};

/// Starts a timed exam.
///
/// * Validates the language (`uz_kiril` is accepted and stored as `kiril`).
/// * Accepts 20 or 50 questions.
/// * Checks the user's plan allowance before building the question set.
pub async fn create_exam(
    State(exams): State<Arc<ExamService>>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<CreateExamRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let language = Language::normalize(&payload.language)
        .ok_or(AppError::BadRequest("Unsupported language".to_string()))?;
    let length = ExamLength::try_from(payload.question_count)?;
    let user_id = claims.user_id()?;

    let created = exams.create_exam(user_id, language, length).await?;

    Ok(success(created))
}

/// Returns one question of an active exam, without the correct answer.
pub async fn get_question(
    State(exams): State<Arc<ExamService>>,
    Extension(claims): Extension<Claims>,
    path: Result<Path<(String, i64)>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path((exam_id, index)) = path?;
    let question = exams.get_question(claims.user_id()?, &exam_id, index)?;

    Ok(success(question))
}

/// Records the answer to one question and reveals the correct one.
pub async fn submit_answer(
    State(exams): State<Arc<ExamService>>,
    Extension(claims): Extension<Claims>,
    Path(exam_id): Path<String>,
    payload: Result<Json<SubmitAnswerRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    let result = exams.submit_answer(
        claims.user_id()?,
        &exam_id,
        payload.question_id,
        payload.selected_answer,
    )?;

    Ok(success(result))
}

/// Finishes the exam and returns the final tally.
pub async fn complete_exam(
    State(exams): State<Arc<ExamService>>,
    Extension(claims): Extension<Claims>,
    Path(exam_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let results = exams.complete_exam(claims.user_id()?, &exam_id).await?;

    Ok(success(results))
}

pub async fn get_status(
    State(exams): State<Arc<ExamService>>,
    Extension(claims): Extension<Claims>,
    Path(exam_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let status = exams.get_status(claims.user_id()?, &exam_id)?;

    Ok(success(status))
}

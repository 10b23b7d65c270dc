// src/exam/service.rs

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    config::Config,
    db::{HistoryRepository, QuestionBank, UserRepository},
    error::AppError,
    exam::{
        reconcile::Reconciler,
        selection,
        store::{SessionStore, lock_session},
    },
    models::exam::{
        AnswerResponse, ExamCompletedResponse, ExamCreatedResponse, ExamInfo, ExamLength,
        ExamQuestionResponse, ExamSession, ExamStatus, ExamStatusResponse, FinishedExam, Language,
    },
};

/// Tunables of the exam lifecycle.
#[derive(Debug, Clone)]
pub struct ExamSettings {
    /// Lifetime exams allowed on the free plan.
    pub free_test_limit: i64,
    /// How long a finished session stays readable before it is purged.
    pub retention: Duration,
}

impl From<&Config> for ExamSettings {
    fn from(config: &Config) -> Self {
        Self {
            free_test_limit: config.free_test_limit,
            retention: Duration::from_secs(config.session_retention_minutes * 60),
        }
    }
}

fn exam_not_found() -> AppError {
    AppError::NotFound("Exam not found".to_string())
}

/// Exam session state machine.
///
/// Sessions start `Active` and move exactly once to `Completed` (explicit
/// request) or `Expired` (timer). Whichever transition wins reconciles the
/// user's statistics; the loser sees a terminal state and does nothing.
pub struct ExamService {
    sessions: Arc<dyn SessionStore>,
    bank: Arc<dyn QuestionBank>,
    users: Arc<dyn UserRepository>,
    reconciler: Reconciler,
    settings: ExamSettings,
}

impl ExamService {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        bank: Arc<dyn QuestionBank>,
        users: Arc<dyn UserRepository>,
        history: Arc<dyn HistoryRepository>,
        settings: ExamSettings,
    ) -> Self {
        Self {
            sessions,
            bank,
            reconciler: Reconciler::new(Arc::clone(&users), history),
            users,
            settings,
        }
    }

    /// Number of sessions currently held, finished ones included.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Starts a new exam for `user_id` and arms its expiry timer.
    pub async fn create_exam(
        self: &Arc<Self>,
        user_id: i64,
        language: Language,
        length: ExamLength,
    ) -> Result<ExamCreatedResponse, AppError> {
        let user = self
            .users
            .get(user_id)
            .await?
            .ok_or(AppError::NotFound("User not found".to_string()))?;

        let allowance = user.test_allowance(self.settings.free_test_limit, Utc::now());
        if !allowance.can_take() {
            tracing::info!("User {} reached the test limit of the free plan", user_id);
            return Err(AppError::LimitExceeded(allowance));
        }

        let questions = selection::create_pool(self.bank.as_ref(), language, length).await?;

        let exam_id = format!("exam_{}_{}", user_id, Uuid::new_v4().simple());
        let session = ExamSession::new(exam_id.clone(), user_id, language, length, questions, Utc::now());
        let expiry = session.expiry.clone();

        let response = ExamCreatedResponse {
            exam_id: exam_id.clone(),
            question_count: session.questions.len(),
            language,
            start_time: session.started_at,
            duration: length.duration().as_secs() / 60,
            duration_ms: session.duration_ms(),
            expires_at: session.expires_at,
            current_question: 0,
            total_questions: session.questions.len(),
        };

        self.sessions.create(session);
        self.schedule_expiry(exam_id, expiry, length.duration());

        tracing::info!(
            "Exam {} created for user {} ({}, {} questions)",
            response.exam_id,
            user_id,
            language,
            response.question_count
        );

        Ok(response)
    }

    /// Serves the question at `index` of an active session.
    pub fn get_question(
        &self,
        user_id: i64,
        exam_id: &str,
        index: i64,
    ) -> Result<ExamQuestionResponse, AppError> {
        self.with_owned(user_id, exam_id, |session| {
            if !session.is_active() {
                return Err(AppError::InvalidState(
                    "Exam has finished or expired".to_string(),
                ));
            }

            let position = usize::try_from(index)
                .ok()
                .filter(|i| *i < session.questions.len())
                .ok_or(AppError::BadRequest("Invalid question index".to_string()))?;

            let question = &session.questions[position].question;
            let recorded = session.answers.get(&question.id);

            Ok(ExamQuestionResponse {
                question: question.to_public(),
                question_index: position,
                total_questions: session.questions.len(),
                user_answer: recorded.map(|r| r.selected_answer_id),
                is_answered: recorded.is_some(),
                exam_info: ExamInfo {
                    exam_id: session.id.clone(),
                    language: session.language,
                    question_count: session.length.question_count(),
                    start_time: session.started_at,
                },
            })
        })
    }

    /// Records the answer to one question. The check and the write happen
    /// under the same lock, so concurrent answers to one question cannot both win.
    pub fn submit_answer(
        &self,
        user_id: i64,
        exam_id: &str,
        question_id: i64,
        selected_answer_id: i64,
    ) -> Result<AnswerResponse, AppError> {
        self.with_owned(user_id, exam_id, |session| {
            session.record_answer(question_id, selected_answer_id)
        })
        .map(AnswerResponse::from)
    }

    /// Finishes an active session on the owner's request.
    pub async fn complete_exam(
        &self,
        user_id: i64,
        exam_id: &str,
    ) -> Result<ExamCompletedResponse, AppError> {
        let finished = self.with_owned(user_id, exam_id, |session| {
            session
                .close(ExamStatus::Completed, Utc::now())
                .ok_or(AppError::InvalidState("Exam has already finished".to_string()))
        })?;

        self.finish(&finished).await;

        Ok(ExamCompletedResponse::from(&finished))
    }

    /// Read-only view of a session in any state.
    pub fn get_status(&self, user_id: i64, exam_id: &str) -> Result<ExamStatusResponse, AppError> {
        self.with_owned(user_id, exam_id, |session| Ok(ExamStatusResponse::from(&*session)))
    }

    /// Timer path: expires the session if it is still active.
    /// Returns whether this call performed the transition.
    pub async fn expire(&self, exam_id: &str) -> bool {
        let finished = {
            let Some(shared) = self.sessions.get(exam_id) else {
                return false;
            };
            let mut session = match lock_session(&shared) {
                Ok(session) => session,
                Err(e) => {
                    tracing::error!("Failed to expire exam {}: {:?}", exam_id, e);
                    return false;
                }
            };
            session.close(ExamStatus::Expired, Utc::now())
        };

        match finished {
            Some(finished) => {
                tracing::info!("Exam {} expired", exam_id);
                self.finish(&finished).await;
                true
            }
            None => false,
        }
    }

    /// Runs once per session, after its first transition out of `Active`.
    async fn finish(&self, finished: &FinishedExam) {
        self.reconciler.reconcile(finished).await;
        self.schedule_purge(finished.exam_id.clone());
    }

    fn with_owned<R>(
        &self,
        user_id: i64,
        exam_id: &str,
        f: impl FnOnce(&mut ExamSession) -> Result<R, AppError>,
    ) -> Result<R, AppError> {
        let shared = self.sessions.get(exam_id).ok_or_else(exam_not_found)?;
        let mut session = lock_session(&shared)?;
        if session.owner_id != user_id {
            return Err(exam_not_found());
        }
        f(&mut *session)
    }

    fn schedule_expiry(self: &Arc<Self>, exam_id: String, expiry: CancellationToken, after: Duration) {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                _ = expiry.cancelled() => {
                    tracing::debug!("Expiry timer of exam {} cancelled", exam_id);
                }
                _ = tokio::time::sleep(after) => {
                    service.expire(&exam_id).await;
                }
            }
        });
    }

    fn schedule_purge(&self, exam_id: String) {
        let sessions = Arc::clone(&self.sessions);
        let retention = self.settings.retention;
        tokio::spawn(async move {
            tokio::time::sleep(retention).await;
            sessions.delete(&exam_id);
            tracing::debug!("Exam session {} purged", exam_id);
        });
    }
}

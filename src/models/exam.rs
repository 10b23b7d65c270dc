// src/models/exam.rs

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use validator::Validate;

use crate::{
    error::AppError,
    models::question::{PooledQuestion, PublicQuestion},
};

/// Template id recorded in mistake history for answers given inside an exam.
pub const EXAM_TEMPLATE_ID: i64 = 999;

/// Language of a question set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Uz,
    Ru,
    Kiril,
    Kaa,
}

impl Language {
    /// Parses client input. `uz_kiril` is an alias of `kiril`.
    pub fn normalize(raw: &str) -> Option<Self> {
        match raw {
            "uz" => Some(Language::Uz),
            "ru" => Some(Language::Ru),
            "kiril" | "uz_kiril" => Some(Language::Kiril),
            "kaa" => Some(Language::Kaa),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Uz => "uz",
            Language::Ru => "ru",
            Language::Kiril => "kiril",
            Language::Kaa => "kaa",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported exam sizes. The size fixes the time limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExamLength {
    Short,
    Full,
}

impl ExamLength {
    pub fn question_count(&self) -> usize {
        match self {
            ExamLength::Short => 20,
            ExamLength::Full => 50,
        }
    }

    /// 20 questions -> 20 minutes, 50 questions -> 45 minutes.
    pub fn duration(&self) -> Duration {
        match self {
            ExamLength::Short => Duration::from_secs(20 * 60),
            ExamLength::Full => Duration::from_secs(45 * 60),
        }
    }
}

impl TryFrom<u32> for ExamLength {
    type Error = AppError;

    fn try_from(count: u32) -> Result<Self, Self::Error> {
        match count {
            20 => Ok(ExamLength::Short),
            50 => Ok(ExamLength::Full),
            _ => Err(AppError::BadRequest(
                "questionCount must be 20 or 50".to_string(),
            )),
        }
    }
}

/// Lifecycle state. `Completed` and `Expired` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamStatus {
    Active,
    Completed,
    Expired,
}

/// What the user picked for a question and whether it was right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedAnswer {
    pub selected_answer_id: i64,
    pub is_correct: bool,
}

/// Final counts of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub total: usize,
    pub answered: usize,
    pub correct: usize,
    pub wrong: usize,
    pub unanswered: usize,
    pub percentage: u32,
}

impl Tally {
    pub fn from_results(total: usize, answered: usize, correct: usize) -> Self {
        let percentage = if total > 0 {
            (correct as f64 * 100.0 / total as f64).round() as u32
        } else {
            0
        };
        Self {
            total,
            answered,
            correct,
            wrong: answered - correct,
            unanswered: total - answered,
            percentage,
        }
    }
}

/// A wrongly answered question, kept for the mistakes history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mistake {
    pub question_id: i64,
    pub template_id: i64,
    pub selected_answer_id: i64,
}

/// Snapshot handed to the reconciler once a session leaves `Active`.
#[derive(Debug, Clone)]
pub struct FinishedExam {
    pub exam_id: String,
    pub owner_id: i64,
    pub language: Language,
    pub status: ExamStatus,
    pub tally: Tally,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub mistakes: Vec<Mistake>,
}

/// Result of recording one answer.
#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    pub is_correct: bool,
    pub correct_answer: AnswerText,
    pub selected_answer: AnswerText,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerText {
    pub id: i64,
    pub text: String,
}

/// One timed attempt at a fixed set of questions, owned by one user.
#[derive(Debug)]
pub struct ExamSession {
    pub id: String,
    pub owner_id: i64,
    pub language: Language,
    pub length: ExamLength,
    pub questions: Vec<PooledQuestion>,
    pub answers: HashMap<i64, RecordedAnswer>,
    pub status: ExamStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    /// Cancelled when the session leaves `Active`; stops the expiry timer.
    pub expiry: CancellationToken,
}

impl ExamSession {
    pub fn new(
        id: String,
        owner_id: i64,
        language: Language,
        length: ExamLength,
        questions: Vec<PooledQuestion>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let expires_at = started_at
            + chrono::Duration::milliseconds(length.duration().as_millis() as i64);
        Self {
            id,
            owner_id,
            language,
            length,
            questions,
            answers: HashMap::new(),
            status: ExamStatus::Active,
            started_at,
            ended_at: None,
            expires_at,
            expiry: CancellationToken::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ExamStatus::Active
    }

    pub fn duration_ms(&self) -> u64 {
        self.length.duration().as_millis() as u64
    }

    pub fn correct_count(&self) -> usize {
        self.answers.values().filter(|a| a.is_correct).count()
    }

    pub fn tally(&self) -> Tally {
        Tally::from_results(self.questions.len(), self.answers.len(), self.correct_count())
    }

    /// Records the answer to a question. A question can be answered once.
    pub fn record_answer(
        &mut self,
        question_id: i64,
        selected_answer_id: i64,
    ) -> Result<AnswerOutcome, AppError> {
        if !self.is_active() {
            return Err(AppError::InvalidState(
                "Exam has finished or expired".to_string(),
            ));
        }
        if self.answers.contains_key(&question_id) {
            return Err(AppError::AlreadyAnswered(question_id));
        }

        let question = self
            .questions
            .iter()
            .map(|p| &p.question)
            .find(|q| q.id == question_id)
            .ok_or(AppError::NotFound("Question not found".to_string()))?;

        let selected = question
            .answer(selected_answer_id)
            .ok_or(AppError::NotFound("Answer not found".to_string()))?;

        let correct = question.correct_answer().ok_or_else(|| {
            AppError::InternalServerError(format!(
                "Question {} has no correct answer",
                question_id
            ))
        })?;

        let outcome = AnswerOutcome {
            is_correct: correct.id == selected.id,
            correct_answer: AnswerText {
                id: correct.id,
                text: correct.text(),
            },
            selected_answer: AnswerText {
                id: selected.id,
                text: selected.text(),
            },
            explanation: question.explanation.clone(),
        };

        self.answers.insert(
            question_id,
            RecordedAnswer {
                selected_answer_id,
                is_correct: outcome.is_correct,
            },
        );

        Ok(outcome)
    }

    /// Moves an active session into `terminal`.
    ///
    /// Returns `None` when the session had already left `Active`; only the
    /// caller that gets `Some` may reconcile.
    pub fn close(&mut self, terminal: ExamStatus, now: DateTime<Utc>) -> Option<FinishedExam> {
        if !self.is_active() || terminal == ExamStatus::Active {
            return None;
        }

        self.status = terminal;
        self.ended_at = Some(now);
        self.expiry.cancel();

        let mut mistakes: Vec<Mistake> = self
            .questions
            .iter()
            .filter_map(|p| {
                let recorded = self.answers.get(&p.question.id)?;
                (!recorded.is_correct).then(|| Mistake {
                    question_id: p.question.id,
                    template_id: p.template_id,
                    selected_answer_id: recorded.selected_answer_id,
                })
            })
            .collect();
        mistakes.sort_by_key(|m| m.question_id);

        Some(FinishedExam {
            exam_id: self.id.clone(),
            owner_id: self.owner_id,
            language: self.language,
            status: terminal,
            tally: self.tally(),
            started_at: self.started_at,
            ended_at: now,
            mistakes,
        })
    }
}

/// DTO for starting an exam.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateExamRequest {
    #[validate(custom(function = validate_language))]
    pub language: String,
    pub question_count: u32,
}

fn validate_language(language: &str) -> Result<(), validator::ValidationError> {
    if Language::normalize(language).is_none() {
        return Err(validator::ValidationError::new("unsupported_language"));
    }
    Ok(())
}

/// DTO for answering one question.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerRequest {
    pub question_id: i64,
    pub selected_answer: i64,
}

/// Descriptor returned when a session is created.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamCreatedResponse {
    pub exam_id: String,
    pub question_count: usize,
    pub language: Language,
    pub start_time: DateTime<Utc>,
    /// Minutes.
    pub duration: u64,
    pub duration_ms: u64,
    pub expires_at: DateTime<Utc>,
    pub current_question: usize,
    pub total_questions: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamInfo {
    pub exam_id: String,
    pub language: Language,
    pub question_count: usize,
    pub start_time: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamQuestionResponse {
    pub question: PublicQuestion,
    pub question_index: usize,
    pub total_questions: usize,
    pub user_answer: Option<i64>,
    pub is_answered: bool,
    pub exam_info: ExamInfo,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResponse {
    pub is_correct: bool,
    pub correct_answer: AnswerText,
    pub selected_answer: AnswerText,
    pub explanation: Option<String>,
}

impl From<AnswerOutcome> for AnswerResponse {
    fn from(o: AnswerOutcome) -> Self {
        Self {
            is_correct: o.is_correct,
            correct_answer: o.correct_answer,
            selected_answer: o.selected_answer,
            explanation: o.explanation,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamResults {
    pub total_questions: usize,
    pub answered_questions: usize,
    pub correct_answers: usize,
    pub wrong_answers: usize,
    pub unanswered_questions: usize,
    pub percentage: u32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Minutes spent, rounded.
    pub duration: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamCompletedResponse {
    pub exam_id: String,
    pub results: ExamResults,
}

impl From<&FinishedExam> for ExamCompletedResponse {
    fn from(f: &FinishedExam) -> Self {
        let seconds = (f.ended_at - f.started_at).num_seconds();
        Self {
            exam_id: f.exam_id.clone(),
            results: ExamResults {
                total_questions: f.tally.total,
                answered_questions: f.tally.answered,
                correct_answers: f.tally.correct,
                wrong_answers: f.tally.wrong,
                unanswered_questions: f.tally.unanswered,
                percentage: f.tally.percentage,
                start_time: f.started_at,
                end_time: f.ended_at,
                duration: (seconds as f64 / 60.0).round() as i64,
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamStatusResponse {
    pub exam_id: String,
    pub exam_status: ExamStatus,
    pub language: Language,
    pub question_count: usize,
    pub total_questions: usize,
    pub answered_questions: usize,
    pub correct_answers: usize,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
}

impl From<&ExamSession> for ExamStatusResponse {
    fn from(s: &ExamSession) -> Self {
        Self {
            exam_id: s.id.clone(),
            exam_status: s.status,
            language: s.language,
            question_count: s.length.question_count(),
            total_questions: s.questions.len(),
            answered_questions: s.answers.len(),
            correct_answers: s.correct_count(),
            start_time: s.started_at,
            end_time: s.ended_at,
            expires_at: s.expires_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{Answer, ContentKind, ContentPart, Question};

    fn question(id: i64) -> PooledQuestion {
        let part = |v: &str| ContentPart {
            kind: ContentKind::Text,
            value: v.to_string(),
        };
        PooledQuestion {
            template_id: 3,
            question: Question {
                id,
                body: vec![part("Question")],
                answers: vec![
                    Answer { id: id * 10 + 1, body: vec![part("right"), part("one")], is_correct: true },
                    Answer { id: id * 10 + 2, body: vec![part("wrong")], is_correct: false },
                ],
                explanation: None,
            },
        }
    }

    fn session() -> ExamSession {
        ExamSession::new(
            "exam_1_test".to_string(),
            1,
            Language::Uz,
            ExamLength::Short,
            (1..=20).map(question).collect(),
            Utc::now(),
        )
    }

    #[test]
    fn test_language_normalization() {
        assert_eq!(Language::normalize("uz_kiril"), Some(Language::Kiril));
        assert_eq!(Language::normalize("kiril"), Some(Language::Kiril));
        assert_eq!(Language::normalize("kaa"), Some(Language::Kaa));
        assert_eq!(Language::normalize("en"), None);
        assert_eq!(Language::normalize("UZ"), None);
    }

    #[test]
    fn test_exam_length_durations() {
        assert_eq!(ExamLength::try_from(20u32).unwrap().duration().as_millis(), 1_200_000);
        assert_eq!(ExamLength::try_from(50u32).unwrap().duration().as_millis(), 2_700_000);
        assert!(ExamLength::try_from(30u32).is_err());
    }

    #[test]
    fn test_expires_at_is_start_plus_duration() {
        let s = session();
        assert_eq!((s.expires_at - s.started_at).num_milliseconds(), 1_200_000);
        assert_eq!(s.duration_ms(), 1_200_000);
    }

    #[test]
    fn test_answer_once() {
        let mut s = session();
        let first = s.record_answer(1, 12).unwrap();
        assert!(!first.is_correct);
        assert_eq!(first.correct_answer.text, "right one");

        let second = s.record_answer(1, 11);
        assert!(matches!(second, Err(AppError::AlreadyAnswered(1))));
        assert_eq!(
            s.answers[&1],
            RecordedAnswer { selected_answer_id: 12, is_correct: false }
        );
    }

    #[test]
    fn test_unknown_question_and_answer() {
        let mut s = session();
        assert!(matches!(s.record_answer(99, 1), Err(AppError::NotFound(_))));
        assert!(matches!(s.record_answer(1, 99), Err(AppError::NotFound(_))));
        assert!(s.answers.is_empty());
    }

    #[test]
    fn test_close_only_once() {
        let mut s = session();
        s.record_answer(1, 11).unwrap();
        s.record_answer(2, 22).unwrap();

        let finished = s.close(ExamStatus::Completed, Utc::now()).unwrap();
        assert_eq!(finished.tally.correct, 1);
        assert_eq!(finished.tally.wrong, 1);
        assert_eq!(finished.mistakes.len(), 1);
        assert_eq!(finished.mistakes[0].selected_answer_id, 22);
        assert!(s.expiry.is_cancelled());

        assert!(s.close(ExamStatus::Expired, Utc::now()).is_none());
        assert_eq!(s.status, ExamStatus::Completed);
        assert!(matches!(s.record_answer(3, 31), Err(AppError::InvalidState(_))));
    }

    #[test]
    fn test_tally_adds_up() {
        for (answered, correct) in [(0, 0), (1, 1), (7, 3), (20, 20)] {
            let t = Tally::from_results(20, answered, correct);
            assert_eq!(t.correct + t.wrong + t.unanswered, 20);
        }
        assert_eq!(Tally::from_results(20, 1, 1).percentage, 5);
        assert_eq!(Tally::from_results(50, 1, 1).percentage, 2);
        assert_eq!(Tally::from_results(50, 40, 33).percentage, 66);
    }
}

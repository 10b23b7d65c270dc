// src/models/history.rs

use crate::models::exam::Language;

/// A wrongly answered question, appended to the 'histories' table for the
/// mistakes review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub user_id: i64,
    pub language: Language,
    pub template_id: i64,
    pub question_id: i64,
    pub selected_answer_id: i64,
}

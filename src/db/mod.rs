// src/db/mod.rs

//! Persistence collaborators of the exam core.
//!
//! Each store is a trait so the exam service can run against PostgreSQL in
//! production and against in-memory tables in tests.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        exam::{Language, Tally},
        history::HistoryRecord,
        question::Template,
        user::UserStats,
    },
};

/// Read-only access to the question templates.
#[async_trait]
pub trait QuestionBank: Send + Sync {
    async fn templates_by_language(&self, language: Language) -> Result<Vec<Template>, AppError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get(&self, user_id: i64) -> Result<Option<UserStats>, AppError>;

    /// Atomically counts one more exam and adds the tally's correct and wrong
    /// answers. Fails with `NotFound` when the user no longer exists.
    async fn apply_exam_result(&self, user_id: i64, tally: &Tally) -> Result<(), AppError>;
}

/// Append-only mistakes log.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    async fn append(&self, record: HistoryRecord) -> Result<(), AppError>;
}

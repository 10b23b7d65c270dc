// src/db/memory.rs

//! In-process stores used by tests and local runs without a database.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    db::{HistoryRepository, QuestionBank, UserRepository},
    error::AppError,
    models::{
        exam::{Language, Tally},
        history::HistoryRecord,
        question::{Question, Template},
        user::UserStats,
    },
};

#[derive(Default)]
pub struct MemoryQuestionBank {
    templates: RwLock<Vec<Template>>,
}

impl MemoryQuestionBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_template(&self, id: i64, language: Language, questions: Vec<Question>) {
        self.templates.write().await.push(Template {
            id,
            language,
            questions,
        });
    }
}

#[async_trait]
impl QuestionBank for MemoryQuestionBank {
    async fn templates_by_language(&self, language: Language) -> Result<Vec<Template>, AppError> {
        Ok(self
            .templates
            .read()
            .await
            .iter()
            .filter(|t| t.language == language)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryUserRepository {
    users: RwLock<HashMap<i64, UserStats>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, user: UserStats) {
        self.users.write().await.insert(user.id, user);
    }

    pub async fn remove(&self, user_id: i64) {
        self.users.write().await.remove(&user_id);
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn get(&self, user_id: i64) -> Result<Option<UserStats>, AppError> {
        Ok(self.users.read().await.get(&user_id).cloned())
    }

    async fn apply_exam_result(&self, user_id: i64, tally: &Tally) -> Result<(), AppError> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&user_id)
            .ok_or(AppError::NotFound(format!("User {} not found", user_id)))?;

        user.tests_used += 1;
        user.total_tests += 1;
        user.total_correct += tally.correct as i64;
        user.total_wrong += tally.wrong as i64;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryHistoryRepository {
    records: RwLock<Vec<HistoryRecord>>,
}

impl MemoryHistoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<HistoryRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl HistoryRepository for MemoryHistoryRepository {
    async fn append(&self, record: HistoryRecord) -> Result<(), AppError> {
        self.records.write().await.push(record);
        Ok(())
    }
}

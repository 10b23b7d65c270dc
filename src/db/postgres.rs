// src/db/postgres.rs

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, types::Json};

use crate::{
    db::{HistoryRepository, QuestionBank, UserRepository},
    error::AppError,
    models::{
        exam::{Language, Tally},
        history::HistoryRecord,
        question::{Template, TemplateDocument},
        user::{UserStats, UserStatsRow},
    },
};

/// Represents a row of the 'templates' table.
#[derive(FromRow)]
struct TemplateRow {
    id: i64,
    template: Json<TemplateDocument>,
}

#[derive(Clone)]
pub struct PgQuestionBank {
    pool: PgPool,
}

impl PgQuestionBank {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuestionBank for PgQuestionBank {
    async fn templates_by_language(&self, language: Language) -> Result<Vec<Template>, AppError> {
        let rows = sqlx::query_as::<_, TemplateRow>(
            "SELECT id, template FROM templates WHERE template_lang = $1 ORDER BY id",
        )
        .bind(language.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch templates for {}: {:?}", language, e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(rows
            .into_iter()
            .map(|row| Template {
                id: row.id,
                language,
                questions: row.template.0.questions,
            })
            .collect())
    }
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn get(&self, user_id: i64) -> Result<Option<UserStats>, AppError> {
        let row = sqlx::query_as::<_, UserStatsRow>(
            r#"
            SELECT id, plan, plan_expires_at, tests_used, total_tests, total_correct, total_wrong
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserStats::from))
    }

    async fn apply_exam_result(&self, user_id: i64, tally: &Tally) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                tests_used = tests_used + 1,
                total_tests = total_tests + 1,
                total_correct = total_correct + $2,
                total_wrong = total_wrong + $3,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(tally.correct as i64)
        .bind(tally.wrong as i64)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct PgHistoryRepository {
    pool: PgPool,
}

impl PgHistoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HistoryRepository for PgHistoryRepository {
    async fn append(&self, record: HistoryRecord) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO histories (user_id, template_lang, template_id, question_id, selected_answer_id)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(record.user_id)
        .bind(record.language.as_str())
        .bind(record.template_id)
        .bind(record.question_id)
        .bind(record.selected_answer_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

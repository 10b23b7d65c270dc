// src/exam/reconcile.rs

use std::sync::Arc;

use crate::{
    db::{HistoryRepository, UserRepository},
    models::{
        exam::{EXAM_TEMPLATE_ID, FinishedExam},
        history::HistoryRecord,
    },
};

/// Folds a finished session into the owner's persistent statistics.
///
/// Runs from request handlers and from expiry timers alike, so nothing is
/// returned: failures are logged and dropped.
pub struct Reconciler {
    users: Arc<dyn UserRepository>,
    history: Arc<dyn HistoryRepository>,
}

impl Reconciler {
    pub fn new(users: Arc<dyn UserRepository>, history: Arc<dyn HistoryRepository>) -> Self {
        Self { users, history }
    }

    pub async fn reconcile(&self, finished: &FinishedExam) {
        if let Err(e) = self
            .users
            .apply_exam_result(finished.owner_id, &finished.tally)
            .await
        {
            tracing::error!(
                "Failed to update statistics of user {} for exam {}: {:?}",
                finished.owner_id,
                finished.exam_id,
                e
            );
        }

        for mistake in &finished.mistakes {
            tracing::debug!(
                "Recording mistake on question {} (template {}) for exam {}",
                mistake.question_id,
                mistake.template_id,
                finished.exam_id
            );

            let record = HistoryRecord {
                user_id: finished.owner_id,
                language: finished.language,
                template_id: EXAM_TEMPLATE_ID,
                question_id: mistake.question_id,
                selected_answer_id: mistake.selected_answer_id,
            };

            if let Err(e) = self.history.append(record).await {
                tracing::error!(
                    "Failed to record mistake on question {} for exam {}: {:?}",
                    mistake.question_id,
                    finished.exam_id,
                    e
                );
            }
        }

        tracing::info!(
            "Exam {} reconciled for user {}: {}/{} correct ({:?})",
            finished.exam_id,
            finished.owner_id,
            finished.tally.correct,
            finished.tally.total,
            finished.status
        );
    }
}

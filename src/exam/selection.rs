// src/exam/selection.rs

use std::collections::HashSet;

use rand::Rng;

use crate::{
    db::QuestionBank,
    error::AppError,
    models::{
        exam::{ExamLength, Language},
        question::PooledQuestion,
    },
};

/// Builds the question list of a new exam.
///
/// Every template of `language` is flattened into one pool. A question id
/// that appears in several templates is only pooled once, so the exam never
/// holds two questions with the same id.
pub async fn create_pool(
    bank: &dyn QuestionBank,
    language: Language,
    length: ExamLength,
) -> Result<Vec<PooledQuestion>, AppError> {
    let templates = bank.templates_by_language(language).await?;

    let mut seen = HashSet::new();
    let pool: Vec<PooledQuestion> = templates
        .into_iter()
        .flat_map(|template| {
            let template_id = template.id;
            template
                .questions
                .into_iter()
                .map(move |question| PooledQuestion {
                    template_id,
                    question,
                })
        })
        .filter(|pooled| seen.insert(pooled.question.id))
        .collect();

    let required = length.question_count();
    if pool.len() < required {
        tracing::warn!(
            "Question pool for {} too small: {} available, {} required",
            language,
            pool.len(),
            required
        );
        return Err(AppError::InsufficientPool {
            available: pool.len(),
            required,
        });
    }

    Ok(select_questions(pool, required, &mut rand::thread_rng()))
}

/// Fisher-Yates shuffle of the whole pool, then keeps the first `count`.
/// Every permutation is equally likely.
pub fn select_questions<T, R: Rng + ?Sized>(mut pool: Vec<T>, count: usize, rng: &mut R) -> Vec<T> {
    for i in (1..pool.len()).rev() {
        let j = rng.gen_range(0..=i);
        pool.swap(i, j);
    }
    pool.truncate(count);
    pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryQuestionBank;
    use crate::models::question::{Answer, ContentKind, ContentPart, Question};

    fn question(id: i64) -> Question {
        Question {
            id,
            body: vec![ContentPart {
                kind: ContentKind::Text,
                value: format!("Question {}", id),
            }],
            answers: vec![Answer {
                id: id * 10 + 1,
                body: vec![],
                is_correct: true,
            }],
            explanation: None,
        }
    }

    #[test]
    fn test_select_keeps_count_and_uniqueness() {
        let pool: Vec<i64> = (0..40).collect();
        let picked = select_questions(pool, 20, &mut rand::thread_rng());
        assert_eq!(picked.len(), 20);
        let unique: HashSet<_> = picked.iter().collect();
        assert_eq!(unique.len(), 20);
    }

    #[test]
    fn test_select_whole_pool_is_a_permutation() {
        let pool: Vec<i64> = (0..20).collect();
        let mut picked = select_questions(pool.clone(), 20, &mut rand::thread_rng());
        picked.sort();
        assert_eq!(picked, pool);
    }

    #[test]
    fn test_selection_covers_pool_evenly() {
        // 20 of 40 over 4000 runs: each item is expected 2000 times.
        let mut hits = [0u32; 40];
        let mut first_slot = [0u32; 40];
        let mut rng = rand::thread_rng();
        for _ in 0..4000 {
            let picked = select_questions((0..40usize).collect(), 20, &mut rng);
            first_slot[picked[0]] += 1;
            for i in picked {
                hits[i] += 1;
            }
        }
        for count in hits {
            assert!((1700..=2300).contains(&count), "skewed selection: {}", count);
        }
        for count in first_slot {
            assert!((40..=170).contains(&count), "skewed first slot: {}", count);
        }
    }

    #[tokio::test]
    async fn test_pool_only_uses_requested_language() {
        let bank = MemoryQuestionBank::new();
        bank.add_template(1, Language::Uz, (1..=15).map(question).collect()).await;
        bank.add_template(2, Language::Uz, (16..=30).map(question).collect()).await;
        bank.add_template(3, Language::Ru, (100..=200).map(question).collect()).await;

        let pool = create_pool(&bank, Language::Uz, ExamLength::Short).await.unwrap();
        assert_eq!(pool.len(), 20);
        assert!(pool.iter().all(|p| (1..=30).contains(&p.question.id)));
        assert!(pool.iter().all(|p| p.template_id == 1 || p.template_id == 2));
    }

    #[tokio::test]
    async fn test_insufficient_pool() {
        let bank = MemoryQuestionBank::new();
        bank.add_template(1, Language::Kaa, (1..=49).map(question).collect()).await;

        let err = create_pool(&bank, Language::Kaa, ExamLength::Full).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::InsufficientPool { available: 49, required: 50 }
        ));

        let err = create_pool(&bank, Language::Ru, ExamLength::Short).await.unwrap_err();
        assert!(matches!(err, AppError::InsufficientPool { available: 0, .. }));
    }

    #[tokio::test]
    async fn test_duplicate_ids_across_templates_are_pooled_once() {
        let bank = MemoryQuestionBank::new();
        bank.add_template(1, Language::Ru, (1..=20).map(question).collect()).await;
        bank.add_template(2, Language::Ru, (1..=20).map(question).collect()).await;

        let pool = create_pool(&bank, Language::Ru, ExamLength::Short).await.unwrap();
        let ids: HashSet<i64> = pool.iter().map(|p| p.question.id).collect();
        assert_eq!(ids.len(), 20);
    }
}

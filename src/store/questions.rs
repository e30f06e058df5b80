//! Question bank (spec.md §3, §9: "treat the question bank as an
//! external interface — this server does not own content authoring").
//!
//! Grounded on the earlier own preference for plain `serde_json` over a
//! database crate (`hosting::Casino` has no persistence layer at all);
//! the file-backed implementation here is the same shape, a JSON blob
//! loaded once and held in memory.

use crate::model::category::{Category, CategoryId};
use crate::model::question::{Question, QuestionId};
use async_trait::async_trait;
use rand::seq::IteratorRandom;
use std::collections::HashSet;

#[async_trait]
pub trait QuestionStore: Send + Sync {
    async fn categories(&self) -> anyhow::Result<Vec<Category>>;

    /// One question from `category_id`, excluding ids already in `used`.
    /// Returns `None` when the category is exhausted.
    async fn random_question(
        &self,
        category_id: &CategoryId,
        used: &HashSet<QuestionId>,
    ) -> anyhow::Result<Option<Question>>;

    /// `count` hot-button questions drawn from anywhere in the bank,
    /// excluding `used`.
    async fn random_hot_button_questions(
        &self,
        count: usize,
        used: &HashSet<QuestionId>,
    ) -> anyhow::Result<Vec<Question>>;

    /// One collective-list question, optionally pinned to `category_id`.
    async fn random_collective_list_question(
        &self,
        category_id: Option<&CategoryId>,
        used: &HashSet<QuestionId>,
    ) -> anyhow::Result<Option<Question>>;
}

/// Loads the whole bank from a JSON file once at startup and serves it
/// from memory. Good enough for a single-process deployment (spec.md's
/// Non-goals exclude clustering, so there is no cache-invalidation story
/// to design for).
pub struct JsonFileQuestionStore {
    categories: Vec<Category>,
    questions: Vec<Question>,
}

#[derive(serde::Deserialize)]
struct Bank {
    categories: Vec<Category>,
    questions: Vec<Question>,
}

impl JsonFileQuestionStore {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read question bank at {path}: {e}"))?;
        let bank: Bank = serde_json::from_str(&raw)?;
        Ok(Self {
            categories: bank.categories,
            questions: bank.questions,
        })
    }
}

#[async_trait]
impl QuestionStore for JsonFileQuestionStore {
    async fn categories(&self) -> anyhow::Result<Vec<Category>> {
        Ok(self.categories.clone())
    }

    async fn random_question(
        &self,
        category_id: &CategoryId,
        used: &HashSet<QuestionId>,
    ) -> anyhow::Result<Option<Question>> {
        let candidate = self
            .questions
            .iter()
            .filter(|q| &q.category_id == category_id && !used.contains(&q.id) && !q.is_hot_button() && !q.is_collective_list())
            .choose(&mut rand::rng());
        Ok(candidate.cloned())
    }

    async fn random_hot_button_questions(
        &self,
        count: usize,
        used: &HashSet<QuestionId>,
    ) -> anyhow::Result<Vec<Question>> {
        let pool: Vec<&Question> = self
            .questions
            .iter()
            .filter(|q| q.is_hot_button() && !used.contains(&q.id))
            .collect();
        let mut rng = rand::rng();
        let picked = (0..count)
            .filter_map(|_| pool.iter().choose(&mut rng).copied())
            .cloned()
            .collect::<Vec<_>>();
        Ok(picked)
    }

    async fn random_collective_list_question(
        &self,
        category_id: Option<&CategoryId>,
        used: &HashSet<QuestionId>,
    ) -> anyhow::Result<Option<Question>> {
        let candidate = self
            .questions
            .iter()
            .filter(|q| {
                q.is_collective_list()
                    && !used.contains(&q.id)
                    && category_id.is_none_or(|c| &q.category_id == c)
            })
            .choose(&mut rand::rng());
        Ok(candidate.cloned())
    }
}

/// A question store with nothing in it, for phase-handler unit tests that
/// never reach a question-store call.
#[cfg(test)]
pub mod tests_support {
    use super::*;

    pub struct EmptyStore;

    #[async_trait]
    impl QuestionStore for EmptyStore {
        async fn categories(&self) -> anyhow::Result<Vec<Category>> {
            Ok(Vec::new())
        }
        async fn random_question(
            &self,
            _category_id: &CategoryId,
            _used: &HashSet<QuestionId>,
        ) -> anyhow::Result<Option<Question>> {
            Ok(None)
        }
        async fn random_hot_button_questions(
            &self,
            _count: usize,
            _used: &HashSet<QuestionId>,
        ) -> anyhow::Result<Vec<Question>> {
            Ok(Vec::new())
        }
        async fn random_collective_list_question(
            &self,
            _category_id: Option<&CategoryId>,
            _used: &HashSet<QuestionId>,
        ) -> anyhow::Result<Option<Question>> {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::question::{Difficulty, QuestionContent};

    fn sample_bank() -> JsonFileQuestionStore {
        let geo = CategoryId("geo".into());
        let make = |id: &str, kind: QuestionContent| Question {
            id: QuestionId(id.into()),
            category_id: geo.clone(),
            text: format!("question {id}"),
            difficulty: Difficulty::Easy,
            content: kind,
            explanation: None,
        };
        JsonFileQuestionStore {
            categories: vec![Category {
                id: geo.clone(),
                slug: "geo".into(),
                name: "Geography".into(),
                icon: "globe".into(),
                is_active: true,
                sort_order: 0,
            }],
            questions: vec![
                make(
                    "q1",
                    QuestionContent::Choice {
                        correct_answer: "Paris".into(),
                        incorrect_answers: vec!["Lyon".into()],
                    },
                ),
                make(
                    "q2",
                    QuestionContent::HotButton {
                        correct_answer: "Paris".into(),
                        accepted_answers: vec![],
                        reveal_speed_ms: None,
                        points_correct: 500,
                        points_wrong: -200,
                    },
                ),
            ],
        }
    }

    #[tokio::test]
    async fn random_question_excludes_used_ids() {
        let store = sample_bank();
        let mut used = HashSet::new();
        used.insert(QuestionId("q1".into()));
        let result = store
            .random_question(&CategoryId("geo".into()), &used)
            .await
            .unwrap();
        assert!(result.is_none(), "only candidate was excluded");
    }

    #[tokio::test]
    async fn random_hot_button_questions_only_returns_hot_button_kind() {
        let store = sample_bank();
        let picked = store
            .random_hot_button_questions(5, &HashSet::new())
            .await
            .unwrap();
        assert!(picked.iter().all(|q| q.content_kind() == "hot_button"));
    }
}

//! Question entity (spec.md §3.1). `content` is a tagged sum with four
//! disjoint shapes, per the design note in spec.md §9: "pattern-match on
//! the tag, no inheritance hierarchy" — grounded on the prior design's own
//! tagged-sum `Event`/`ServerMessage` enums in `gameroom/`.

use crate::model::category::CategoryId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct QuestionId(pub String);

impl std::fmt::Display for QuestionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CollectiveListItem {
    pub id: String,
    pub display: String,
    pub aliases: Vec<String>,
    pub group: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionContent {
    Choice {
        correct_answer: String,
        incorrect_answers: Vec<String>,
    },
    Estimation {
        correct_value: f64,
        unit: String,
    },
    HotButton {
        correct_answer: String,
        accepted_answers: Vec<String>,
        reveal_speed_ms: Option<u64>,
        points_correct: i64,
        points_wrong: i64,
    },
    CollectiveList {
        topic: String,
        description: Option<String>,
        items: Vec<CollectiveListItem>,
        time_per_turn_secs: u64,
        points_per_correct: i64,
        fuzzy_threshold: f32,
    },
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub category_id: CategoryId,
    pub text: String,
    pub difficulty: Difficulty,
    pub content: QuestionContent,
    pub explanation: Option<String>,
}

impl Question {
    pub fn is_choice(&self) -> bool {
        matches!(self.content, QuestionContent::Choice { .. })
    }
    pub fn is_estimation(&self) -> bool {
        matches!(self.content, QuestionContent::Estimation { .. })
    }
    pub fn is_hot_button(&self) -> bool {
        matches!(self.content, QuestionContent::HotButton { .. })
    }
    pub fn is_collective_list(&self) -> bool {
        matches!(self.content, QuestionContent::CollectiveList { .. })
    }
    pub fn content_kind(&self) -> &'static str {
        match self.content {
            QuestionContent::Choice { .. } => "choice",
            QuestionContent::Estimation { .. } => "estimation",
            QuestionContent::HotButton { .. } => "hot_button",
            QuestionContent::CollectiveList { .. } => "collective_list",
        }
    }
}

//! Hot-button bonus round state (spec.md §4.6).

use crate::ids::PlayerId;
use crate::model::question::Question;
use crate::time::ServerTime;
use std::collections::HashMap;
use std::collections::HashSet;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HotButtonPhase {
    Intro,
    QuestionReveal,
    Answering,
    /// Holding `REBUZZ_DELAY` after a wrong-but-rebuzzable answer, before
    /// the buzzer reopens (spec.md §4.6: "after REBUZZ_DELAY re-enter
    /// question_reveal").
    RebuzzPending,
    Result,
    Finished,
}

#[derive(Debug, Clone, serde::Serialize)]
pub enum HotButtonOutcome {
    Correct { player_id: PlayerId, points: i64 },
    Wrong { attempted_by: Vec<PlayerId> },
    NoBuzz,
}

/// Per-question runtime state. Recreated by `phase::bonus::hot_button` at
/// the start of every question, but `question_start_time` and
/// `original_buzzer_timer_end` are preserved verbatim across a rebuzz
/// (spec.md invariant: "the second buzzer window ends no later than the
/// original window computed at question start").
#[derive(Debug, Clone, serde::Serialize)]
pub struct HotButtonQuestionState {
    pub question: Question,
    pub revealed_chars: usize,
    pub is_fully_revealed: bool,
    pub question_start_time: ServerTime,
    pub original_buzzer_timer_end: ServerTime,
    pub buzzed_player_id: Option<PlayerId>,
    pub buzz_timestamps: HashMap<PlayerId, ServerTime>,
    pub buzz_order: Vec<PlayerId>,
    pub attempted_player_ids: HashSet<PlayerId>,
}

impl HotButtonQuestionState {
    pub fn text(&self) -> &str {
        &self.question.text
    }

    pub fn revealed_percent(&self) -> f64 {
        let len = self.text().chars().count().max(1);
        self.revealed_chars as f64 / len as f64
    }

    pub fn can_rebuzz(&self, max_rebuzz_attempts: u32, allow_rebuzz: bool, total_players: usize) -> bool {
        allow_rebuzz
            && (self.attempted_player_ids.len() as u32) < max_rebuzz_attempts
            && self.attempted_player_ids.len() < total_players
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PlayerScoreBreakdown {
    pub player_id: PlayerId,
    pub points: i64,
    pub rank: u32,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ServerHotButtonState {
    pub questions: Vec<Question>,
    pub current_question_index: usize,
    pub current: Option<HotButtonQuestionState>,
    #[serde(skip)]
    pub buzzer_timeout: Duration,
    #[serde(skip)]
    pub answer_timeout: Duration,
    pub max_rebuzz_attempts: u32,
    pub allow_rebuzz: bool,
    pub player_scores: HashMap<PlayerId, i64>,
    pub question_history: Vec<HotButtonOutcome>,
    pub phase: HotButtonPhase,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::category::CategoryId;
    use crate::model::question::{Difficulty, QuestionContent, QuestionId};

    fn sample_question(text: &str) -> Question {
        Question {
            id: QuestionId("q1".into()),
            category_id: CategoryId("geo".into()),
            text: text.into(),
            difficulty: Difficulty::Medium,
            content: QuestionContent::HotButton {
                correct_answer: "Paris".into(),
                accepted_answers: vec!["paris".into()],
                reveal_speed_ms: None,
                points_correct: 500,
                points_wrong: -200,
            },
            explanation: None,
        }
    }

    #[test]
    fn revealed_percent_is_fraction_of_text_length() {
        let state = HotButtonQuestionState {
            question: sample_question("abcdefghij"),
            revealed_chars: 5,
            is_fully_revealed: false,
            question_start_time: 0,
            original_buzzer_timer_end: 25_000,
            buzzed_player_id: None,
            buzz_timestamps: HashMap::new(),
            buzz_order: Vec::new(),
            attempted_player_ids: HashSet::new(),
        };
        assert_eq!(state.revealed_percent(), 0.5);
    }

    #[test]
    fn can_rebuzz_respects_attempts_and_players() {
        let mut state = HotButtonQuestionState {
            question: sample_question("abcdefghij"),
            revealed_chars: 10,
            is_fully_revealed: true,
            question_start_time: 0,
            original_buzzer_timer_end: 25_000,
            buzzed_player_id: None,
            buzz_timestamps: HashMap::new(),
            buzz_order: Vec::new(),
            attempted_player_ids: HashSet::new(),
        };
        assert!(state.can_rebuzz(2, true, 2));
        state.attempted_player_ids.insert(PlayerId::generate(&mut rand::rng()));
        state.attempted_player_ids.insert(PlayerId::generate(&mut rand::rng()));
        assert!(!state.can_rebuzz(2, true, 2), "no more players left to attempt");
    }
}

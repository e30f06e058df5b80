//! Match settings (spec.md §3.2) — immutable for the lifetime of one match.

use crate::model::category::CategoryId;
use crate::model::question::QuestionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryMode {
    Voting,
    Wheel,
    LosersPick,
    DiceRoyale,
    RpsDuel,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CustomRoundSpec {
    QuestionRound {
        category_mode: Option<CategoryMode>,
        category_id: Option<CategoryId>,
    },
    HotButton,
    CollectiveList {
        specific_question_id: Option<QuestionId>,
    },
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MatchSettings {
    pub max_rounds: u8,
    pub questions_per_round: u8,
    pub time_per_question_secs: u32,
    pub bonus_round_chance: u8,
    pub final_round_always_bonus: bool,
    pub hot_button_questions_per_round: u8,
    pub custom_mode: bool,
    pub custom_rounds: Vec<CustomRoundSpec>,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            max_rounds: 6,
            questions_per_round: 5,
            time_per_question_secs: 20,
            bonus_round_chance: 25,
            final_round_always_bonus: true,
            hot_button_questions_per_round: 5,
            custom_mode: false,
            custom_rounds: Vec::new(),
        }
    }
}

impl MatchSettings {
    /// Clamps every option to the bounds named in spec.md §3.2. Used by
    /// `create_room` so a malformed client payload can't produce an
    /// unplayable match instead of being rejected outright.
    pub fn clamped(mut self) -> Self {
        self.max_rounds = self.max_rounds.clamp(1, 20);
        self.questions_per_round = self.questions_per_round.clamp(1, 20);
        self.time_per_question_secs = self.time_per_question_secs.clamp(5, 60);
        self.bonus_round_chance = self.bonus_round_chance.min(100);
        self.hot_button_questions_per_round = self.hot_button_questions_per_round.clamp(1, 10);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamped_enforces_bounds() {
        let settings = MatchSettings {
            max_rounds: 99,
            questions_per_round: 0,
            time_per_question_secs: 1,
            bonus_round_chance: 255,
            hot_button_questions_per_round: 0,
            ..MatchSettings::default()
        }
        .clamped();
        assert_eq!(settings.max_rounds, 20);
        assert_eq!(settings.questions_per_round, 1);
        assert_eq!(settings.time_per_question_secs, 5);
        assert_eq!(settings.bonus_round_chance, 100);
        assert_eq!(settings.hot_button_questions_per_round, 1);
    }
}

//! Match state (spec.md §3.3) and the category-selection sub-protocol
//! state (spec.md §4.4) that hangs off it.

use crate::ids::PlayerId;
use crate::model::bonus::BonusRoundState;
use crate::model::category::CategoryId;
use crate::model::question::{Question, QuestionId};
use crate::time::{PhaseToken, ServerTime};
use std::collections::HashMap;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Lobby,
    RoundAnnouncement,
    CategoryAnnouncement,
    CategoryVoting,
    CategoryWheel,
    CategoryLosersPick,
    CategoryDiceRoyale,
    CategoryRpsDuel,
    Question,
    Revealing,
    Estimation,
    EstimationReveal,
    Scoreboard,
    BonusRoundAnnouncement,
    BonusRound,
    BonusRoundResult,
    Final,
    RematchVoting,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlayerAnswer {
    Choice { index: usize },
    Estimation { value: f64 },
}

/// One answer submission, server-stamped at receive time.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct SubmittedAnswer {
    pub answer: PlayerAnswer,
    pub received_at: ServerTime,
}

/// The question currently being presented. For choice questions the
/// server shuffles once at question start and records the resulting
/// correct index (spec.md §4.3: "answer order is shuffled once on the
/// server and the shuffled correct index recorded").
#[derive(Debug, Clone, serde::Serialize)]
pub struct ActiveQuestion {
    pub question: Question,
    pub shuffled_answers: Option<Vec<String>>,
    pub correct_index: Option<usize>,
    pub question_started_at: ServerTime,
    pub answers: HashMap<PlayerId, SubmittedAnswer>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiceRoyalePhase {
    Rolling,
    Reroll,
    Result,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct DiceRoyaleState {
    pub player_rolls: HashMap<PlayerId, Option<(u8, u8)>>,
    pub tied_player_ids: Vec<PlayerId>,
    pub phase: DiceRoyalePhase,
    pub round: u32,
    /// `true` between a `dice_royale_tie` broadcast and the reroll window
    /// reopening; disambiguates the hold timer from the roll-window timer,
    /// both of which fire while `phase == Reroll`.
    pub awaiting_reroll: bool,
}

impl DiceRoyaleState {
    pub fn eligible_players(&self) -> impl Iterator<Item = &PlayerId> {
        self.player_rolls.keys()
    }

    pub fn all_rolled(&self) -> bool {
        self.player_rolls.values().all(|roll| roll.is_some())
    }

    pub fn highest_sum_winners(&self) -> Vec<PlayerId> {
        let best = self
            .player_rolls
            .values()
            .filter_map(|r| r.map(|(a, b)| a as u32 + b as u32))
            .max();
        let Some(best) = best else { return Vec::new() };
        self.player_rolls
            .iter()
            .filter_map(|(id, roll)| {
                roll.and_then(|(a, b)| (a as u32 + b as u32 == best).then(|| id.clone()))
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RpsChoice {
    Rock,
    Paper,
    Scissors,
}

impl RpsChoice {
    /// `true` if `self` beats `other` (rock > scissors > paper > rock).
    pub fn beats(self, other: Self) -> bool {
        matches!(
            (self, other),
            (Self::Rock, Self::Scissors) | (Self::Paper, Self::Rock) | (Self::Scissors, Self::Paper)
        )
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct RpsDuelState {
    pub player_a: PlayerId,
    pub player_b: PlayerId,
    pub round: u32,
    pub wins_a: u32,
    pub wins_b: u32,
    pub choice_a: Option<RpsChoice>,
    pub choice_b: Option<RpsChoice>,
}

impl RpsDuelState {
    /// Best-of-three, extended indefinitely while exactly tied after an
    /// odd round count (spec.md §4.4.5).
    pub fn is_decided(&self) -> bool {
        if self.wins_a >= 2 || self.wins_b >= 2 {
            return true;
        }
        self.round >= 3 && self.wins_a != self.wins_b
    }

    pub fn winner(&self) -> Option<&PlayerId> {
        if !self.is_decided() {
            return None;
        }
        if self.wins_a > self.wins_b {
            Some(&self.player_a)
        } else if self.wins_b > self.wins_a {
            Some(&self.player_b)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MatchState {
    pub phase: Phase,
    pub phase_token: PhaseToken,
    pub current_round: u32,
    pub round_questions: Vec<QuestionId>,
    pub current_question_index: usize,
    pub current_question: Option<ActiveQuestion>,
    pub timer_end: Option<ServerTime>,
    pub server_time: ServerTime,
    pub used_question_ids: HashSet<QuestionId>,
    pub used_bonus_question_ids: HashSet<QuestionId>,
    pub used_bonus_types: HashSet<crate::model::bonus::BonusType>,
    pub voting_categories: Vec<CategoryId>,
    pub category_votes: HashMap<PlayerId, CategoryId>,
    pub selected_category: Option<CategoryId>,
    pub wheel_selected_index: Option<usize>,
    pub loser_pick_player_id: Option<PlayerId>,
    pub dice_royale: Option<DiceRoyaleState>,
    pub rps_duel: Option<RpsDuelState>,
    pub bonus_round: Option<BonusRoundState>,
    pub rematch_votes: HashMap<PlayerId, bool>,
    pub last_loser_pick_round: Option<u32>,
    pub snippet_index: u32,
    pub question_tts_url: Option<String>,
    /// Per-player (id, points, correct) from the question just revealed.
    /// Cleared at the start of every question; read by the client-facing
    /// snapshot's `last_awards` projection.
    pub last_answer_awards: Vec<(PlayerId, i64, bool)>,
}

impl Default for MatchState {
    fn default() -> Self {
        Self {
            phase: Phase::Lobby,
            phase_token: 0,
            current_round: 0,
            round_questions: Vec::new(),
            current_question_index: 0,
            current_question: None,
            timer_end: None,
            server_time: 0,
            used_question_ids: HashSet::new(),
            used_bonus_question_ids: HashSet::new(),
            used_bonus_types: HashSet::new(),
            voting_categories: Vec::new(),
            category_votes: HashMap::new(),
            selected_category: None,
            wheel_selected_index: None,
            loser_pick_player_id: None,
            dice_royale: None,
            rps_duel: None,
            bonus_round: None,
            rematch_votes: HashMap::new(),
            last_loser_pick_round: None,
            snippet_index: 0,
            question_tts_url: None,
            last_answer_awards: Vec::new(),
        }
    }
}

impl MatchState {
    /// Bumps the phase token and installs a new phase. Callers are
    /// responsible for calling `TimerRegistry::clear_all` alongside this —
    /// the token bump alone only protects against *stale* callbacks that
    /// already escaped cancellation (spec.md §9).
    pub fn enter_phase(&mut self, phase: Phase) -> PhaseToken {
        self.phase = phase;
        self.phase_token += 1;
        self.timer_end = None;
        self.phase_token
    }

    pub fn arm_timer(&mut self, end: ServerTime) {
        self.timer_end = Some(end);
    }

    /// Invariant from spec.md §3.4 / §8.1: `timerEnd` is either null or
    /// strictly greater than `serverTime` in every broadcast.
    pub fn timer_end_is_valid(&self) -> bool {
        self.timer_end.is_none_or(|end| end > self.server_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_phase_bumps_token_and_clears_timer() {
        let mut state = MatchState::default();
        state.timer_end = Some(1_000);
        let token = state.enter_phase(Phase::Question);
        assert_eq!(token, 1);
        assert_eq!(state.phase, Phase::Question);
        assert!(state.timer_end.is_none());
    }

    #[test]
    fn rps_best_of_three_decides_on_two_wins() {
        let mut duel = RpsDuelState {
            player_a: PlayerId::generate(&mut rand::rng()),
            player_b: PlayerId::generate(&mut rand::rng()),
            round: 2,
            wins_a: 2,
            wins_b: 0,
            choice_a: None,
            choice_b: None,
        };
        assert!(duel.is_decided());
        assert_eq!(duel.winner(), Some(&duel.player_a.clone()));
        duel.wins_a = 1;
        duel.wins_b = 1;
        duel.round = 2;
        assert!(!duel.is_decided());
    }

    #[test]
    fn rps_choice_cycle() {
        assert!(RpsChoice::Rock.beats(RpsChoice::Scissors));
        assert!(RpsChoice::Paper.beats(RpsChoice::Rock));
        assert!(RpsChoice::Scissors.beats(RpsChoice::Paper));
        assert!(!RpsChoice::Rock.beats(RpsChoice::Rock));
        assert!(!RpsChoice::Rock.beats(RpsChoice::Paper));
    }

    #[test]
    fn dice_royale_highest_sum_detects_tie() {
        let mut rolls = HashMap::new();
        let p1 = PlayerId::generate(&mut rand::rng());
        let p2 = PlayerId::generate(&mut rand::rng());
        let p3 = PlayerId::generate(&mut rand::rng());
        rolls.insert(p1.clone(), Some((3, 4)));
        rolls.insert(p2.clone(), Some((1, 6)));
        rolls.insert(p3.clone(), Some((2, 2)));
        let state = DiceRoyaleState {
            player_rolls: rolls,
            tied_player_ids: Vec::new(),
            phase: DiceRoyalePhase::Rolling,
            round: 1,
            awaiting_reroll: false,
        };
        let mut winners = state.highest_sum_winners();
        winners.sort();
        let mut expected = vec![p1, p2];
        expected.sort();
        assert_eq!(winners, expected);
    }
}

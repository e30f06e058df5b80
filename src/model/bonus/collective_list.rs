//! Collective-list bonus round state (spec.md §4.5).
//!
//! Data only — mutation rules live in `phase::bonus::collective_list`,
//! mirroring the earlier split between `gameroom::table::Table` (data)
//! and `gameroom::room::Room` (behavior).

use crate::ids::PlayerId;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectiveListPhase {
    Intro,
    Playing,
    /// Holding `CORRECT_ANSWER_DELAY` for the reveal animation after a
    /// correct guess, before the next turn begins (spec.md §4.5).
    CorrectHold,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EliminationReason {
    Wrong,
    Skip,
    Timeout,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct EliminatedPlayer {
    pub player_id: PlayerId,
    pub reason: EliminationReason,
    pub rank: u32,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct RuntimeListItem {
    pub id: String,
    pub display: String,
    pub aliases: Vec<String>,
    pub group: Option<String>,
    pub guessed_by: Option<PlayerId>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PlayerScoreBreakdown {
    pub player_id: PlayerId,
    pub correct_answers: u32,
    pub correct_points: i64,
    pub rank_bonus: i64,
    pub total_points: i64,
    pub rank: u32,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ServerCollectiveListState {
    pub topic: String,
    pub items: Vec<RuntimeListItem>,
    pub guessed_ids: HashSet<String>,
    pub player_correct_counts: std::collections::HashMap<PlayerId, u32>,
    pub turn_order: Vec<PlayerId>,
    pub active_players: Vec<PlayerId>,
    pub current_turn_index: usize,
    pub turn_number: u64,
    pub eliminated_players: Vec<EliminatedPlayer>,
    pub points_per_correct: i64,
    pub time_per_turn_secs: u64,
    pub fuzzy_threshold: f32,
    pub phase: CollectiveListPhase,
}

impl ServerCollectiveListState {
    pub fn current_turn_player(&self) -> Option<&PlayerId> {
        if self.active_players.is_empty() {
            None
        } else {
            self.active_players
                .get(self.current_turn_index % self.active_players.len())
        }
    }

    pub fn all_guessed(&self) -> bool {
        self.guessed_ids.len() == self.items.len()
    }

    /// Invariant check used in tests: eliminated + active == turn order.
    pub fn accounts_for_everyone(&self) -> bool {
        self.eliminated_players.len() + self.active_players.len() == self.turn_order.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> ServerCollectiveListState {
        let players: Vec<PlayerId> = (0..3)
            .map(|i| PlayerId::generate(&mut rand::rngs::SmallRng::seed_from_u64(i)))
            .collect();
        ServerCollectiveListState {
            topic: "Capitals".into(),
            items: Vec::new(),
            guessed_ids: HashSet::new(),
            player_correct_counts: Default::default(),
            turn_order: players.clone(),
            active_players: players,
            current_turn_index: 0,
            turn_number: 0,
            eliminated_players: Vec::new(),
            points_per_correct: 50,
            time_per_turn_secs: 15,
            fuzzy_threshold: 0.8,
            phase: CollectiveListPhase::Playing,
        }
    }

    use rand::SeedableRng;

    #[test]
    fn current_turn_player_wraps_modulo_length() {
        let mut state = sample_state();
        state.current_turn_index = 4;
        assert_eq!(
            state.current_turn_player(),
            state.active_players.get(1)
        );
    }

    #[test]
    fn accounts_for_everyone_holds_initially() {
        let state = sample_state();
        assert!(state.accounts_for_everyone());
    }
}

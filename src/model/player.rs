//! Player entity and end-of-match statistics (spec.md §3.1, §4.3, §4.7).
//!
//! Grounded on `gameroom::room::Room::user`/`HandContext` for the
//! "imperative shell owns mutable per-participant state" shape, adapted
//! from poker hand stats to quiz stats.

use crate::ids::{PlayerId, SocketId};
use crate::model::category::CategoryId;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct CategoryAccuracy {
    pub correct: u32,
    pub total: u32,
}

impl CategoryAccuracy {
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }
}

/// Per-player running statistics, accumulated across the whole match.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct PlayerStats {
    pub correct_answers: u32,
    pub total_answers: u32,
    pub total_response_time_ms: u64,
    pub fastest_answer_ms: Option<u64>,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub estimation_points: i64,
    pub estimation_questions: u32,
    pub per_category: HashMap<CategoryId, CategoryAccuracy>,
}

impl PlayerStats {
    pub fn accuracy(&self) -> f64 {
        if self.total_answers == 0 {
            0.0
        } else {
            self.correct_answers as f64 / self.total_answers as f64
        }
    }

    pub fn average_response_time_ms(&self) -> Option<f64> {
        if self.total_answers == 0 {
            None
        } else {
            Some(self.total_response_time_ms as f64 / self.total_answers as f64)
        }
    }

    /// Records a choice/true-false answer outcome. `response_time_ms` is
    /// the server-observed latency between question start and submission.
    pub fn record_answer(&mut self, category: &CategoryId, correct: bool, response_time_ms: u64) {
        self.total_answers += 1;
        self.total_response_time_ms += response_time_ms;
        self.fastest_answer_ms = Some(
            self.fastest_answer_ms
                .map_or(response_time_ms, |best| best.min(response_time_ms)),
        );
        let entry = self.per_category.entry(category.clone()).or_default();
        entry.total += 1;
        if correct {
            self.correct_answers += 1;
            entry.correct += 1;
            self.current_streak += 1;
            self.longest_streak = self.longest_streak.max(self.current_streak);
        } else {
            self.current_streak = 0;
        }
    }

    pub fn record_estimation(&mut self, points: i64) {
        self.estimation_questions += 1;
        self.estimation_points += points;
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Player {
    pub id: PlayerId,
    #[serde(skip)]
    pub socket: Option<SocketId>,
    pub name: String,
    pub avatar_seed: String,
    pub is_host: bool,
    pub is_connected: bool,
    pub is_bot: bool,
    pub score: i64,
    #[serde(skip)]
    pub stats: PlayerStats,
}

impl Player {
    pub fn new(id: PlayerId, socket: SocketId, name: String, avatar_seed: String) -> Self {
        Self {
            id,
            socket: Some(socket),
            name,
            avatar_seed,
            is_host: false,
            is_connected: true,
            is_bot: false,
            score: 0,
            stats: PlayerStats::default(),
        }
    }

    /// Penalizes a score but never lets it round-trip below what an
    /// explicit hot-button wrong-answer penalty would produce; the server
    /// does not otherwise clamp scores to zero (spec.md §8.1: score is
    /// non-decreasing except for explicit hot-button penalties).
    pub fn add_score(&mut self, delta: i64) {
        self.score += delta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_answer_tracks_streaks() {
        let mut stats = PlayerStats::default();
        let cat = CategoryId("geo".into());
        stats.record_answer(&cat, true, 1_000);
        stats.record_answer(&cat, true, 500);
        stats.record_answer(&cat, false, 2_000);
        stats.record_answer(&cat, true, 900);
        assert_eq!(stats.longest_streak, 2);
        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.correct_answers, 3);
        assert_eq!(stats.total_answers, 4);
        assert_eq!(stats.fastest_answer_ms, Some(500));
        assert_eq!(stats.per_category[&cat].correct, 3);
    }
}

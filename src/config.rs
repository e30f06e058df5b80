//! Process-wide configuration, read once at startup from the environment.
//!
//! Grounded on `hosting::Server::run`'s `std::env::var("BIND_ADDR")
//! .expect(...)` — this design never reaches for a config-file crate, so
//! neither do we. `BIND_ADDR` stays a hard-required env var; every other
//! knob gets a tuned `const` default with an optional override, same as
//! an earlier `TimerConfig::default()`.

use std::time::Duration;

/// Wall-clock and count constants named directly in spec.md §4.

pub const GAME_START_MAX_WAIT: Duration = Duration::from_secs(10);
pub const INTRO_MAX_WAIT: Duration = Duration::from_secs(30);
pub const SCOREBOARD_MAX_WAIT: Duration = Duration::from_secs(30);
pub const REVEAL_HOLD: Duration = Duration::from_millis(3_500);
pub const FINAL_RESULTS_HOLD: Duration = Duration::from_secs(6);
pub const CORRECT_ANSWER_DELAY: Duration = Duration::from_millis(2_000);
pub const REBUZZ_DELAY: Duration = Duration::from_secs(2);
pub const RESULT_DISPLAY: Duration = Duration::from_millis(2_500);
pub const VOTING_WINDOW: Duration = Duration::from_secs(15);
pub const VOTING_TIEBREAK_HOLD: Duration = Duration::from_secs(3);
pub const WHEEL_SPIN_HOLD: Duration = Duration::from_millis(5_500);
pub const LOSER_PICK_WINDOW: Duration = Duration::from_secs(15);
pub const DICE_ROYALE_ROLL_WINDOW: Duration = Duration::from_secs(15);
pub const DICE_ROYALE_REROLL_WINDOW: Duration = Duration::from_secs(10);
pub const DICE_ROYALE_TIE_HOLD: Duration = Duration::from_millis(2_500);
pub const RPS_ROUND_WINDOW: Duration = Duration::from_secs(10);
pub const CATEGORY_PICK_WINDOW: Duration = Duration::from_secs(15);
pub const REMATCH_VOTING_WINDOW: Duration = Duration::from_secs(30);
pub const DISCONNECT_GRACE: Duration = Duration::from_secs(120);
pub const ROOM_CLEANUP_DELAY: Duration = Duration::from_secs(5);
pub const ANNOUNCEMENT_HOLD: Duration = Duration::from_millis(2_500);

pub const LOSER_PICK_COOLDOWN: u32 = 2;
pub const MAX_PLAYERS_PER_ROOM: usize = 12;
pub const MAX_PLAYER_NAME_LEN: usize = 24;
pub const VOTING_CATEGORY_COUNT: usize = 8;
pub const ROOM_CODE_LEN: usize = 4;
pub const ROOM_CODE_ALPHABET: &str = "ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Default hot-button tuning, overridable per question via settings.
pub const HOT_BUTTON_BUZZER_TIMEOUT: Duration = Duration::from_secs(25);
pub const HOT_BUTTON_ANSWER_TIMEOUT: Duration = Duration::from_secs(15);
pub const HOT_BUTTON_MAX_REBUZZ_ATTEMPTS: u32 = 2;
pub const HOT_BUTTON_REVEAL_SPEED: Duration = Duration::from_millis(50);
pub const HOT_BUTTON_INTRO_HOLD: Duration = Duration::from_millis(3_000);

/// Answer-correctness threshold handed to the shared fuzzy matcher for
/// hot-button buzz answers (spec.md §4.6: answer checking goes through the
/// same collaborator collective-list uses, not a literal string compare).
pub const HOT_BUTTON_FUZZY_THRESHOLD: f32 = 0.75;

/// Speed-bonus step function keyed by `revealedPercent` at buzz time
/// (spec.md §4.6): the first band whose threshold is met from the top wins;
/// anything past the last threshold gets the flat fallback bonus below.
pub const HOT_BUTTON_SPEED_BONUS_BANDS: &[(f64, i64)] = &[(0.25, 500), (0.50, 300), (0.75, 150)];
pub const HOT_BUTTON_SPEED_BONUS_FALLBACK: i64 = 50;

/// Collective-list default tuning.
pub const COLLECTIVE_LIST_WINNER_BONUS_SOLO: i64 = 200;
pub const COLLECTIVE_LIST_WINNER_BONUS_MULTI: i64 = 100;

/// Choice-question scoring (spec.md §4.3). `speed_bonus` is proportional to
/// the fraction of the question timer remaining when the answer arrived.
pub const CHOICE_BASE_POINTS: i64 = 500;
pub const CHOICE_MAX_SPEED_BONUS: i64 = 500;
pub const CHOICE_WRONG_PENALTY: i64 = 0;

/// Estimation-scoring bands, expressed as maximum relative error for each
/// point award (spec.md §9: "treat as a tuning knob, not authoritative").
pub const ESTIMATION_BANDS: &[(f64, i64)] = &[
    (0.0, 1_000),
    (0.02, 750),
    (0.05, 500),
    (0.15, 250),
    (0.30, 100),
];

/// Process-wide server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub workers: usize,
}

impl Config {
    /// Reads configuration from the environment. Panics on a missing
    /// `BIND_ADDR`, matching the earlier startup-time `.expect(...)`.
    pub fn from_env() -> Self {
        let bind_addr = std::env::var("BIND_ADDR").expect("BIND_ADDR must be set");
        let workers = std::env::var("SERVER_WORKERS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(4);
        Self { bind_addr, workers }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_env_reads_bind_addr() {
        unsafe {
            std::env::set_var("BIND_ADDR", "127.0.0.1:0");
            std::env::remove_var("SERVER_WORKERS");
        }
        let config = Config::from_env();
        assert_eq!(config.bind_addr, "127.0.0.1:0");
        assert_eq!(config.workers, 4);
    }
}

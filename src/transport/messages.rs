//! Wire protocol (spec.md §6.1): inbound client intents and outbound
//! broadcasts, both `{ "type": ..., ... }` tagged JSON, `snake_case`.
//!
//! The teacher's `hosting::client::Client` builds its outbound JSON ad
//! hoc with `serde_json::json!(...)`; this module replaces that with a
//! single typed enum per direction so `serde` is the only thing that
//! touches the wire shape, matching the tagged-sum convention already
//! used for `model::bonus::BonusRoundState` and `model::question::QuestionContent`.

use crate::ids::{PlayerId, RoomCode};
use crate::model::category::CategoryId;
use crate::model::player::Player;
use crate::model::room::Room;
use crate::model::settings::MatchSettings;
use crate::model::question::{Difficulty, QuestionId};
use crate::model::state::{ActiveQuestion, Phase, RpsChoice};
use crate::time::ServerTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    CreateRoom {
        #[serde(default)]
        settings: Option<MatchSettings>,
    },
    JoinRoom {
        code: RoomCode,
        name: String,
    },
    Reconnect {
        code: RoomCode,
        player_id: PlayerId,
    },
    StartGame,
    GameStartReady,
    SubmitVote {
        category_id: CategoryId,
    },
    PickCategory {
        category_id: CategoryId,
    },
    DiceRoyaleRoll,
    RpsChoice {
        choice: RpsChoice,
    },
    SubmitAnswer {
        #[serde(default)]
        answer_index: Option<usize>,
        #[serde(default)]
        estimation_value: Option<f64>,
    },
    HotButtonBuzz,
    HotButtonAnswer {
        text: String,
    },
    SubmitBonusRoundAnswer {
        text: String,
    },
    SkipBonusRound,
    IntroReady,
    ScoreboardReady,
    RematchVote {
        yes: bool,
    },
    LeaveRoom,
}

/// Public player projection: no socket id, no server-only bookkeeping
/// (spec.md §6.1 "Room snapshot").
#[derive(Debug, Clone, Serialize)]
pub struct PublicPlayer {
    pub id: PlayerId,
    pub name: String,
    pub avatar_seed: String,
    pub score: i64,
    pub is_host: bool,
    pub is_connected: bool,
}

impl From<&Player> for PublicPlayer {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            avatar_seed: p.avatar_seed.clone(),
            score: p.score,
            is_host: p.is_host,
            is_connected: p.is_connected,
        }
    }
}

/// Public projection of the question on screen. Carries the correct
/// answer only once the room has entered a reveal phase — the same rule
/// an earlier design's `hosting::client` applied to hole cards before showdown.
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuestion {
    pub id: QuestionId,
    pub category_id: CategoryId,
    pub text: String,
    pub difficulty: Difficulty,
    pub kind: &'static str,
    pub shuffled_answers: Option<Vec<String>>,
    pub unit: Option<String>,
    pub correct_index: Option<usize>,
    pub correct_value: Option<f64>,
    pub explanation: Option<String>,
}

impl PublicQuestion {
    pub fn project(active: &ActiveQuestion, revealing: bool) -> Self {
        let unit = match &active.question.content {
            crate::model::question::QuestionContent::Estimation { unit, .. } => Some(unit.clone()),
            _ => None,
        };
        let correct_value = match &active.question.content {
            crate::model::question::QuestionContent::Estimation { correct_value, .. } if revealing => {
                Some(*correct_value)
            }
            _ => None,
        };
        Self {
            id: active.question.id.clone(),
            category_id: active.question.category_id.clone(),
            text: active.question.text.clone(),
            difficulty: active.question.difficulty,
            kind: active.question.content_kind(),
            shuffled_answers: active.shuffled_answers.clone(),
            unit,
            correct_index: if revealing { active.correct_index } else { None },
            correct_value,
            explanation: if revealing { active.question.explanation.clone() } else { None },
        }
    }
}

/// Client-facing room snapshot, rebuilt fresh after every mutation. Omits
/// socket ids, server timer handles, and (during `question`/`estimation`)
/// the correct answer — `reveal` is the first broadcast to carry it.
#[derive(Debug, Clone, Serialize)]
pub struct RoomSnapshot {
    pub code: RoomCode,
    pub host_id: PlayerId,
    pub phase: Phase,
    pub server_time: ServerTime,
    pub timer_end: Option<ServerTime>,
    pub players: Vec<PublicPlayer>,
    pub settings: MatchSettings,
    pub current_round: u32,
    pub current_question_index: usize,
    pub voting_categories: Vec<CategoryId>,
    pub selected_category: Option<CategoryId>,
    pub current_question: Option<PublicQuestion>,
    pub question_tts_url: Option<String>,
    pub last_awards: Vec<PlayerAward>,
}

impl From<&Room> for RoomSnapshot {
    fn from(room: &Room) -> Self {
        let revealing = matches!(room.state.phase, Phase::Revealing | Phase::EstimationReveal);
        Self {
            code: room.code.clone(),
            host_id: room.host_id.clone(),
            phase: room.state.phase,
            server_time: room.state.server_time,
            timer_end: room.state.timer_end,
            players: room.players.iter().map(PublicPlayer::from).collect(),
            settings: room.settings.clone(),
            current_round: room.state.current_round,
            current_question_index: room.state.current_question_index,
            voting_categories: room.state.voting_categories.clone(),
            selected_category: room.state.selected_category.clone(),
            current_question: room
                .state
                .current_question
                .as_ref()
                .map(|q| PublicQuestion::project(q, revealing)),
            question_tts_url: room.state.question_tts_url.clone(),
            last_awards: room
                .state
                .last_answer_awards
                .iter()
                .map(|(player_id, points, correct)| PlayerAward {
                    player_id: player_id.clone(),
                    points: *points,
                    correct: *correct,
                })
                .collect(),
        }
    }
}

/// Per-player end-of-match statistics (spec.md §4.7).
#[derive(Debug, Clone, Serialize)]
pub struct PlayerFinalStats {
    pub player_id: PlayerId,
    pub correct_answers: u32,
    pub total_answers: u32,
    pub accuracy: f64,
    pub estimation_points: i64,
    pub estimation_questions: u32,
    pub fastest_answer_ms: Option<u64>,
    pub longest_streak: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryPerformance {
    pub category_id: CategoryId,
    pub correct: u32,
    pub total: u32,
    pub accuracy: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerCategoryPerformance {
    pub player_id: PlayerId,
    pub categories: Vec<CategoryPerformance>,
    pub best_category: Option<CategoryId>,
    pub worst_category: Option<CategoryId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerAward {
    pub player_id: PlayerId,
    pub points: i64,
    pub correct: bool,
}

/// Server-to-client broadcasts (spec.md §6.1). One room mutation can
/// queue several of these in order (e.g. `bonus_round_eliminate` then
/// `room_update`); the transport bridge preserves send order per room.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[allow(clippy::large_enum_variant)]
pub enum ServerMessage {
    RoomCreated {
        code: RoomCode,
    },
    RoomUpdate {
        room: RoomSnapshot,
    },
    PhaseChange {
        phase: Phase,
    },
    PlayerJoined {
        player: PublicPlayer,
    },
    PlayerLeft {
        player_id: PlayerId,
    },
    CategoryMode {
        mode: crate::model::settings::CategoryMode,
    },
    VotingTiebreaker {
        tied_categories: Vec<CategoryId>,
        winner_id: CategoryId,
    },
    CategorySelected {
        category_id: CategoryId,
    },
    DiceRoyaleStart {
        player_ids: Vec<PlayerId>,
    },
    DiceRoyaleReady,
    DiceRoyaleRoll {
        player_id: PlayerId,
        rolls: (u8, u8),
    },
    DiceRoyaleTie {
        tied_player_ids: Vec<PlayerId>,
        round: u32,
    },
    DiceRoyaleWinner {
        player_id: PlayerId,
    },
    DiceRoyalePick,
    RpsDuelStart {
        player_a: PlayerId,
        player_b: PlayerId,
    },
    RpsRoundStart {
        round: u32,
    },
    RpsChoiceMade {
        player_id: PlayerId,
    },
    RpsRoundResult {
        choice_a: RpsChoice,
        choice_b: RpsChoice,
        round_winner: Option<PlayerId>,
    },
    RpsDuelWinner {
        player_id: PlayerId,
    },
    RpsDuelPick,
    BonusRoundTurn {
        player_id: PlayerId,
        turn_number: u64,
    },
    BonusRoundCorrect {
        player_id: PlayerId,
        item_id: String,
        points: i64,
    },
    BonusRoundEliminate {
        player_id: PlayerId,
        reason: crate::model::bonus::collective_list::EliminationReason,
        rank: u32,
    },
    CollectiveListEnd {
        breakdown: Vec<crate::model::bonus::collective_list::PlayerScoreBreakdown>,
    },
    HotButtonBuzz {
        player_id: PlayerId,
    },
    HotButtonAnswerResult {
        player_id: PlayerId,
        correct: bool,
        points: i64,
        correct_answer: Option<String>,
        can_rebuzz: bool,
    },
    HotButtonTimeout {
        correct_answer: String,
    },
    HotButtonEnd {
        breakdown: Vec<crate::model::bonus::hot_button::PlayerScoreBreakdown>,
    },
    QuestionReveal {
        correct_index: Option<usize>,
        correct_value: Option<f64>,
        awards: Vec<PlayerAward>,
    },
    ScoreboardAnnouncement {
        tts_url: Option<String>,
    },
    GameOver {
        rankings: Vec<PublicPlayer>,
        statistics: Vec<PlayerFinalStats>,
        best_estimator: Option<PlayerId>,
        fastest_fingers: Vec<PlayerId>,
        category_performance: Vec<PlayerCategoryPerformance>,
    },
    RematchVotingStart,
    RematchVoteUpdate {
        player_id: PlayerId,
        yes: bool,
    },
    RematchResult {
        continuing: Vec<PlayerId>,
    },
    /// Targeted (spec.md §6.1): sent to a single socket, never broadcast.
    KickedFromRoom {
        reason: String,
    },
    /// Targeted: tells a freshly (re)connected socket which player it is,
    /// so it can persist `(code, player_id)` for `reconnect`.
    Welcome {
        player_id: PlayerId,
    },
    Error {
        code: &'static str,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_submit_answer_parses_estimation_value() {
        let json = r#"{"type":"submit_answer","estimation_value":42.5}"#;
        let msg: InboundMessage = serde_json::from_str(json).unwrap();
        match msg {
            InboundMessage::SubmitAnswer {
                answer_index,
                estimation_value,
            } => {
                assert!(answer_index.is_none());
                assert_eq!(estimation_value, Some(42.5));
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn inbound_join_room_uppercases_code() {
        let json = r#"{"type":"join_room","code":"abcd","name":"Ada"}"#;
        let msg: InboundMessage = serde_json::from_str(json).unwrap();
        match msg {
            InboundMessage::JoinRoom { code, name } => {
                assert_eq!(code.as_str(), "ABCD");
                assert_eq!(name, "Ada");
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn outbound_room_update_serializes_with_tag() {
        let mut rng = rand::rngs::SmallRng::seed_from_u64(3);
        use rand::SeedableRng;
        let room = Room::new(
            RoomCode::generate(&mut rng),
            PlayerId::generate(&mut rng),
            MatchSettings::default(),
        );
        let msg = ServerMessage::RoomUpdate {
            room: RoomSnapshot::from(&room),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.starts_with(r#"{"type":"room_update""#));
    }
}

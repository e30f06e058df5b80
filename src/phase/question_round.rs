//! A round's question sequence (spec.md §4.3): draws `questionsPerRound`
//! questions for the selected category, presents each with a per-question
//! timer, scores submissions on reveal, then hands off to the scoreboard.
//!
//! Grounded on `gameroom::hand::Hand`'s per-street loop (deal a street,
//! collect actions, settle, advance) generalized to "present a question,
//! collect answers, reveal, advance".

use crate::config::{CHOICE_BASE_POINTS, CHOICE_MAX_SPEED_BONUS, CHOICE_WRONG_PENALTY, ESTIMATION_BANDS, REVEAL_HOLD};
use crate::ids::PlayerId;
use crate::model::category::CategoryId;
use crate::model::question::{Question, QuestionContent};
use crate::model::state::{ActiveQuestion, Phase, PlayerAnswer, SubmittedAnswer};
use crate::phase::ctx::Ctx;
use crate::phase::{category_selection, scoreboard};
use crate::transport::messages::ServerMessage;
use rand::seq::SliceRandom;

/// Draws up to `n` questions for `category`: `n - 1` general questions
/// plus, if the bank has one left, a single estimation question for the
/// final slot. Falls back to another general question when the bank has
/// no estimation question available (spec.md §4.3: "a round with no
/// estimation question in the bank is simply all choice").
async fn draw_questions(ctx: &mut Ctx, category: &CategoryId, n: u8) -> Vec<Question> {
    let mut used = ctx.room.state.used_question_ids.clone();
    let mut drawn = Vec::new();
    for _ in 0..n.saturating_sub(1) {
        match ctx.questions.random_question(category, &used).await {
            Ok(Some(q)) => {
                used.insert(q.id.clone());
                drawn.push(q);
            }
            Ok(None) => break,
            Err(e) => {
                log::warn!("question store error drawing for room {}: {e}", ctx.room.code);
                break;
            }
        }
    }
    let mut estimation = None;
    for _ in 0..5 {
        match ctx.questions.random_question(category, &used).await {
            Ok(Some(q)) if q.is_estimation() => {
                estimation = Some(q);
                break;
            }
            Ok(Some(q)) => {
                used.insert(q.id.clone());
            }
            _ => break,
        }
    }
    match estimation {
        Some(q) => {
            used.insert(q.id.clone());
            drawn.push(q);
        }
        None if (drawn.len() as u8) < n => {
            if let Ok(Some(q)) = ctx.questions.random_question(category, &used).await {
                used.insert(q.id.clone());
                drawn.push(q);
            }
        }
        None => {}
    }
    ctx.room.state.used_question_ids = used;
    drawn
}

/// Entered once a category has been selected. Draws the round's
/// questions and presents the first.
pub async fn begin(ctx: &mut Ctx) {
    let Some(category) = ctx.room.state.selected_category.clone() else {
        log::warn!("question_round::begin called with no selected category in room {}", ctx.room.code);
        return;
    };
    let n = ctx.room.settings.questions_per_round;
    let drawn = draw_questions(ctx, &category, n).await;
    if drawn.is_empty() {
        log::warn!("question bank exhausted for category {category} in room {}; skipping round", ctx.room.code);
        ctx.room.state.current_round += 1;
        category_selection::begin_round(ctx).await;
        return;
    }
    ctx.room.state.round_questions = drawn.iter().map(|q| q.id.clone()).collect();
    ctx.room.state.current_question_index = 0;
    ctx.round_question_bank = drawn;
    present_current_question(ctx).await;
}

async fn present_current_question(ctx: &mut Ctx) {
    let Some(question) = ctx
        .round_question_bank
        .get(ctx.room.state.current_question_index)
        .cloned()
    else {
        scoreboard::begin(ctx).await;
        return;
    };
    let (shuffled_answers, correct_index) = match &question.content {
        QuestionContent::Choice { correct_answer, incorrect_answers } => {
            let mut answers = incorrect_answers.clone();
            answers.push(correct_answer.clone());
            answers.shuffle(&mut ctx.rng);
            let index = answers.iter().position(|a| a == correct_answer).expect("just inserted");
            (Some(answers), Some(index))
        }
        _ => (None, None),
    };
    let is_estimation = question.is_estimation();
    let phase = if is_estimation { Phase::Estimation } else { Phase::Question };
    ctx.room.state.enter_phase(phase);
    ctx.clear_timers();
    ctx.room.state.last_answer_awards.clear();
    let started_at = ctx.now();
    let cache_key = question.id.0.clone();
    let text = question.text.clone();
    ctx.room.state.current_question = Some(ActiveQuestion {
        question,
        shuffled_answers,
        correct_index,
        question_started_at: started_at,
        answers: std::collections::HashMap::new(),
    });
    ctx.room.state.question_tts_url = ctx.tts.get_or_synthesize(&cache_key, &text).await.ok();
    ctx.broadcast(ServerMessage::PhaseChange { phase });
    ctx.broadcast_snapshot();
    let deadline = std::time::Duration::from_secs(ctx.room.settings.time_per_question_secs as u64);
    ctx.arm_timer(deadline);
}

pub async fn handle_submit_answer(
    ctx: &mut Ctx,
    player_id: PlayerId,
    answer_index: Option<usize>,
    estimation_value: Option<f64>,
) {
    if !matches!(ctx.room.state.phase, Phase::Question | Phase::Estimation) {
        return;
    }
    let now = ctx.now();
    let all_submitted = {
        let Some(active) = ctx.room.state.current_question.as_mut() else { return };
        if active.answers.contains_key(&player_id) {
            return;
        }
        let answer = if active.question.is_estimation() {
            let Some(value) = estimation_value else { return };
            PlayerAnswer::Estimation { value }
        } else {
            let Some(index) = answer_index else { return };
            PlayerAnswer::Choice { index }
        };
        active.answers.insert(player_id, SubmittedAnswer { answer, received_at: now });
        let connected = ctx.room.players.connected_ids();
        connected.iter().all(|id| active.answers.contains_key(id))
    };
    if all_submitted {
        reveal(ctx).await;
    } else {
        ctx.broadcast_snapshot();
    }
}

/// `timePerQuestion`'s deadline fired with players still unanswered.
pub async fn on_timer(ctx: &mut Ctx) {
    if matches!(ctx.room.state.phase, Phase::Question | Phase::Estimation) {
        reveal(ctx).await;
    }
}

/// `REVEAL_HOLD`'s hold fired: move on to the next question or scoreboard.
pub async fn on_reveal_hold_timer(ctx: &mut Ctx) {
    if !matches!(ctx.room.state.phase, Phase::Revealing | Phase::EstimationReveal) {
        return;
    }
    ctx.room.state.current_question_index += 1;
    present_current_question(ctx).await;
}

fn choice_points(correct: bool, remaining_fraction: f64) -> i64 {
    if !correct {
        return CHOICE_WRONG_PENALTY;
    }
    let bonus = (CHOICE_MAX_SPEED_BONUS as f64 * remaining_fraction.clamp(0.0, 1.0)).round() as i64;
    CHOICE_BASE_POINTS + bonus
}

fn estimation_points(value: f64, correct_value: f64) -> i64 {
    let denom = correct_value.abs().max(1e-9);
    let relative_error = (value - correct_value).abs() / denom;
    for &(threshold, points) in ESTIMATION_BANDS {
        if relative_error <= threshold {
            return points;
        }
    }
    0
}

async fn reveal(ctx: &mut Ctx) {
    let Some(active) = ctx.room.state.current_question.take() else { return };
    let phase = if active.question.is_estimation() {
        Phase::EstimationReveal
    } else {
        Phase::Revealing
    };
    ctx.room.state.enter_phase(phase);
    ctx.clear_timers();
    let deadline_ms = (ctx.room.settings.time_per_question_secs as u64).max(1) * 1_000;
    let category = active.question.category_id.clone();
    let mut awards = Vec::new();
    for player_id in ctx.room.players.connected_ids() {
        let submitted = active.answers.get(&player_id);
        let response_time_ms = submitted
            .map(|a| a.received_at.saturating_sub(active.question_started_at))
            .unwrap_or(deadline_ms);
        let (points, correct) = match &active.question.content {
            QuestionContent::Estimation { correct_value, .. } => {
                let value = submitted.and_then(|s| match s.answer {
                    PlayerAnswer::Estimation { value } => Some(value),
                    _ => None,
                });
                match value {
                    Some(value) => {
                        let points = estimation_points(value, *correct_value);
                        (points, points > 0)
                    }
                    None => (0, false),
                }
            }
            _ => {
                let correct = submitted.is_some_and(|s| {
                    matches!(s.answer, PlayerAnswer::Choice { index } if Some(index) == active.correct_index)
                });
                let remaining = 1.0 - (response_time_ms as f64 / deadline_ms as f64);
                (choice_points(correct, remaining), correct)
            }
        };
        if let Some(player) = ctx.room.players.get_mut(&player_id) {
            player.add_score(points);
            if active.question.is_estimation() {
                player.stats.record_estimation(points);
            }
            player.stats.record_answer(&category, correct, response_time_ms);
        }
        awards.push((player_id, points, correct));
    }
    ctx.room.state.last_answer_awards = awards.clone();
    ctx.room.state.current_question = Some(active.clone());
    ctx.broadcast(ServerMessage::QuestionReveal {
        correct_index: active.correct_index,
        correct_value: match active.question.content {
            QuestionContent::Estimation { correct_value, .. } => Some(correct_value),
            _ => None,
        },
        awards: awards
            .into_iter()
            .map(|(player_id, points, correct)| crate::transport::messages::PlayerAward {
                player_id,
                points,
                correct,
            })
            .collect(),
    });
    ctx.broadcast_snapshot();
    ctx.arm_timer(REVEAL_HOLD);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choice_points_rewards_speed_only_when_correct() {
        assert_eq!(choice_points(false, 1.0), CHOICE_WRONG_PENALTY);
        assert_eq!(choice_points(true, 0.0), CHOICE_BASE_POINTS);
        assert_eq!(choice_points(true, 1.0), CHOICE_BASE_POINTS + CHOICE_MAX_SPEED_BONUS);
    }

    #[test]
    fn estimation_points_uses_tightest_matching_band() {
        assert_eq!(estimation_points(100.0, 100.0), 1_000);
        assert_eq!(estimation_points(103.0, 100.0), 750);
        assert_eq!(estimation_points(200.0, 100.0), 0);
    }
}

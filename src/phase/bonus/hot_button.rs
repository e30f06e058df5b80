//! Hot-button bonus round (spec.md §4.6): a question's text reveals one
//! character at a time; the first buzz locks in the right to answer;
//! a wrong answer can reopen the buzzer for the remaining field.
//! Grounded on `category_selection::dice_royale`'s phase-within-a-phase
//! shape, with the character-reveal ticker driven by [`Ctx::arm_reveal_tick`].

use crate::config::{
    CORRECT_ANSWER_DELAY, HOT_BUTTON_ANSWER_TIMEOUT, HOT_BUTTON_BUZZER_TIMEOUT, HOT_BUTTON_FUZZY_THRESHOLD,
    HOT_BUTTON_MAX_REBUZZ_ATTEMPTS, HOT_BUTTON_REVEAL_SPEED, HOT_BUTTON_SPEED_BONUS_BANDS,
    HOT_BUTTON_SPEED_BONUS_FALLBACK, REBUZZ_DELAY, RESULT_DISPLAY,
};
use crate::ids::PlayerId;
use crate::model::bonus::BonusRoundState;
use crate::model::bonus::collective_list::RuntimeListItem;
use crate::model::bonus::hot_button::{HotButtonOutcome, HotButtonPhase, HotButtonQuestionState, PlayerScoreBreakdown, ServerHotButtonState};
use crate::model::question::{Question, QuestionContent};
use crate::model::state::Phase;
use crate::phase::ctx::Ctx;
use crate::transport::messages::ServerMessage;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

pub async fn load(ctx: &mut Ctx) -> Option<ServerHotButtonState> {
    let used = ctx.room.state.used_bonus_question_ids.clone();
    let count = ctx.room.settings.hot_button_questions_per_round as usize;
    let questions = match ctx.questions.random_hot_button_questions(count, &used).await {
        Ok(qs) if !qs.is_empty() => qs,
        Ok(_) => return None,
        Err(e) => {
            log::warn!("question store error drawing hot button questions for room {}: {e}", ctx.room.code);
            return None;
        }
    };
    for q in &questions {
        ctx.room.state.used_bonus_question_ids.insert(q.id.clone());
    }
    Some(ServerHotButtonState {
        questions,
        current_question_index: 0,
        current: None,
        buzzer_timeout: HOT_BUTTON_BUZZER_TIMEOUT,
        answer_timeout: HOT_BUTTON_ANSWER_TIMEOUT,
        max_rebuzz_attempts: HOT_BUTTON_MAX_REBUZZ_ATTEMPTS,
        allow_rebuzz: true,
        player_scores: HashMap::new(),
        question_history: Vec::new(),
        phase: HotButtonPhase::Intro,
    })
}

pub fn start_first_question(ctx: &mut Ctx) {
    present_question(ctx);
}

fn correct_answer_text(question: &Question) -> String {
    match &question.content {
        QuestionContent::HotButton { correct_answer, .. } => correct_answer.clone(),
        _ => String::new(),
    }
}

fn present_question(ctx: &mut Ctx) {
    let question = match ctx.room.state.bonus_round.as_ref() {
        Some(BonusRoundState::HotButton(state)) => state.questions.get(state.current_question_index).cloned(),
        _ => None,
    };
    let Some(question) = question else {
        finish(ctx);
        return;
    };
    let buzzer_timeout = match ctx.room.state.bonus_round.as_ref() {
        Some(BonusRoundState::HotButton(state)) => state.buzzer_timeout,
        _ => HOT_BUTTON_BUZZER_TIMEOUT,
    };
    let now = ctx.now();
    let question_state = HotButtonQuestionState {
        question,
        revealed_chars: 0,
        is_fully_revealed: false,
        question_start_time: now,
        original_buzzer_timer_end: now + buzzer_timeout.as_millis() as u64,
        buzzed_player_id: None,
        buzz_timestamps: HashMap::new(),
        buzz_order: Vec::new(),
        attempted_player_ids: HashSet::new(),
    };
    if let Some(BonusRoundState::HotButton(state)) = ctx.room.state.bonus_round.as_mut() {
        state.phase = HotButtonPhase::QuestionReveal;
        state.current = Some(question_state);
    }
    ctx.broadcast_snapshot();
    ctx.retoken();
    ctx.arm_timer(buzzer_timeout);
    ctx.arm_reveal_tick(HOT_BUTTON_REVEAL_SPEED);
}

pub fn on_reveal_tick(ctx: &mut Ctx) {
    let Some(BonusRoundState::HotButton(state)) = ctx.room.state.bonus_round.as_mut() else { return };
    if state.phase != HotButtonPhase::QuestionReveal {
        return;
    }
    let Some(current) = state.current.as_mut() else { return };
    if current.is_fully_revealed {
        return;
    }
    current.revealed_chars += 1;
    let len = current.text().chars().count();
    if current.revealed_chars >= len {
        current.revealed_chars = len;
        current.is_fully_revealed = true;
    }
    ctx.broadcast_snapshot();
}

pub fn handle_buzz(ctx: &mut Ctx, player_id: PlayerId) {
    if ctx.room.state.phase != Phase::BonusRound {
        return;
    }
    let now = ctx.now();
    let buzzed = {
        let Some(BonusRoundState::HotButton(state)) = ctx.room.state.bonus_round.as_mut() else { return };
        if state.phase != HotButtonPhase::QuestionReveal {
            return;
        }
        let Some(current) = state.current.as_mut() else { return };
        if current.buzzed_player_id.is_some() || current.attempted_player_ids.contains(&player_id) {
            return;
        }
        current.buzzed_player_id = Some(player_id.clone());
        current.buzz_timestamps.insert(player_id.clone(), now);
        current.buzz_order.push(player_id.clone());
        state.phase = HotButtonPhase::Answering;
        true
    };
    if !buzzed {
        return;
    }
    let answer_timeout = match ctx.room.state.bonus_round.as_ref() {
        Some(BonusRoundState::HotButton(state)) => state.answer_timeout,
        _ => HOT_BUTTON_ANSWER_TIMEOUT,
    };
    ctx.broadcast(ServerMessage::HotButtonBuzz { player_id });
    ctx.broadcast_snapshot();
    ctx.retoken();
    ctx.arm_timer(answer_timeout);
}

pub async fn handle_answer(ctx: &mut Ctx, player_id: PlayerId, text: String) {
    if ctx.room.state.phase != Phase::BonusRound {
        return;
    }
    let (correct_answer, accepted_answers, revealed_percent) = {
        let Some(BonusRoundState::HotButton(state)) = ctx.room.state.bonus_round.as_ref() else { return };
        if state.phase != HotButtonPhase::Answering {
            return;
        }
        let Some(current) = state.current.as_ref() else { return };
        if current.buzzed_player_id.as_ref() != Some(&player_id) {
            return;
        }
        match &current.question.content {
            QuestionContent::HotButton {
                correct_answer,
                accepted_answers,
                ..
            } => (correct_answer.clone(), accepted_answers.clone(), current.revealed_percent()),
            _ => return,
        }
    };
    // Same fuzzy-match collaborator collective-list answers go through
    // (spec.md §4.6, §9): wrap the accepted strings as a single candidate
    // item rather than comparing raw text.
    let candidate = RuntimeListItem {
        id: "correct".to_string(),
        display: correct_answer.clone(),
        aliases: accepted_answers,
        group: None,
        guessed_by: None,
    };
    let match_result = ctx
        .fuzzy
        .try_match(&text, std::slice::from_ref(&candidate), &HashSet::new(), HOT_BUTTON_FUZZY_THRESHOLD)
        .await;
    let correct = match_result.is_match;
    let (points_correct, points_wrong) = {
        let Some(BonusRoundState::HotButton(state)) = ctx.room.state.bonus_round.as_ref() else { return };
        match state.current.as_ref().map(|c| &c.question.content) {
            Some(QuestionContent::HotButton { points_correct, points_wrong, .. }) => (*points_correct, *points_wrong),
            _ => return,
        }
    };
    let (correct_answer_reply, can_rebuzz) = {
        let Some(BonusRoundState::HotButton(state)) = ctx.room.state.bonus_round.as_mut() else { return };
        let max_rebuzz = state.max_rebuzz_attempts;
        let allow_rebuzz = state.allow_rebuzz;
        let total_players = ctx.room.players.connected_ids().len();
        let Some(current) = state.current.as_mut() else { return };
        current.attempted_player_ids.insert(player_id.clone());
        current.buzzed_player_id = None;
        let can_rebuzz = !correct && current.can_rebuzz(max_rebuzz, allow_rebuzz, total_players);
        let reply = if correct || !can_rebuzz { Some(correct_answer.clone()) } else { None };
        (reply, can_rebuzz)
    };
    let points = if correct {
        points_correct + hot_button_speed_bonus(revealed_percent)
    } else {
        points_wrong
    };
    if let Some(player) = ctx.room.players.get_mut(&player_id) {
        player.add_score(points);
    }
    let outcome = if correct {
        HotButtonOutcome::Correct { player_id: player_id.clone(), points }
    } else {
        let attempted = match ctx.room.state.bonus_round.as_ref() {
            Some(BonusRoundState::HotButton(state)) => state
                .current
                .as_ref()
                .map(|c| c.attempted_player_ids.iter().cloned().collect())
                .unwrap_or_default(),
            _ => Vec::new(),
        };
        HotButtonOutcome::Wrong { attempted_by: attempted }
    };
    if let Some(BonusRoundState::HotButton(state)) = ctx.room.state.bonus_round.as_mut() {
        *state.player_scores.entry(player_id.clone()).or_default() += points;
        state.question_history.push(outcome);
    }
    ctx.broadcast(ServerMessage::HotButtonAnswerResult {
        player_id,
        correct,
        points,
        correct_answer: correct_answer_reply,
        can_rebuzz,
    });
    ctx.broadcast_snapshot();
    if can_rebuzz {
        begin_rebuzz_hold(ctx);
    } else {
        enter_result_hold(ctx);
    }
}

fn hot_button_speed_bonus(revealed_percent: f64) -> i64 {
    for &(threshold, bonus) in HOT_BUTTON_SPEED_BONUS_BANDS {
        if revealed_percent <= threshold {
            return bonus;
        }
    }
    HOT_BUTTON_SPEED_BONUS_FALLBACK
}

/// Holds `REBUZZ_DELAY` before the buzzer actually reopens (spec.md §4.6:
/// "after REBUZZ_DELAY re-enter question_reveal").
fn begin_rebuzz_hold(ctx: &mut Ctx) {
    if let Some(BonusRoundState::HotButton(state)) = ctx.room.state.bonus_round.as_mut() {
        state.phase = HotButtonPhase::RebuzzPending;
    }
    ctx.broadcast_snapshot();
    ctx.retoken();
    ctx.arm_timer(REBUZZ_DELAY);
}

/// Reopens the buzzer for whatever remains of the original window
/// (spec.md invariant: rebuzz never extends past `original_buzzer_timer_end`,
/// so the remaining window is used as-is, with no floor).
fn reopen_buzzer(ctx: &mut Ctx) {
    let (remaining_ms, fully_revealed) = match ctx.room.state.bonus_round.as_ref() {
        Some(BonusRoundState::HotButton(state)) => match state.current.as_ref() {
            Some(c) => (c.original_buzzer_timer_end.saturating_sub(ctx.now()), c.is_fully_revealed),
            None => (0, false),
        },
        _ => (0, false),
    };
    if let Some(BonusRoundState::HotButton(state)) = ctx.room.state.bonus_round.as_mut() {
        state.phase = HotButtonPhase::QuestionReveal;
    }
    ctx.broadcast_snapshot();
    ctx.retoken();
    ctx.arm_timer(Duration::from_millis(remaining_ms));
    if !fully_revealed {
        ctx.arm_reveal_tick(HOT_BUTTON_REVEAL_SPEED);
    }
}

fn enter_result_hold(ctx: &mut Ctx) {
    if let Some(BonusRoundState::HotButton(state)) = ctx.room.state.bonus_round.as_mut() {
        state.phase = HotButtonPhase::Result;
        state.current = None;
    }
    ctx.retoken();
    ctx.arm_timer(CORRECT_ANSWER_DELAY);
}

fn advance_question(ctx: &mut Ctx) {
    if let Some(BonusRoundState::HotButton(state)) = ctx.room.state.bonus_round.as_mut() {
        state.current_question_index += 1;
    }
    present_question(ctx);
}

fn handle_buzzer_timeout(ctx: &mut Ctx) {
    let correct_answer = {
        let Some(BonusRoundState::HotButton(state)) = ctx.room.state.bonus_round.as_mut() else { return };
        let Some(current) = state.current.take() else { return };
        state.phase = HotButtonPhase::Result;
        state.question_history.push(HotButtonOutcome::NoBuzz);
        correct_answer_text(&current.question)
    };
    ctx.broadcast(ServerMessage::HotButtonTimeout { correct_answer });
    ctx.broadcast_snapshot();
    ctx.retoken();
    ctx.arm_timer(CORRECT_ANSWER_DELAY);
}

async fn handle_answer_timeout(ctx: &mut Ctx) {
    let buzzed = match ctx.room.state.bonus_round.as_ref() {
        Some(BonusRoundState::HotButton(state)) => state.current.as_ref().and_then(|c| c.buzzed_player_id.clone()),
        _ => None,
    };
    if let Some(player_id) = buzzed {
        handle_answer(ctx, player_id, String::new()).await;
    }
}

pub async fn on_timer(ctx: &mut Ctx) {
    let phase = match ctx.room.state.bonus_round.as_ref() {
        Some(BonusRoundState::HotButton(state)) => state.phase.clone(),
        _ => return,
    };
    match phase {
        HotButtonPhase::QuestionReveal => handle_buzzer_timeout(ctx),
        HotButtonPhase::Answering => handle_answer_timeout(ctx).await,
        HotButtonPhase::RebuzzPending => reopen_buzzer(ctx),
        HotButtonPhase::Result => advance_question(ctx),
        _ => {}
    }
}

fn finish(ctx: &mut Ctx) {
    let breakdown = {
        let Some(BonusRoundState::HotButton(state)) = ctx.room.state.bonus_round.as_mut() else { return };
        state.phase = HotButtonPhase::Finished;
        let mut scores: Vec<(PlayerId, i64)> = state.player_scores.iter().map(|(id, p)| (id.clone(), *p)).collect();
        scores.sort_by(|a, b| b.1.cmp(&a.1));
        scores
            .into_iter()
            .enumerate()
            .map(|(i, (player_id, points))| PlayerScoreBreakdown {
                player_id,
                points,
                rank: (i + 1) as u32,
            })
            .collect::<Vec<_>>()
    };
    ctx.room.state.enter_phase(Phase::BonusRoundResult);
    ctx.clear_timers();
    ctx.broadcast(ServerMessage::PhaseChange { phase: Phase::BonusRoundResult });
    ctx.broadcast(ServerMessage::HotButtonEnd { breakdown });
    ctx.broadcast_snapshot();
    ctx.arm_timer(RESULT_DISPLAY);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_question() -> Question {
        use crate::model::category::CategoryId;
        use crate::model::question::{Difficulty, QuestionId};
        Question {
            id: QuestionId("hb1".into()),
            category_id: CategoryId("geo".into()),
            text: "The capital of France".into(),
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
    fn correct_answer_text_reads_hot_button_content() {
        assert_eq!(correct_answer_text(&sample_question()), "Paris");
    }

    #[test]
    fn speed_bonus_steps_down_as_more_text_is_revealed() {
        assert_eq!(hot_button_speed_bonus(0.1), 500);
        assert_eq!(hot_button_speed_bonus(0.25), 500);
        assert_eq!(hot_button_speed_bonus(0.4), 300);
        assert_eq!(hot_button_speed_bonus(0.6), 150);
        assert_eq!(hot_button_speed_bonus(0.9), HOT_BUTTON_SPEED_BONUS_FALLBACK);
    }
}

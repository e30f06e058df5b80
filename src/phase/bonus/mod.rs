//! Bonus round dispatch (spec.md §4.5, §4.6): decides collective-list vs
//! hot-button for the round, runs the shared intro ack-gate (skipped once
//! a room has already seen that bonus type), and hands off to whichever
//! submodule owns the round in progress.

pub mod collective_list;
pub mod hot_button;

use crate::config::{HOT_BUTTON_INTRO_HOLD, INTRO_MAX_WAIT};
use crate::ids::PlayerId;
use crate::model::bonus::{BonusRoundState, BonusType};
use crate::model::room::AckKind;
use crate::model::settings::CustomRoundSpec;
use crate::model::state::Phase;
use crate::phase::ctx::Ctx;
use crate::phase::{rematch, scoreboard};
use crate::transport::messages::ServerMessage;
use rand::Rng;

fn choose_bonus_type(ctx: &mut Ctx) -> BonusType {
    let round = ctx.room.state.current_round;
    if ctx.room.settings.custom_mode {
        if let Some(spec) = ctx.room.settings.custom_rounds.get((round.saturating_sub(1)) as usize) {
            match spec {
                CustomRoundSpec::HotButton => return BonusType::HotButton,
                CustomRoundSpec::CollectiveList { .. } => return BonusType::CollectiveList,
                CustomRoundSpec::QuestionRound { .. } => {}
            }
        }
    }
    if ctx.rng.random_bool(0.5) {
        BonusType::HotButton
    } else {
        BonusType::CollectiveList
    }
}

/// `BonusRoundAnnouncement`'s hold timer fired: load the round's content
/// and enter `bonus_round`, or fall through to the scoreboard if the
/// question store has nothing left to offer (spec.md §4.3's "bank
/// exhausted" failure mode, generalized to bonus content).
pub async fn begin(ctx: &mut Ctx) {
    let bonus_type = choose_bonus_type(ctx);
    let state = match bonus_type {
        BonusType::CollectiveList => collective_list::load(ctx).await.map(BonusRoundState::CollectiveList),
        BonusType::HotButton => hot_button::load(ctx).await.map(BonusRoundState::HotButton),
    };
    let Some(state) = state else {
        log::warn!(
            "bonus content exhausted ({bonus_type:?}) in room {}; skipping to scoreboard",
            ctx.room.code
        );
        scoreboard::begin(ctx).await;
        return;
    };
    ctx.room.state.bonus_round = Some(state);
    ctx.room.state.used_bonus_types.insert(bonus_type);
    ctx.room.state.enter_phase(Phase::BonusRound);
    ctx.clear_timers();
    ctx.broadcast(ServerMessage::PhaseChange { phase: Phase::BonusRound });
    ctx.broadcast_snapshot();
    if ctx.room.explained_bonus_intros.contains(&bonus_type) {
        advance_past_intro(ctx);
        return;
    }
    let fallback = match bonus_type {
        BonusType::CollectiveList => INTRO_MAX_WAIT,
        BonusType::HotButton => HOT_BUTTON_INTRO_HOLD,
    };
    ctx.arm_ack(AckKind::Intro, fallback);
}

fn advance_past_intro(ctx: &mut Ctx) {
    ctx.clear_ack();
    let Some(bonus_type) = ctx.room.state.bonus_round.as_ref().map(|s| s.bonus_type()) else { return };
    ctx.room.explained_bonus_intros.insert(bonus_type);
    match bonus_type {
        BonusType::CollectiveList => collective_list::start_playing(ctx),
        BonusType::HotButton => hot_button::start_first_question(ctx),
    }
}

pub fn handle_intro_ready(ctx: &mut Ctx, player_id: &PlayerId) {
    if ctx.room.state.phase != Phase::BonusRound || ctx.room.pending_ack.is_none() {
        return;
    }
    if ctx.record_ack(player_id, AckKind::Intro) {
        advance_past_intro(ctx);
    }
}

pub fn handle_buzz(ctx: &mut Ctx, player_id: PlayerId) {
    hot_button::handle_buzz(ctx, player_id);
}

pub async fn handle_answer(ctx: &mut Ctx, player_id: PlayerId, text: String) {
    let Some(bonus_type) = ctx.room.state.bonus_round.as_ref().map(|s| s.bonus_type()) else { return };
    match bonus_type {
        BonusType::CollectiveList => collective_list::handle_answer(ctx, player_id, text).await,
        BonusType::HotButton => hot_button::handle_answer(ctx, player_id, text).await,
    }
}

pub fn handle_skip(ctx: &mut Ctx, player_id: PlayerId) {
    if matches!(ctx.room.state.bonus_round, Some(BonusRoundState::CollectiveList(_))) {
        collective_list::handle_skip(ctx, player_id);
    }
}

/// Every non-ack timer fire while `BonusRound`/`BonusRoundResult` is the
/// active phase routes through here. Ack fallback is handled first since
/// it can fire during either bonus type's intro hold.
pub async fn on_timer(ctx: &mut Ctx) {
    if ctx.room.pending_ack.is_some() {
        advance_past_intro(ctx);
        return;
    }
    let Some(bonus_type) = ctx.room.state.bonus_round.as_ref().map(|s| s.bonus_type()) else { return };
    match bonus_type {
        BonusType::CollectiveList => collective_list::on_timer(ctx).await,
        BonusType::HotButton => hot_button::on_timer(ctx).await,
    }
}

pub fn on_reveal_tick(ctx: &mut Ctx) {
    hot_button::on_reveal_tick(ctx);
}

/// `BonusRoundResult`'s display hold fired: bonus rounds skip the
/// scoreboard entirely on the final round and go straight to the final
/// results screen (spec.md §4.6, §4.7).
pub async fn on_result_hold_timer(ctx: &mut Ctx) {
    if ctx.room.state.current_round >= ctx.room.settings.max_rounds as u32 {
        rematch::begin_final(ctx).await;
    } else {
        scoreboard::begin(ctx).await;
    }
}

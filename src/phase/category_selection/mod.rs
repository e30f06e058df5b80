//! Category selection (spec.md §4.4): picks the mode for a round, seeds
//! the shared `votingCategories`, and dispatches into the chosen mode's
//! submodule. Grounded on the buzzer-beater room's command-match idiom
//! for the individual modes; the mode-selection weighting itself has no
//! direct teacher precedent and is written fresh from spec.md's prose.

pub mod dice_royale;
pub mod losers_pick;
pub mod rps_duel;
pub mod voting;
pub mod wheel;

use crate::config::{ANNOUNCEMENT_HOLD, LOSER_PICK_COOLDOWN, VOTING_CATEGORY_COUNT};
use crate::model::settings::{CategoryMode, CustomRoundSpec};
use crate::model::state::Phase;
use crate::phase::ctx::Ctx;
use crate::phase::question_round;
use crate::transport::messages::ServerMessage;
use rand::Rng;
use rand::seq::{IndexedRandom, IteratorRandom};

/// Kicks off a new round: decides whether it's a bonus round or a normal
/// question round, then (for question rounds) the category-selection mode.
pub async fn begin_round(ctx: &mut Ctx) {
    if is_bonus_round(ctx) {
        begin_bonus_announcement(ctx);
        return;
    }
    let mode = choose_mode(ctx);
    seed_voting_categories(ctx).await;
    ctx.room.state.enter_phase(Phase::CategoryAnnouncement);
    ctx.clear_timers();
    ctx.broadcast(ServerMessage::CategoryMode { mode });
    ctx.broadcast(ServerMessage::PhaseChange {
        phase: Phase::CategoryAnnouncement,
    });
    ctx.broadcast_snapshot();
    ctx.pending_category_mode = Some(mode);
    ctx.arm_timer(ANNOUNCEMENT_HOLD);
}

/// `CategoryAnnouncement`'s hold timer fired: enter the chosen mode.
pub fn on_announcement_timer(ctx: &mut Ctx) {
    let mode = ctx.pending_category_mode.take().unwrap_or(CategoryMode::Voting);
    ctx.clear_timers();
    match mode {
        CategoryMode::Voting => voting::begin(ctx),
        CategoryMode::Wheel => wheel::begin(ctx),
        CategoryMode::LosersPick => losers_pick::begin(ctx),
        CategoryMode::DiceRoyale => dice_royale::begin(ctx),
        CategoryMode::RpsDuel => rps_duel::begin(ctx),
    }
}

/// Common continuation once a category id has been decided by any mode:
/// record it and load the round's questions.
pub async fn on_category_selected(ctx: &mut Ctx, category_id: crate::model::category::CategoryId) {
    ctx.room.state.selected_category = Some(category_id.clone());
    ctx.broadcast(ServerMessage::CategorySelected { category_id });
    question_round::begin(ctx).await;
}

fn is_bonus_round(ctx: &mut Ctx) -> bool {
    let round = ctx.room.state.current_round;
    if ctx.room.settings.custom_mode {
        return ctx
            .room
            .settings
            .custom_rounds
            .get((round - 1) as usize)
            .is_some_and(|r| matches!(r, CustomRoundSpec::HotButton | CustomRoundSpec::CollectiveList { .. }));
    }
    if ctx.room.settings.final_round_always_bonus && round == ctx.room.settings.max_rounds as u32 {
        return true;
    }
    let chance = ctx.room.settings.bonus_round_chance;
    let roll: u8 = ctx.rng.random_range(0..100);
    roll < chance
}

fn choose_mode(ctx: &mut Ctx) -> CategoryMode {
    if ctx.room.settings.custom_mode {
        let round = ctx.room.state.current_round;
        if let Some(CustomRoundSpec::QuestionRound {
            category_mode: Some(m),
            ..
        }) = ctx.room.settings.custom_rounds.get((round - 1) as usize)
        {
            return *m;
        }
    }
    let connected = ctx.room.players.connected_ids().len();
    let mut candidates = vec![CategoryMode::Voting, CategoryMode::Wheel, CategoryMode::LosersPick];
    if connected >= 2 {
        candidates.push(CategoryMode::DiceRoyale);
        candidates.push(CategoryMode::RpsDuel);
    }
    let eligible_for_losers_pick = ctx
        .room
        .state
        .last_loser_pick_round
        .is_none_or(|last| ctx.room.state.current_round.saturating_sub(last) >= LOSER_PICK_COOLDOWN);
    if !eligible_for_losers_pick {
        candidates.retain(|m| *m != CategoryMode::LosersPick);
    }
    *candidates.choose(&mut ctx.rng).unwrap_or(&CategoryMode::Voting)
}

async fn seed_voting_categories(ctx: &mut Ctx) {
    let categories = ctx.questions.categories().await.unwrap_or_default();
    if categories.is_empty() {
        return;
    }
    let picked: Vec<_> = categories
        .iter()
        .filter(|c| c.is_active)
        .choose_multiple(&mut ctx.rng, VOTING_CATEGORY_COUNT)
        .into_iter()
        .map(|c| c.id.clone())
        .collect();
    ctx.room.state.voting_categories = picked;
}

fn begin_bonus_announcement(ctx: &mut Ctx) {
    ctx.room.state.enter_phase(Phase::BonusRoundAnnouncement);
    ctx.clear_timers();
    ctx.broadcast(ServerMessage::PhaseChange {
        phase: Phase::BonusRoundAnnouncement,
    });
    ctx.broadcast_snapshot();
    ctx.arm_timer(ANNOUNCEMENT_HOLD);
}

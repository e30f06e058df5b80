//! Loser's pick (spec.md §4.4.3): lowest-score connected player (earliest
//! joined breaks ties) gets 15 s to choose, else a random fallback.

use crate::config::LOSER_PICK_WINDOW;
use crate::ids::PlayerId;
use crate::model::category::CategoryId;
use crate::model::state::Phase;
use crate::phase::category_selection;
use crate::phase::ctx::Ctx;
use crate::transport::messages::ServerMessage;
use rand::seq::IndexedRandom;

fn pick_loser(ctx: &Ctx) -> Option<PlayerId> {
    ctx.room
        .players
        .iter()
        .filter(|p| p.is_connected)
        .min_by_key(|p| p.score)
        .map(|p| p.id.clone())
}

pub fn begin(ctx: &mut Ctx) {
    ctx.room.state.enter_phase(Phase::CategoryLosersPick);
    ctx.clear_timers();
    ctx.room.state.loser_pick_player_id = pick_loser(ctx);
    ctx.room.state.last_loser_pick_round = Some(ctx.room.state.current_round);
    ctx.broadcast(ServerMessage::PhaseChange { phase: Phase::CategoryLosersPick });
    ctx.broadcast_snapshot();
    ctx.arm_timer(LOSER_PICK_WINDOW);
}

pub async fn handle_pick(ctx: &mut Ctx, player_id: PlayerId, category_id: CategoryId) {
    if ctx.room.state.phase != Phase::CategoryLosersPick {
        return;
    }
    if ctx.room.state.loser_pick_player_id.as_ref() != Some(&player_id) {
        return;
    }
    if !ctx.room.state.voting_categories.contains(&category_id) {
        return;
    }
    ctx.clear_timers();
    category_selection::on_category_selected(ctx, category_id).await;
}

pub async fn on_timer(ctx: &mut Ctx) {
    let fallback = ctx.room.state.voting_categories.choose(&mut ctx.rng).cloned();
    if let Some(fallback) = fallback {
        category_selection::on_category_selected(ctx, fallback).await;
    }
}

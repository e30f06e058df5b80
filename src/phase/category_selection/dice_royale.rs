//! Dice royale (spec.md §4.4.4): every connected player rolls 2d6;
//! highest sum wins; ties reroll indefinitely among the tied players only.

use crate::config::{CATEGORY_PICK_WINDOW, DICE_ROYALE_REROLL_WINDOW, DICE_ROYALE_ROLL_WINDOW, DICE_ROYALE_TIE_HOLD};
use crate::ids::PlayerId;
use crate::model::category::CategoryId;
use crate::model::state::{DiceRoyalePhase, DiceRoyaleState, Phase};
use crate::phase::category_selection;
use crate::phase::ctx::Ctx;
use crate::transport::messages::ServerMessage;
use rand::Rng;
use rand::seq::IndexedRandom;

fn roll_die(rng: &mut impl Rng) -> u8 {
    rng.random_range(1..=6)
}

pub fn begin(ctx: &mut Ctx) {
    ctx.room.state.enter_phase(Phase::CategoryDiceRoyale);
    ctx.clear_timers();
    let player_rolls = ctx
        .room
        .players
        .connected_ids()
        .into_iter()
        .map(|id| (id, None))
        .collect();
    ctx.room.state.dice_royale = Some(DiceRoyaleState {
        player_rolls,
        tied_player_ids: Vec::new(),
        phase: DiceRoyalePhase::Rolling,
        round: 1,
        awaiting_reroll: false,
    });
    let player_ids = ctx.room.players.connected_ids();
    ctx.broadcast(ServerMessage::PhaseChange { phase: Phase::CategoryDiceRoyale });
    ctx.broadcast(ServerMessage::DiceRoyaleStart { player_ids });
    ctx.broadcast_snapshot();
    ctx.arm_timer(DICE_ROYALE_ROLL_WINDOW);
}

pub fn handle_roll(ctx: &mut Ctx, player_id: PlayerId) {
    let Phase::CategoryDiceRoyale = ctx.room.state.phase else { return };
    let rolled = {
        let Some(state) = ctx.room.state.dice_royale.as_mut() else { return };
        if state.phase == DiceRoyalePhase::Result || state.awaiting_reroll {
            return;
        }
        match state.player_rolls.get(&player_id) {
            Some(None) => {
                let dice = (roll_die(&mut ctx.rng), roll_die(&mut ctx.rng));
                state.player_rolls.insert(player_id.clone(), Some(dice));
                Some(dice)
            }
            _ => None,
        }
    };
    let Some(rolls) = rolled else { return };
    ctx.broadcast(ServerMessage::DiceRoyaleRoll { player_id, rolls });
    let all_rolled = ctx.room.state.dice_royale.as_ref().is_some_and(|s| s.all_rolled());
    if all_rolled {
        resolve_round(ctx);
    } else {
        ctx.broadcast_snapshot();
    }
}

fn auto_roll_remaining(ctx: &mut Ctx) {
    let Some(state) = ctx.room.state.dice_royale.as_mut() else { return };
    let unrolled: Vec<PlayerId> = state
        .player_rolls
        .iter()
        .filter(|(_, roll)| roll.is_none())
        .map(|(id, _)| id.clone())
        .collect();
    for id in unrolled {
        let dice = (roll_die(&mut ctx.rng), roll_die(&mut ctx.rng));
        ctx.room.state.dice_royale.as_mut().unwrap().player_rolls.insert(id.clone(), Some(dice));
        ctx.broadcast(ServerMessage::DiceRoyaleRoll { player_id: id, rolls: dice });
    }
}

fn resolve_round(ctx: &mut Ctx) {
    let winners = ctx.room.state.dice_royale.as_ref().map(|s| s.highest_sum_winners()).unwrap_or_default();
    if winners.len() <= 1 {
        let Some(winner) = winners.into_iter().next() else { return };
        if let Some(state) = ctx.room.state.dice_royale.as_mut() {
            state.phase = DiceRoyalePhase::Result;
        }
        ctx.room.state.loser_pick_player_id = Some(winner.clone());
        ctx.broadcast(ServerMessage::DiceRoyaleWinner { player_id: winner });
        ctx.broadcast(ServerMessage::DiceRoyalePick);
        ctx.broadcast_snapshot();
        ctx.retoken();
        ctx.arm_timer(CATEGORY_PICK_WINDOW);
        return;
    }
    let round = ctx.room.state.dice_royale.as_ref().map(|s| s.round + 1).unwrap_or(2);
    if let Some(state) = ctx.room.state.dice_royale.as_mut() {
        state.tied_player_ids = winners.clone();
        state.round = round;
        state.phase = DiceRoyalePhase::Reroll;
        state.awaiting_reroll = true;
        state.player_rolls = winners.iter().cloned().map(|id| (id, None)).collect();
    }
    ctx.broadcast(ServerMessage::DiceRoyaleTie { tied_player_ids: winners, round });
    ctx.broadcast_snapshot();
    ctx.retoken();
    ctx.arm_timer(DICE_ROYALE_TIE_HOLD);
}

pub async fn on_timer(ctx: &mut Ctx) {
    let Some(state) = ctx.room.state.dice_royale.as_ref() else { return };
    if state.phase == DiceRoyalePhase::Result {
        let fallback = ctx.room.state.voting_categories.choose(&mut ctx.rng).cloned();
        if let Some(fallback) = fallback {
            category_selection::on_category_selected(ctx, fallback).await;
        }
        return;
    }
    if state.awaiting_reroll {
        if let Some(state) = ctx.room.state.dice_royale.as_mut() {
            state.awaiting_reroll = false;
        }
        ctx.broadcast_snapshot();
        ctx.retoken();
        ctx.arm_timer(DICE_ROYALE_REROLL_WINDOW);
        return;
    }
    auto_roll_remaining(ctx);
    resolve_round(ctx);
}

pub async fn handle_pick(ctx: &mut Ctx, player_id: PlayerId, category_id: CategoryId) {
    if ctx.room.state.phase != Phase::CategoryDiceRoyale {
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

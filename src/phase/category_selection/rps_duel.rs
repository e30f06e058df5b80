//! Rock-paper-scissors duel (spec.md §4.4.5): two distinct connected
//! players, best-of-three, extra rounds on a persistent tie.

use crate::config::{CATEGORY_PICK_WINDOW, RPS_ROUND_WINDOW};
use crate::ids::PlayerId;
use crate::model::category::CategoryId;
use crate::model::state::{Phase, RpsChoice, RpsDuelState};
use crate::phase::category_selection;
use crate::phase::ctx::Ctx;
use crate::transport::messages::ServerMessage;
use rand::seq::{IndexedRandom, SliceRandom};

pub fn begin(ctx: &mut Ctx) {
    ctx.room.state.enter_phase(Phase::CategoryRpsDuel);
    ctx.clear_timers();
    let mut connected = ctx.room.players.connected_ids();
    connected.shuffle(&mut ctx.rng);
    let (Some(a), Some(b)) = (connected.first().cloned(), connected.get(1).cloned()) else {
        // not enough players: fall back to voting rather than stall the room.
        super::voting::begin(ctx);
        return;
    };
    ctx.room.state.rps_duel = Some(RpsDuelState {
        player_a: a.clone(),
        player_b: b.clone(),
        round: 1,
        wins_a: 0,
        wins_b: 0,
        choice_a: None,
        choice_b: None,
    });
    ctx.broadcast(ServerMessage::PhaseChange { phase: Phase::CategoryRpsDuel });
    ctx.broadcast(ServerMessage::RpsDuelStart { player_a: a, player_b: b });
    ctx.broadcast(ServerMessage::RpsRoundStart { round: 1 });
    ctx.broadcast_snapshot();
    ctx.arm_timer(RPS_ROUND_WINDOW);
}

pub fn handle_choice(ctx: &mut Ctx, player_id: PlayerId, choice: RpsChoice) {
    if ctx.room.state.phase != Phase::CategoryRpsDuel {
        return;
    }
    let Some(duel) = ctx.room.state.rps_duel.as_mut() else { return };
    if duel.is_decided() {
        return;
    }
    if duel.player_a == player_id {
        duel.choice_a = Some(choice);
    } else if duel.player_b == player_id {
        duel.choice_b = Some(choice);
    } else {
        return;
    }
    ctx.broadcast(ServerMessage::RpsChoiceMade { player_id });
    let both_in = ctx
        .room
        .state
        .rps_duel
        .as_ref()
        .is_some_and(|d| d.choice_a.is_some() && d.choice_b.is_some());
    if both_in {
        resolve_round(ctx);
    }
}

fn resolve_round(ctx: &mut Ctx) {
    let Some(duel) = ctx.room.state.rps_duel.as_mut() else { return };
    let a = duel.choice_a.unwrap_or_else(|| random_choice(&mut ctx.rng));
    let b = duel.choice_b.unwrap_or_else(|| random_choice(&mut ctx.rng));
    let round_winner = if a.beats(b) {
        duel.wins_a += 1;
        Some(duel.player_a.clone())
    } else if b.beats(a) {
        duel.wins_b += 1;
        Some(duel.player_b.clone())
    } else {
        None
    };
    ctx.broadcast(ServerMessage::RpsRoundResult { choice_a: a, choice_b: b, round_winner });
    let decided = ctx.room.state.rps_duel.as_ref().unwrap().is_decided();
    if decided {
        let winner = ctx.room.state.rps_duel.as_ref().unwrap().winner().cloned();
        if let Some(winner) = winner {
            ctx.room.state.loser_pick_player_id = Some(winner.clone());
            ctx.broadcast(ServerMessage::RpsDuelWinner { player_id: winner });
            ctx.broadcast(ServerMessage::RpsDuelPick);
            ctx.broadcast_snapshot();
            ctx.retoken();
            ctx.arm_timer(CATEGORY_PICK_WINDOW);
        }
        return;
    }
    if let Some(duel) = ctx.room.state.rps_duel.as_mut() {
        duel.round += 1;
        duel.choice_a = None;
        duel.choice_b = None;
    }
    let round = ctx.room.state.rps_duel.as_ref().unwrap().round;
    ctx.broadcast(ServerMessage::RpsRoundStart { round });
    ctx.broadcast_snapshot();
    ctx.retoken();
    ctx.arm_timer(RPS_ROUND_WINDOW);
}

fn random_choice(rng: &mut rand::rngs::SmallRng) -> RpsChoice {
    *[RpsChoice::Rock, RpsChoice::Paper, RpsChoice::Scissors]
        .choose(rng)
        .expect("non-empty")
}

pub async fn on_timer(ctx: &mut Ctx) {
    let is_decided = ctx.room.state.rps_duel.as_ref().is_some_and(|d| d.is_decided());
    if is_decided {
        let fallback = ctx.room.state.voting_categories.choose(&mut ctx.rng).cloned();
        if let Some(fallback) = fallback {
            category_selection::on_category_selected(ctx, fallback).await;
        }
        return;
    }
    resolve_round(ctx);
}

pub async fn handle_pick(ctx: &mut Ctx, player_id: PlayerId, category_id: CategoryId) {
    if ctx.room.state.phase != Phase::CategoryRpsDuel {
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

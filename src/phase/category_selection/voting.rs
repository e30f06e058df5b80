//! Category voting (spec.md §4.4.1): 15 s window, highest vote count
//! wins, ties broken by a server-seeded roulette.

use crate::config::{VOTING_TIEBREAK_HOLD, VOTING_WINDOW};
use crate::ids::PlayerId;
use crate::model::category::CategoryId;
use crate::model::state::Phase;
use crate::phase::category_selection;
use crate::phase::ctx::Ctx;
use crate::transport::messages::ServerMessage;
use rand::seq::IndexedRandom;
use std::collections::HashMap;

pub fn begin(ctx: &mut Ctx) {
    ctx.room.state.enter_phase(Phase::CategoryVoting);
    ctx.room.state.category_votes.clear();
    ctx.clear_timers();
    ctx.broadcast(ServerMessage::PhaseChange { phase: Phase::CategoryVoting });
    ctx.broadcast_snapshot();
    ctx.arm_timer(VOTING_WINDOW);
}

pub fn handle_vote(ctx: &mut Ctx, player_id: PlayerId, category_id: CategoryId) {
    if ctx.room.state.phase != Phase::CategoryVoting {
        return;
    }
    if !ctx.room.state.voting_categories.contains(&category_id) {
        return;
    }
    ctx.room.state.category_votes.insert(player_id, category_id);
    ctx.broadcast_snapshot();
}

fn tally(ctx: &Ctx) -> Vec<CategoryId> {
    let mut counts: HashMap<&CategoryId, u32> = HashMap::new();
    for category_id in ctx.room.state.category_votes.values() {
        *counts.entry(category_id).or_default() += 1;
    }
    let Some(&best) = counts.values().max() else {
        return Vec::new();
    };
    let mut winners: Vec<CategoryId> = counts
        .into_iter()
        .filter(|(_, count)| *count == best)
        .map(|(id, _)| id.clone())
        .collect();
    winners.sort();
    winners
}

pub async fn on_timer(ctx: &mut Ctx) {
    if ctx.pending_category.is_some() {
        // second-stage fire: the tiebreak hold expired, confirm the winner.
        let winner = ctx.pending_category.take().unwrap();
        category_selection::on_category_selected(ctx, winner).await;
        return;
    }
    let tally = tally(ctx);
    let winner = match tally.len() {
        0 => ctx.room.state.voting_categories.choose(&mut ctx.rng).cloned(),
        1 => Some(tally[0].clone()),
        _ => {
            let winner = tally.choose(&mut ctx.rng).cloned();
            if let Some(winner) = winner.clone() {
                ctx.broadcast(ServerMessage::VotingTiebreaker {
                    tied_categories: tally,
                    winner_id: winner.clone(),
                });
                ctx.pending_category = Some(winner);
                ctx.retoken();
                ctx.arm_timer(VOTING_TIEBREAK_HOLD);
                return;
            }
            winner
        }
    };
    if let Some(winner) = winner {
        category_selection::on_category_selected(ctx, winner).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tally_picks_unique_majority() {
        let mut votes = HashMap::new();
        let a = CategoryId("a".into());
        let b = CategoryId("b".into());
        votes.insert(PlayerId::generate(&mut rand::rng()), a.clone());
        votes.insert(PlayerId::generate(&mut rand::rng()), a.clone());
        votes.insert(PlayerId::generate(&mut rand::rng()), b.clone());
        let mut counts: HashMap<CategoryId, u32> = HashMap::new();
        for v in votes.values() {
            *counts.entry(v.clone()).or_default() += 1;
        }
        let best = counts.values().max().copied().unwrap();
        assert_eq!(best, 2);
    }
}

//! Collective-list bonus round (spec.md §4.5): players take turns naming
//! items from a list until everything is named or only one player is left
//! standing. Grounded on `category_selection::dice_royale`'s turn-taking
//! shape (a `current_turn_index` cycled modulo an active-player list) and
//! on `fuzzy::FuzzyMatcher` for matching a free-text guess to an item.

use crate::config::{CORRECT_ANSWER_DELAY, COLLECTIVE_LIST_WINNER_BONUS_MULTI, COLLECTIVE_LIST_WINNER_BONUS_SOLO, RESULT_DISPLAY};
use crate::ids::PlayerId;
use crate::model::bonus::BonusRoundState;
use crate::model::bonus::collective_list::{
    CollectiveListPhase, EliminatedPlayer, EliminationReason, PlayerScoreBreakdown, RuntimeListItem,
    ServerCollectiveListState,
};
use crate::model::question::QuestionContent;
use crate::model::state::Phase;
use crate::phase::ctx::Ctx;
use crate::transport::messages::ServerMessage;
use std::collections::HashSet;
use std::time::Duration;

/// Draws one collective-list question not yet used as a bonus round this
/// match and seeds turn order lowest-score-first, so a trailing player
/// gets the most chances to catch up (spec.md §4.5: "turn order favors
/// whoever is behind").
pub async fn load(ctx: &mut Ctx) -> Option<ServerCollectiveListState> {
    let used = ctx.room.state.used_bonus_question_ids.clone();
    let question = match ctx.questions.random_collective_list_question(None, &used).await {
        Ok(Some(q)) => q,
        Ok(None) => return None,
        Err(e) => {
            log::warn!("question store error drawing collective list question for room {}: {e}", ctx.room.code);
            return None;
        }
    };
    ctx.room.state.used_bonus_question_ids.insert(question.id.clone());
    let QuestionContent::CollectiveList {
        topic,
        items,
        time_per_turn_secs,
        points_per_correct,
        fuzzy_threshold,
        ..
    } = question.content
    else {
        return None;
    };
    let mut order = ctx.room.players.connected_ids();
    order.sort_by_key(|id| ctx.room.players.get(id).map(|p| p.score).unwrap_or(0));
    let items = items
        .into_iter()
        .map(|item| RuntimeListItem {
            id: item.id,
            display: item.display,
            aliases: item.aliases,
            group: item.group,
            guessed_by: None,
        })
        .collect();
    Some(ServerCollectiveListState {
        topic,
        items,
        guessed_ids: HashSet::new(),
        player_correct_counts: Default::default(),
        turn_order: order.clone(),
        active_players: order,
        current_turn_index: 0,
        turn_number: 0,
        eliminated_players: Vec::new(),
        points_per_correct,
        time_per_turn_secs,
        fuzzy_threshold,
        phase: CollectiveListPhase::Intro,
    })
}

pub fn start_playing(ctx: &mut Ctx) {
    if let Some(BonusRoundState::CollectiveList(state)) = ctx.room.state.bonus_round.as_mut() {
        state.phase = CollectiveListPhase::Playing;
    }
    begin_turn(ctx);
}

/// Advances to the next live turn, silently eliminating any disconnected
/// player found in turn order rather than waiting out their clock.
fn begin_turn(ctx: &mut Ctx) {
    loop {
        let (done, player_id) = {
            let Some(BonusRoundState::CollectiveList(state)) = ctx.room.state.bonus_round.as_mut() else { return };
            let last_standing = state.turn_order.len() > 1 && state.active_players.len() <= 1;
            if state.active_players.is_empty() || state.all_guessed() || last_standing {
                (true, None)
            } else {
                let len = state.active_players.len();
                state.current_turn_index %= len;
                (false, Some(state.active_players[state.current_turn_index].clone()))
            }
        };
        if done {
            end_round(ctx);
            return;
        }
        let player_id = player_id.expect("checked above");
        let connected = ctx.room.players.get(&player_id).is_some_and(|p| p.is_connected);
        if connected {
            let (turn_number, deadline_secs) = {
                let Some(BonusRoundState::CollectiveList(state)) = ctx.room.state.bonus_round.as_mut() else { return };
                state.turn_number += 1;
                (state.turn_number, state.time_per_turn_secs)
            };
            ctx.broadcast(ServerMessage::BonusRoundTurn { player_id, turn_number });
            ctx.broadcast_snapshot();
            ctx.retoken();
            ctx.arm_timer(Duration::from_secs(deadline_secs));
            return;
        }
        eliminate(ctx, &player_id, EliminationReason::Timeout);
    }
}

/// Removes `player_id` from `active_players` and records the elimination.
fn eliminate(ctx: &mut Ctx, player_id: &PlayerId, reason: EliminationReason) {
    let Some(BonusRoundState::CollectiveList(state)) = ctx.room.state.bonus_round.as_mut() else { return };
    if let Some(pos) = state.active_players.iter().position(|id| id == player_id) {
        state.active_players.remove(pos);
        if pos < state.current_turn_index {
            state.current_turn_index -= 1;
        }
    }
    let rank = (state.eliminated_players.len() + 1) as u32;
    state.eliminated_players.push(EliminatedPlayer {
        player_id: player_id.clone(),
        reason: reason.clone(),
        rank,
    });
    ctx.broadcast(ServerMessage::BonusRoundEliminate {
        player_id: player_id.clone(),
        reason,
        rank,
    });
}

fn current_turn_player(ctx: &Ctx) -> Option<PlayerId> {
    match ctx.room.state.bonus_round.as_ref() {
        Some(BonusRoundState::CollectiveList(state)) => state.current_turn_player().cloned(),
        _ => None,
    }
}

pub async fn handle_answer(ctx: &mut Ctx, player_id: PlayerId, text: String) {
    if ctx.room.state.phase != Phase::BonusRound || current_turn_player(ctx).as_ref() != Some(&player_id) {
        return;
    }
    let (items, guessed, threshold) = {
        let Some(BonusRoundState::CollectiveList(state)) = ctx.room.state.bonus_round.as_ref() else { return };
        if state.phase != CollectiveListPhase::Playing {
            return;
        }
        (state.items.clone(), state.guessed_ids.clone(), state.fuzzy_threshold)
    };
    let result = ctx.fuzzy.try_match(&text, &items, &guessed, threshold).await;
    if !result.is_match || result.already_guessed {
        eliminate(ctx, &player_id, EliminationReason::Wrong);
        begin_turn(ctx);
        return;
    }
    let item_id = result.matched_item_id.expect("is_match implies an item");
    let (points, all_guessed) = {
        let Some(BonusRoundState::CollectiveList(state)) = ctx.room.state.bonus_round.as_mut() else { return };
        state.guessed_ids.insert(item_id.clone());
        if let Some(item) = state.items.iter_mut().find(|i| i.id == item_id) {
            item.guessed_by = Some(player_id.clone());
        }
        *state.player_correct_counts.entry(player_id.clone()).or_default() += 1;
        state.current_turn_index += 1;
        (state.points_per_correct, state.all_guessed())
    };
    if let Some(player) = ctx.room.players.get_mut(&player_id) {
        player.add_score(points);
    }
    ctx.broadcast(ServerMessage::BonusRoundCorrect {
        player_id,
        item_id,
        points,
    });
    if all_guessed {
        begin_turn(ctx);
        return;
    }
    // Hold for the reveal animation before the next player's turn starts
    // (spec.md §4.5).
    if let Some(BonusRoundState::CollectiveList(state)) = ctx.room.state.bonus_round.as_mut() {
        state.phase = CollectiveListPhase::CorrectHold;
    }
    ctx.broadcast_snapshot();
    ctx.retoken();
    ctx.arm_timer(CORRECT_ANSWER_DELAY);
}

pub fn handle_skip(ctx: &mut Ctx, player_id: PlayerId) {
    if ctx.room.state.phase != Phase::BonusRound || current_turn_player(ctx).as_ref() != Some(&player_id) {
        return;
    }
    eliminate(ctx, &player_id, EliminationReason::Skip);
    begin_turn(ctx);
}

pub async fn on_timer(ctx: &mut Ctx) {
    let phase = match ctx.room.state.bonus_round.as_ref() {
        Some(BonusRoundState::CollectiveList(state)) => state.phase.clone(),
        _ => return,
    };
    match phase {
        CollectiveListPhase::Playing => {
            let Some(BonusRoundState::CollectiveList(state)) = ctx.room.state.bonus_round.as_ref() else { return };
            let Some(player_id) = state.current_turn_player().cloned() else { return };
            eliminate(ctx, &player_id, EliminationReason::Timeout);
            begin_turn(ctx);
        }
        CollectiveListPhase::CorrectHold => {
            if let Some(BonusRoundState::CollectiveList(state)) = ctx.room.state.bonus_round.as_mut() {
                state.phase = CollectiveListPhase::Playing;
            }
            begin_turn(ctx);
        }
        _ => {}
    }
}

/// The list is fully guessed or only one (or zero) players remain:
/// whoever is still standing splits the winner bonus (spec.md §4.5,
/// "solo survivor" vs "multiple survivors" tiers).
fn end_round(ctx: &mut Ctx) {
    let Some(BonusRoundState::CollectiveList(state)) = ctx.room.state.bonus_round.as_mut() else { return };
    state.phase = CollectiveListPhase::Finished;
    let winners = state.active_players.clone();
    let bonus_per_winner = if winners.len() == 1 {
        COLLECTIVE_LIST_WINNER_BONUS_SOLO
    } else {
        COLLECTIVE_LIST_WINNER_BONUS_MULTI
    };
    let mut ranked: Vec<(PlayerId, bool)> = winners.iter().cloned().map(|id| (id, true)).collect();
    for elim in state.eliminated_players.iter().rev() {
        ranked.push((elim.player_id.clone(), false));
    }
    let mut breakdown = Vec::with_capacity(ranked.len());
    for (rank_index, (player_id, is_winner)) in ranked.into_iter().enumerate() {
        let correct_answers = state.player_correct_counts.get(&player_id).copied().unwrap_or(0);
        let correct_points = correct_answers as i64 * state.points_per_correct;
        let rank_bonus = if is_winner && !winners.is_empty() { bonus_per_winner } else { 0 };
        breakdown.push(PlayerScoreBreakdown {
            player_id,
            correct_answers,
            correct_points,
            rank_bonus,
            total_points: correct_points + rank_bonus,
            rank: (rank_index + 1) as u32,
        });
    }
    for entry in &breakdown {
        if entry.rank_bonus != 0 {
            if let Some(player) = ctx.room.players.get_mut(&entry.player_id) {
                player.add_score(entry.rank_bonus);
            }
        }
    }
    ctx.room.state.enter_phase(Phase::BonusRoundResult);
    ctx.clear_timers();
    ctx.broadcast(ServerMessage::PhaseChange { phase: Phase::BonusRoundResult });
    ctx.broadcast(ServerMessage::CollectiveListEnd { breakdown });
    ctx.broadcast_snapshot();
    ctx.arm_timer(RESULT_DISPLAY);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::bonus::collective_list::ServerCollectiveListState;

    #[test]
    fn winner_bonus_tier_depends_on_survivor_count() {
        assert_eq!(COLLECTIVE_LIST_WINNER_BONUS_SOLO > COLLECTIVE_LIST_WINNER_BONUS_MULTI, true);
    }

    #[test]
    fn last_standing_ends_a_multi_player_round_before_the_list_is_exhausted() {
        let players: Vec<PlayerId> = (0..3).map(|i| PlayerId::generate(&mut rand::rngs::SmallRng::seed_from_u64(i))).collect();
        use rand::SeedableRng;
        let state = ServerCollectiveListState {
            topic: "Capitals".into(),
            items: vec![
                RuntimeListItem { id: "a".into(), display: "A".into(), aliases: vec![], group: None, guessed_by: None },
                RuntimeListItem { id: "b".into(), display: "B".into(), aliases: vec![], group: None, guessed_by: None },
            ],
            guessed_ids: HashSet::new(),
            player_correct_counts: Default::default(),
            turn_order: players.clone(),
            active_players: vec![players[1].clone()],
            current_turn_index: 0,
            turn_number: 3,
            eliminated_players: Vec::new(),
            points_per_correct: 50,
            time_per_turn_secs: 15,
            fuzzy_threshold: 0.8,
            phase: CollectiveListPhase::Playing,
        };
        let last_standing = state.turn_order.len() > 1 && state.active_players.len() <= 1;
        assert!(last_standing, "one survivor out of three should end the round even with items left unguessed");
        assert!(!state.all_guessed());
    }
}

//! Final results and rematch voting (spec.md §4.7): ranks players and
//! surfaces match statistics, then holds a 30s vote on whether to play
//! again. Grounded on `lobby`'s join/leave shape for the post-vote reset
//! back into a fresh lobby.

use crate::config::{FINAL_RESULTS_HOLD, REMATCH_VOTING_WINDOW};
use crate::ids::PlayerId;
use crate::model::state::Phase;
use crate::phase::ctx::Ctx;
use crate::phase::lobby;
use crate::transport::messages::{
    CategoryPerformance, PlayerCategoryPerformance, PlayerFinalStats, PublicPlayer, ServerMessage,
};

fn build_statistics(ctx: &Ctx) -> Vec<PlayerFinalStats> {
    ctx.room
        .players
        .iter()
        .map(|p| PlayerFinalStats {
            player_id: p.id.clone(),
            correct_answers: p.stats.correct_answers,
            total_answers: p.stats.total_answers,
            accuracy: p.stats.accuracy(),
            estimation_points: p.stats.estimation_points,
            estimation_questions: p.stats.estimation_questions,
            fastest_answer_ms: p.stats.fastest_answer_ms,
            longest_streak: p.stats.longest_streak,
        })
        .collect()
}

/// Highest total estimation score, ties broken by join order.
fn best_estimator(ctx: &Ctx) -> Option<PlayerId> {
    ctx.room
        .players
        .iter()
        .filter(|p| p.stats.estimation_questions > 0)
        .max_by_key(|p| p.stats.estimation_points)
        .map(|p| p.id.clone())
}

/// Top three by fastest single answer, restricted to players with at
/// least three answers so one lucky snap-buzz doesn't dominate the list.
fn fastest_fingers(ctx: &Ctx) -> Vec<PlayerId> {
    let mut eligible: Vec<_> = ctx
        .room
        .players
        .iter()
        .filter(|p| p.stats.total_answers >= 3)
        .filter_map(|p| p.stats.fastest_answer_ms.map(|ms| (p.id.clone(), ms)))
        .collect();
    eligible.sort_by_key(|(_, ms)| *ms);
    eligible.into_iter().take(3).map(|(id, _)| id).collect()
}

fn category_performance(ctx: &Ctx) -> Vec<PlayerCategoryPerformance> {
    ctx.room
        .players
        .iter()
        .map(|p| {
            let categories: Vec<CategoryPerformance> = p
                .stats
                .per_category
                .iter()
                .map(|(category_id, acc)| CategoryPerformance {
                    category_id: category_id.clone(),
                    correct: acc.correct,
                    total: acc.total,
                    accuracy: acc.accuracy(),
                })
                .collect();
            let best_category = categories
                .iter()
                .max_by(|a, b| a.accuracy.total_cmp(&b.accuracy))
                .map(|c| c.category_id.clone());
            let worst_category = categories
                .iter()
                .min_by(|a, b| a.accuracy.total_cmp(&b.accuracy))
                .map(|c| c.category_id.clone());
            PlayerCategoryPerformance {
                player_id: p.id.clone(),
                categories,
                best_category,
                worst_category,
            }
        })
        .collect()
}

pub async fn begin_final(ctx: &mut Ctx) {
    ctx.room.state.enter_phase(Phase::Final);
    ctx.clear_timers();
    let mut rankings: Vec<&crate::model::player::Player> = ctx.room.players.iter().collect();
    rankings.sort_by(|a, b| b.score.cmp(&a.score));
    let rankings: Vec<PublicPlayer> = rankings.into_iter().map(PublicPlayer::from).collect();
    ctx.broadcast(ServerMessage::PhaseChange { phase: Phase::Final });
    ctx.broadcast(ServerMessage::GameOver {
        rankings,
        statistics: build_statistics(ctx),
        best_estimator: best_estimator(ctx),
        fastest_fingers: fastest_fingers(ctx),
        category_performance: category_performance(ctx),
    });
    ctx.broadcast_snapshot();
    ctx.arm_timer(FINAL_RESULTS_HOLD);
}

pub async fn on_final_hold_timer(ctx: &mut Ctx) {
    if ctx.room.state.phase != Phase::Final {
        return;
    }
    begin_voting(ctx);
}

fn begin_voting(ctx: &mut Ctx) {
    ctx.room.state.enter_phase(Phase::RematchVoting);
    ctx.clear_timers();
    ctx.room.state.rematch_votes.clear();
    ctx.broadcast(ServerMessage::PhaseChange { phase: Phase::RematchVoting });
    ctx.broadcast(ServerMessage::RematchVotingStart);
    ctx.broadcast_snapshot();
    ctx.arm_timer(REMATCH_VOTING_WINDOW);
}

/// A "no" vote leaves the room immediately; a "yes" just records and,
/// once every connected player has voted, resolves early.
pub async fn handle_vote(ctx: &mut Ctx, player_id: PlayerId, yes: bool) {
    if ctx.room.state.phase != Phase::RematchVoting {
        return;
    }
    ctx.room.state.rematch_votes.insert(player_id.clone(), yes);
    ctx.broadcast(ServerMessage::RematchVoteUpdate {
        player_id: player_id.clone(),
        yes,
    });
    if !yes {
        lobby::handle_leave(ctx, player_id);
        return;
    }
    let connected = ctx.room.players.connected_ids();
    let all_voted = connected.iter().all(|id| ctx.room.state.rematch_votes.contains_key(id));
    if all_voted {
        resolve(ctx);
    } else {
        ctx.broadcast_snapshot();
    }
}

pub async fn on_timer(ctx: &mut Ctx) {
    if ctx.room.state.phase != Phase::RematchVoting {
        return;
    }
    resolve(ctx);
}

/// Rebuilds the room as a fresh lobby for everyone who voted yes; the host
/// carries over if they voted yes and are still connected, otherwise the
/// first yes-voter in roster order takes it (spec.md §4.7).
fn resolve(ctx: &mut Ctx) {
    let yes_voters: std::collections::HashSet<PlayerId> = ctx
        .room
        .state
        .rematch_votes
        .iter()
        .filter(|(_, &yes)| yes)
        .map(|(id, _)| id.clone())
        .collect();
    if yes_voters.is_empty() {
        ctx.broadcast(ServerMessage::RematchResult { continuing: Vec::new() });
        ctx.request_close();
        return;
    }
    let drop_ids: Vec<PlayerId> = ctx
        .room
        .players
        .iter()
        .filter(|p| !yes_voters.contains(&p.id))
        .map(|p| p.id.clone())
        .collect();
    for id in drop_ids {
        ctx.outboxes.remove(&id);
        ctx.room.players.remove(&id);
    }
    let new_host = if yes_voters.contains(&ctx.room.host_id)
        && ctx.room.players.get(&ctx.room.host_id).is_some_and(|p| p.is_connected)
    {
        ctx.room.host_id.clone()
    } else {
        ctx.room
            .players
            .iter()
            .find(|p| yes_voters.contains(&p.id))
            .map(|p| p.id.clone())
            .unwrap_or_else(|| ctx.room.host_id.clone())
    };
    for player in ctx.room.players.iter().map(|p| p.id.clone()).collect::<Vec<_>>() {
        if let Some(p) = ctx.room.players.get_mut(&player) {
            p.is_host = p.id == new_host;
            p.score = 0;
            p.stats = Default::default();
        }
    }
    ctx.room.host_id = new_host;
    ctx.room.explained_bonus_intros.clear();
    ctx.room.state = Default::default();
    ctx.clear_timers();
    let continuing: Vec<PlayerId> = yes_voters.into_iter().collect();
    ctx.broadcast(ServerMessage::RematchResult { continuing });
    ctx.broadcast(ServerMessage::PhaseChange { phase: Phase::Lobby });
    ctx.broadcast_snapshot();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fastest_fingers_requires_minimum_answers() {
        use crate::ids::SocketId;
        use crate::model::player::Player;
        use rand::SeedableRng;
        let mut rng = rand::rngs::SmallRng::seed_from_u64(1);
        let mut p = Player::new(PlayerId::generate(&mut rng), SocketId(0), "Ada".into(), "seed".into());
        p.stats.fastest_answer_ms = Some(200);
        p.stats.total_answers = 1;
        assert!(p.stats.total_answers < 3);
    }
}

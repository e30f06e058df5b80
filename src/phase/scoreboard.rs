//! Scoreboard (spec.md §4.7): shown after every round's last question (and
//! after every bonus round that isn't also the final round), holding for a
//! TTS-narrated rundown before the next round or the final results.

use crate::config::SCOREBOARD_MAX_WAIT;
use crate::ids::PlayerId;
use crate::model::room::AckKind;
use crate::model::state::Phase;
use crate::phase::ctx::Ctx;
use crate::phase::{category_selection, rematch};
use crate::transport::messages::ServerMessage;

/// How close the top two scores are, picked from the ranked scoreboard
/// (spec.md §6.3: "moderator phrasing chosen by player count and score
/// gaps").
enum Gap {
    Tied,
    Close,
    Landslide,
}

/// A tie counts as `Close` when the leader has no points yet to divide by.
fn classify_gap(leader_score: i64, runner_up_score: i64) -> Gap {
    let gap = leader_score - runner_up_score;
    if gap <= 0 {
        Gap::Tied
    } else if leader_score <= 0 || (gap as f64 / leader_score as f64) < 0.15 {
        Gap::Close
    } else {
        Gap::Landslide
    }
}

const TIED_TWO_PLAYER: &[&str] = &[
    "Nach Runde {round} steht es unentschieden zwischen euch beiden.",
    "Gleichstand nach Runde {round} – es bleibt spannend.",
];
const CLOSE_TWO_PLAYER: &[&str] = &[
    "{leader} liegt nach Runde {round} hauchdünn vorn.",
    "Knapp: {leader} führt nach Runde {round} nur mit wenigen Punkten.",
];
const LANDSLIDE_TWO_PLAYER: &[&str] = &[
    "{leader} zieht nach Runde {round} deutlich davon.",
    "{leader} dominiert – ein klarer Vorsprung nach Runde {round}.",
];
const TIED_MULTI: &[&str] = &[
    "Nach Runde {round} liegen mehrere Spieler gleichauf an der Spitze, angeführt von {leader}.",
    "Gleichstand an der Spitze nach Runde {round}, {leader} knapp davor.",
];
const CLOSE_MULTI: &[&str] = &[
    "{leader} übernimmt knapp die Führung nach Runde {round}.",
    "Eng beieinander nach Runde {round} – {leader} liegt hauchdünn vorn.",
];
const LANDSLIDE_MULTI: &[&str] = &[
    "{leader} setzt sich nach Runde {round} deutlich vom Feld ab.",
    "Nach Runde {round} steht {leader} mit klarem Abstand an der Spitze.",
];
const SOLO: &[&str] = &[
    "{leader} hat Runde {round} allein bestritten.",
    "Nach Runde {round} stehen {leader}s Punkte fest.",
];

fn narration_text(ranked_scores: &[(String, i64)], round: u32, snippet_index: u32) -> String {
    let leader_name = ranked_scores[0].0.as_str();
    if ranked_scores.len() == 1 {
        let template = SOLO[(snippet_index as usize) % SOLO.len()];
        return template.replace("{leader}", leader_name).replace("{round}", &round.to_string());
    }
    let leader_score = ranked_scores[0].1;
    let runner_up_score = ranked_scores[1].1;
    let gap = classify_gap(leader_score, runner_up_score);
    let two_player = ranked_scores.len() <= 2;
    let templates = match (two_player, gap) {
        (true, Gap::Tied) => TIED_TWO_PLAYER,
        (true, Gap::Close) => CLOSE_TWO_PLAYER,
        (true, Gap::Landslide) => LANDSLIDE_TWO_PLAYER,
        (false, Gap::Tied) => TIED_MULTI,
        (false, Gap::Close) => CLOSE_MULTI,
        (false, Gap::Landslide) => LANDSLIDE_MULTI,
    };
    let template = templates[(snippet_index as usize) % templates.len()];
    template.replace("{leader}", leader_name).replace("{round}", &round.to_string())
}

pub async fn begin(ctx: &mut Ctx) {
    ctx.room.state.enter_phase(Phase::Scoreboard);
    ctx.clear_timers();
    let round = ctx.room.state.current_round;
    let mut ranked_scores: Vec<(String, i64)> = ctx
        .room
        .players
        .iter()
        .filter(|p| p.is_connected)
        .map(|p| (p.name.clone(), p.score))
        .collect();
    ranked_scores.sort_by(|a, b| b.1.cmp(&a.1));
    let snippet_index = ctx.room.state.snippet_index;
    ctx.room.state.snippet_index = snippet_index.wrapping_add(1);
    let text = if ranked_scores.is_empty() {
        String::new()
    } else {
        narration_text(&ranked_scores, round, snippet_index)
    };
    let cache_key = format!("scoreboard-{}-{round}", ctx.room.code);
    let tts_url = ctx.tts.get_or_synthesize(&cache_key, &text).await.ok();
    ctx.broadcast(ServerMessage::PhaseChange { phase: Phase::Scoreboard });
    ctx.broadcast(ServerMessage::ScoreboardAnnouncement { tts_url });
    ctx.broadcast_snapshot();
    // Solo play has no one else to wait on; the host advances manually
    // instead of an ack gate racing its own 30s fallback.
    if ctx.room.players.connected_ids().len() > 1 {
        ctx.arm_ack(AckKind::Scoreboard, SCOREBOARD_MAX_WAIT);
    }
}

pub fn handle_scoreboard_ready(ctx: &mut Ctx, player_id: &PlayerId) -> bool {
    if ctx.room.state.phase != Phase::Scoreboard {
        return false;
    }
    ctx.record_ack(player_id, AckKind::Scoreboard)
}

/// Called on ack completion, the 30s fallback, or (solo play) the host's
/// explicit advance.
pub async fn advance(ctx: &mut Ctx) {
    if ctx.room.state.phase != Phase::Scoreboard {
        return;
    }
    ctx.clear_ack();
    if ctx.room.state.current_round >= ctx.room.settings.max_rounds as u32 {
        rematch::begin_final(ctx).await;
        return;
    }
    ctx.room.state.current_round += 1;
    category_selection::begin_round(ctx).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narration_cycles_through_templates_for_a_close_race() {
        let scores = vec![("Ada".to_string(), 510), ("Grace".to_string(), 500)];
        let a = narration_text(&scores, 2, 0);
        let b = narration_text(&scores, 2, 1);
        assert_ne!(a, b);
        assert!(a.contains("Ada"));
        assert!(a.contains('2'));
    }

    #[test]
    fn narration_differs_between_a_close_race_and_a_landslide() {
        let close = vec![("Ada".to_string(), 510), ("Grace".to_string(), 500)];
        let landslide = vec![("Ada".to_string(), 1500), ("Grace".to_string(), 200)];
        let close_text = narration_text(&close, 3, 0);
        let landslide_text = narration_text(&landslide, 3, 0);
        assert_ne!(close_text, landslide_text);
    }

    #[test]
    fn solo_play_gets_its_own_phrasing() {
        let scores = vec![("Ada".to_string(), 500)];
        let text = narration_text(&scores, 1, 0);
        assert!(text.contains("Ada"));
        assert!(text.contains("allein") || text.contains("Punkte"));
    }
}

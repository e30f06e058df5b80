//! Central dispatcher (spec.md §5, §9): the single place that validates a
//! fired timer's phase token and the single place that routes an inbound
//! client intent to whichever submodule owns the phase it arrived in.
//! Grounded on the earlier `gameroom::Room::apply`/`act` match-on-street
//! dispatch, generalized from poker streets to this server's richer phase
//! list.

use crate::error::RoomError;
use crate::ids::PlayerId;
use crate::model::state::Phase;
use crate::phase::bonus;
use crate::phase::category_selection::{self, dice_royale, losers_pick, rps_duel, voting, wheel};
use crate::phase::ctx::Ctx;
use crate::phase::{lobby, question_round, rematch, scoreboard};
use crate::room_actor::TimerKind;
use crate::time::PhaseToken;
use crate::transport::messages::{InboundMessage, ServerMessage};
use tokio::sync::mpsc::UnboundedSender;

pub fn handle_join(
    ctx: &mut Ctx,
    name: String,
    outbox: UnboundedSender<ServerMessage>,
    is_first: bool,
) -> Result<PlayerId, RoomError> {
    lobby::handle_join(ctx, name, outbox, is_first)
}

pub fn handle_reconnect(
    ctx: &mut Ctx,
    player_id: PlayerId,
    outbox: UnboundedSender<ServerMessage>,
) -> Result<(), RoomError> {
    lobby::handle_reconnect(ctx, player_id, outbox)
}

pub fn handle_disconnect(ctx: &mut Ctx, player_id: PlayerId) {
    lobby::handle_disconnect(ctx, player_id);
}

/// Dispatches a parsed client intent to whichever submodule owns the
/// phase it applies to. Connection bootstrap messages (`create_room`,
/// `join_room`, `reconnect`) never reach here — the transport layer
/// resolves those against the room registry before a room actor exists
/// to dispatch into.
pub async fn handle_intent(ctx: &mut Ctx, player_id: PlayerId, message: InboundMessage) {
    match message {
        InboundMessage::CreateRoom { .. } | InboundMessage::JoinRoom { .. } | InboundMessage::Reconnect { .. } => {
            log::warn!("connection-bootstrap intent reached room actor for {}", ctx.room.code);
        }
        InboundMessage::StartGame => lobby::handle_start_game(ctx, &player_id),
        InboundMessage::GameStartReady => {
            if ctx.room.state.phase == Phase::RoundAnnouncement && ctx.record_ack(&player_id, crate::model::room::AckKind::GameStart) {
                lobby::advance_past_game_start(ctx).await;
            }
        }
        InboundMessage::SubmitVote { category_id } => voting::handle_vote(ctx, player_id, category_id),
        InboundMessage::PickCategory { category_id } => match ctx.room.state.phase {
            Phase::CategoryLosersPick => losers_pick::handle_pick(ctx, player_id, category_id).await,
            Phase::CategoryDiceRoyale => dice_royale::handle_pick(ctx, player_id, category_id).await,
            Phase::CategoryRpsDuel => rps_duel::handle_pick(ctx, player_id, category_id).await,
            _ => {}
        },
        InboundMessage::DiceRoyaleRoll => dice_royale::handle_roll(ctx, player_id),
        InboundMessage::RpsChoice { choice } => rps_duel::handle_choice(ctx, player_id, choice),
        InboundMessage::SubmitAnswer { answer_index, estimation_value } => {
            question_round::handle_submit_answer(ctx, player_id, answer_index, estimation_value).await;
        }
        InboundMessage::HotButtonBuzz => {
            if ctx.room.state.phase == Phase::BonusRound {
                bonus::handle_buzz(ctx, player_id);
            }
        }
        InboundMessage::HotButtonAnswer { text } | InboundMessage::SubmitBonusRoundAnswer { text } => {
            if ctx.room.state.phase == Phase::BonusRound {
                bonus::handle_answer(ctx, player_id, text).await;
            }
        }
        InboundMessage::SkipBonusRound => {
            if ctx.room.state.phase == Phase::BonusRound {
                bonus::handle_skip(ctx, player_id);
            }
        }
        InboundMessage::IntroReady => bonus::handle_intro_ready(ctx, &player_id),
        InboundMessage::ScoreboardReady => handle_scoreboard_ready(ctx, &player_id).await,
        InboundMessage::RematchVote { yes } => rematch::handle_vote(ctx, player_id, yes).await,
        InboundMessage::LeaveRoom => lobby::handle_leave(ctx, player_id),
    }
}

/// Solo play never arms the scoreboard ack gate (nobody else to wait on),
/// so any ready signal from the lone connected player advances directly
/// instead of going through `record_ack`, which would always return
/// `false` with no gate installed.
async fn handle_scoreboard_ready(ctx: &mut Ctx, player_id: &PlayerId) {
    if ctx.room.state.phase != Phase::Scoreboard {
        return;
    }
    if ctx.room.pending_ack.is_none() {
        scoreboard::advance(ctx).await;
        return;
    }
    if scoreboard::handle_scoreboard_ready(ctx, player_id) {
        scoreboard::advance(ctx).await;
    }
}

/// Validates the fired timer's token against the room's current one
/// before dispatching (spec.md §9): a timer scheduled for a phase the
/// room has since left or re-entered is a stale no-op.
pub async fn handle_timer(ctx: &mut Ctx, token: PhaseToken, kind: TimerKind) {
    if token != ctx.room.state.phase_token {
        return;
    }
    match kind {
        TimerKind::HotButtonReveal => bonus::on_reveal_tick(ctx),
        TimerKind::Phase => handle_phase_timer(ctx).await,
    }
}

async fn handle_phase_timer(ctx: &mut Ctx) {
    match ctx.room.state.phase {
        Phase::Lobby => {}
        Phase::RoundAnnouncement => lobby::advance_past_game_start(ctx).await,
        Phase::CategoryAnnouncement => category_selection::on_announcement_timer(ctx),
        Phase::CategoryVoting => voting::on_timer(ctx).await,
        Phase::CategoryWheel => wheel::on_timer(ctx).await,
        Phase::CategoryLosersPick => losers_pick::on_timer(ctx).await,
        Phase::CategoryDiceRoyale => dice_royale::on_timer(ctx).await,
        Phase::CategoryRpsDuel => rps_duel::on_timer(ctx).await,
        Phase::Question | Phase::Estimation => question_round::on_timer(ctx).await,
        Phase::Revealing | Phase::EstimationReveal => question_round::on_reveal_hold_timer(ctx).await,
        Phase::Scoreboard => scoreboard::advance(ctx).await,
        Phase::BonusRoundAnnouncement => bonus::begin(ctx).await,
        Phase::BonusRound => bonus::on_timer(ctx).await,
        Phase::BonusRoundResult => bonus::on_result_hold_timer(ctx).await,
        Phase::Final => rematch::on_final_hold_timer(ctx).await,
        Phase::RematchVoting => rematch::on_timer(ctx).await,
    }
}

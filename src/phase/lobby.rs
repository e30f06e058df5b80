//! Room lifecycle: join, reconnect, disconnect, host reassignment, and
//! the lobby → first-round hand-off (spec.md §4.1 "game-start hand-off",
//! §4.2).

use crate::config::{GAME_START_MAX_WAIT, MAX_PLAYERS_PER_ROOM, MAX_PLAYER_NAME_LEN};
use crate::error::RoomError;
use crate::ids::PlayerId;
use crate::model::player::Player;
use crate::model::room::AckKind;
use crate::model::state::Phase;
use crate::phase::category_selection;
use crate::phase::ctx::Ctx;
use crate::transport::messages::{PublicPlayer, ServerMessage};
use tokio::sync::mpsc::UnboundedSender;

fn validate_name(name: &str) -> Result<String, RoomError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_PLAYER_NAME_LEN {
        return Err(RoomError::InvalidName);
    }
    Ok(trimmed.to_string())
}

pub fn handle_join(
    ctx: &mut Ctx,
    name: String,
    outbox: UnboundedSender<ServerMessage>,
    is_first: bool,
) -> Result<PlayerId, RoomError> {
    if ctx.room.state.phase != Phase::Lobby {
        return Err(RoomError::GameRunning);
    }
    if ctx.room.players.len() >= MAX_PLAYERS_PER_ROOM {
        return Err(RoomError::RoomFull);
    }
    let name = validate_name(&name)?;
    let socket = ctx.next_socket_id();
    let id = PlayerId::generate(&mut ctx.rng);
    let avatar_seed = id.as_str().to_string();
    let mut player = Player::new(id.clone(), socket, name, avatar_seed);
    if is_first {
        player.is_host = true;
        ctx.room.host_id = id.clone();
    }
    ctx.outboxes.insert(id.clone(), outbox);
    ctx.room.players.insert(player.clone());
    ctx.broadcast(ServerMessage::PlayerJoined {
        player: PublicPlayer::from(&player),
    });
    ctx.broadcast_snapshot();
    Ok(id)
}

pub fn handle_reconnect(
    ctx: &mut Ctx,
    player_id: PlayerId,
    outbox: UnboundedSender<ServerMessage>,
) -> Result<(), RoomError> {
    let player = ctx
        .room
        .players
        .get_mut(&player_id)
        .ok_or(RoomError::RoomNotFound)?;
    player.is_connected = true;
    player.socket = Some(crate::ids::SocketId(0));
    ctx.outboxes.insert(player_id.clone(), outbox);
    ctx.room.reassign_host_if_needed();
    ctx.broadcast_snapshot();
    Ok(())
}

pub fn handle_disconnect(ctx: &mut Ctx, player_id: PlayerId) {
    if let Some(player) = ctx.room.players.get_mut(&player_id) {
        player.is_connected = false;
    } else {
        return;
    }
    ctx.outboxes.remove(&player_id);
    ctx.room.reassign_host_if_needed();
    ctx.broadcast_snapshot();
}

pub fn handle_leave(ctx: &mut Ctx, player_id: PlayerId) {
    ctx.outboxes.remove(&player_id);
    if ctx.room.players.remove(&player_id).is_some() {
        ctx.room.reassign_host_if_needed();
        ctx.broadcast(ServerMessage::PlayerLeft {
            player_id: player_id.clone(),
        });
        ctx.broadcast_snapshot();
    }
}

/// `start_game` intent, host-only (spec.md §7: non-host sender is dropped
/// and logged, not replied to).
pub fn handle_start_game(ctx: &mut Ctx, player_id: &PlayerId) {
    if ctx.room.state.phase != Phase::Lobby {
        return;
    }
    if !ctx.room.is_host(player_id) {
        log::warn!("non-host {player_id} attempted start_game in room {}", ctx.room.code);
        return;
    }
    if ctx.room.players.is_empty() {
        return;
    }
    begin_match(ctx);
}

/// First transition out of `lobby` (spec.md §4.1 "game-start hand-off"):
/// hold for the intro animation until every connected client acks
/// `game_start_ready` or `GAME_START_MAX_WAIT` elapses.
fn begin_match(ctx: &mut Ctx) {
    ctx.room.state.enter_phase(Phase::RoundAnnouncement);
    ctx.clear_timers();
    ctx.room.state.current_round = 1;
    ctx.broadcast(ServerMessage::PhaseChange {
        phase: Phase::RoundAnnouncement,
    });
    ctx.arm_ack(AckKind::GameStart, GAME_START_MAX_WAIT);
    ctx.broadcast_snapshot();
}

/// Called once the game-start ack gate clears, either by every client
/// acking or by `GAME_START_MAX_WAIT` firing.
pub async fn advance_past_game_start(ctx: &mut Ctx) {
    ctx.clear_ack();
    category_selection::begin_round(ctx).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::settings::MatchSettings;
    use tokio::sync::mpsc::unbounded_channel;

    fn make_ctx() -> (Ctx, tokio::sync::mpsc::UnboundedReceiver<crate::room_actor::RoomInbound>) {
        let (self_tx, self_rx) = unbounded_channel();
        let mut rng_seed = rand::rngs::SmallRng::seed_from_u64(1);
        use rand::SeedableRng;
        let code = crate::ids::RoomCode::generate(&mut rng_seed);
        let host = crate::ids::PlayerId::generate(&mut rng_seed);
        let ctx = Ctx {
            room: crate::model::room::Room::new(code, host, MatchSettings::default()),
            timers: crate::time::TimerRegistry::new(),
            outboxes: Default::default(),
            questions: std::sync::Arc::new(crate::store::questions::tests_support::EmptyStore),
            fuzzy: std::sync::Arc::new(crate::fuzzy::LevenshteinMatcher),
            tts: std::sync::Arc::new(crate::tts::TtsCache::new(std::sync::Arc::new(crate::tts::NullTts))),
            clock: std::sync::Arc::new(crate::time::SystemClock),
            store: std::sync::Arc::new(crate::store::RoomStore::default()),
            self_tx,
            rng: rng_seed,
            socket_counter: 0,
            pending_category_mode: None,
            pending_category: None,
            round_question_bank: Vec::new(),
        };
        (ctx, self_rx)
    }

    #[test]
    fn first_joiner_becomes_host() {
        let (mut ctx, _rx) = make_ctx();
        let (tx, _rx2) = unbounded_channel();
        let id = handle_join(&mut ctx, "Ada".to_string(), tx, true).unwrap();
        assert!(ctx.room.is_host(&id));
    }

    #[test]
    fn blank_name_is_rejected() {
        let (mut ctx, _rx) = make_ctx();
        let (tx, _rx2) = unbounded_channel();
        let result = handle_join(&mut ctx, "   ".to_string(), tx, true);
        assert_eq!(result, Err(RoomError::InvalidName));
    }

    #[test]
    fn non_host_start_game_is_ignored() {
        let (mut ctx, _rx) = make_ctx();
        let (tx, _rx2) = unbounded_channel();
        let id = handle_join(&mut ctx, "Ada".to_string(), tx, false).unwrap();
        handle_start_game(&mut ctx, &id);
        assert_eq!(ctx.room.state.phase, Phase::Lobby);
    }
}

//! The per-room actor task (spec.md §5): one `tokio::spawn`-ed loop per
//! room, owning an `UnboundedReceiver<RoomInbound>`. Generalizes the
//! teacher's `gameroom::Room::run`/`Actor::spawn` pattern — there, one
//! task per room plus one task per seated player bridging a `Player`
//! trait object; here, one task per room and the "player" side collapses
//! into a plain `UnboundedSender<ServerMessage>` outbox per connection,
//! since every participant is a transport-agnostic client rather than a
//! polymorphic decision-maker.

use crate::error::RoomError;
use crate::fuzzy::FuzzyMatcher;
use crate::ids::{PlayerId, RoomCode, SocketId};
use crate::model::player::Player;
use crate::model::room::Room;
use crate::model::settings::MatchSettings;
use crate::phase::ctx::Ctx;
use crate::phase::machine;
use crate::store::{QuestionStore, RoomStore};
use crate::time::{Clock, PhaseToken, SystemClock, TimerRegistry};
use crate::transport::messages::{InboundMessage, ServerMessage};
use crate::tts::TtsCache;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};
use tokio::sync::oneshot;

/// Everything a connection needs to join or rejoin a room, handed to the
/// room actor and answered through a one-shot reply.
pub enum RoomInbound {
    Join {
        name: String,
        outbox: UnboundedSender<ServerMessage>,
        reply: oneshot::Sender<Result<PlayerId, RoomError>>,
    },
    Reconnect {
        player_id: PlayerId,
        outbox: UnboundedSender<ServerMessage>,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Intent {
        player_id: PlayerId,
        message: InboundMessage,
    },
    SocketClosed {
        player_id: PlayerId,
    },
    TimerFired {
        token: PhaseToken,
        kind: TimerKind,
    },
    /// Fires `DISCONNECT_GRACE` after the room went fully disconnected;
    /// the handler re-checks the room is still empty before closing it,
    /// since a reconnect may have landed in the meantime (spec.md §4.2).
    DisconnectGraceExpired,
    /// Fires after `ROOM_CLEANUP_DELAY`, requested by `Ctx::request_close`
    /// (spec.md §4.2: zero-yes rematch, or nobody continuing past the
    /// final phase).
    CloseRoom,
}

/// Distinguishes the single per-phase deadline (category windows, the
/// question timer, scoreboard/intro holds, ...) from hot-button's
/// character-reveal ticker, which runs concurrently with its own buzzer
/// timeout at the same phase token (spec.md §4.6: "reveal interval" and
/// "buzzer timeout" are independent, co-live timers).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Phase,
    HotButtonReveal,
}

#[derive(Clone)]
pub struct RoomDeps {
    pub questions: Arc<dyn QuestionStore>,
    pub fuzzy: Arc<dyn FuzzyMatcher>,
    pub tts: Arc<TtsCache>,
}

/// Spawns a fresh room actor and returns the sender half of its inbox.
/// The room is empty until the first `Join` arrives (spec.md §4.2: "the
/// first player to join becomes host").
pub fn spawn(
    code: RoomCode,
    settings: MatchSettings,
    deps: RoomDeps,
    rooms: Arc<RoomStore<RoomInbound>>,
) -> UnboundedSender<RoomInbound> {
    let (tx, rx) = unbounded_channel();
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is after the epoch")
        .as_nanos() as u64;
    let placeholder_host = PlayerId::generate(&mut SmallRng::seed_from_u64(seed));
    let ctx = Ctx {
        room: Room::new(code, placeholder_host, settings),
        timers: TimerRegistry::new(),
        outboxes: Default::default(),
        questions: deps.questions,
        fuzzy: deps.fuzzy,
        tts: deps.tts,
        clock: Arc::new(SystemClock),
        store: rooms,
        self_tx: tx.clone(),
        rng: SmallRng::seed_from_u64(seed ^ 0x5eed),
        socket_counter: 0,
        pending_category_mode: None,
        pending_category: None,
        round_question_bank: Vec::new(),
    };
    tokio::spawn(run(ctx, rx));
    tx
}

async fn run(mut ctx: Ctx, mut rx: tokio::sync::mpsc::UnboundedReceiver<RoomInbound>) {
    let mut has_host = false;
    while let Some(inbound) = rx.recv().await {
        match inbound {
            RoomInbound::Join { name, outbox, reply } => {
                let result = machine::handle_join(&mut ctx, name, outbox, !has_host);
                has_host = has_host || result.is_ok();
                let _ = reply.send(result);
            }
            RoomInbound::Reconnect { player_id, outbox, reply } => {
                let result = machine::handle_reconnect(&mut ctx, player_id, outbox);
                let _ = reply.send(result);
            }
            RoomInbound::Intent { player_id, message } => {
                machine::handle_intent(&mut ctx, player_id, message).await;
            }
            RoomInbound::SocketClosed { player_id } => {
                machine::handle_disconnect(&mut ctx, player_id);
                if ctx.room.no_connected_players() {
                    log::info!("room {} has no connected players, awaiting cleanup", ctx.room.code);
                    ctx.arm_disconnect_grace();
                }
            }
            RoomInbound::TimerFired { token, kind } => {
                machine::handle_timer(&mut ctx, token, kind).await;
            }
            RoomInbound::DisconnectGraceExpired => {
                if ctx.room.no_connected_players() {
                    log::info!("room {} still has no connected players, closing", ctx.room.code);
                    ctx.request_close();
                }
            }
            RoomInbound::CloseRoom => {
                ctx.store.close(&ctx.room.code).await;
                ctx.clear_timers();
                ctx.outboxes.clear();
                ctx.room.players.clear();
            }
        }
        if ctx.outboxes.is_empty() && ctx.room.players.is_empty() {
            break;
        }
    }
    log::info!("room actor for {} exiting", ctx.room.code);
}

#[allow(dead_code)]
fn _unused_socket_id_reference(_: SocketId) {}
#[allow(dead_code)]
fn _unused_player_reference(_: Player) {}

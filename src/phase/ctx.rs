//! Per-room mutable context threaded through every phase handler.
//!
//! Generalizes the earlier `gameroom::room::Room` imperative shell
//! (which holds `Game` + a `Vec<UnboundedSender<Event>>` for unicast and
//! a loop `for p in players` for broadcast) to the richer per-phase
//! dispatch this server needs, while keeping the same "one task, direct
//! `&mut self` mutation, explicit unicast/broadcast helpers" shape.

use crate::config::{DISCONNECT_GRACE, ROOM_CLEANUP_DELAY};
use crate::fuzzy::FuzzyMatcher;
use crate::ids::PlayerId;
use crate::model::category::CategoryId;
use crate::model::room::{AckKind, PendingAck, Room};
use crate::model::settings::CategoryMode;
use crate::room_actor::{RoomInbound, TimerKind};
use crate::store::{QuestionStore, RoomStore};
use crate::time::{Clock, PhaseToken, TimerRegistry};
use crate::transport::messages::{RoomSnapshot, ServerMessage};
use crate::tts::TtsCache;
use rand::rngs::SmallRng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

pub struct Ctx {
    pub room: Room,
    pub timers: TimerRegistry,
    pub outboxes: HashMap<PlayerId, UnboundedSender<ServerMessage>>,
    pub questions: Arc<dyn QuestionStore>,
    pub fuzzy: Arc<dyn FuzzyMatcher>,
    pub tts: Arc<TtsCache>,
    pub clock: Arc<dyn Clock>,
    /// The process-wide registry this room is listed in, so the room
    /// itself can ask to be delisted at the end of its lifecycle (spec.md
    /// §4.2: zero-yes rematch, disconnect-grace expiry, nobody continuing
    /// past the final phase).
    pub store: Arc<RoomStore<RoomInbound>>,
    pub self_tx: UnboundedSender<RoomInbound>,
    pub rng: SmallRng,
    pub socket_counter: u64,
    /// Mode chosen for the round currently being announced, held only for
    /// the brief `category_announcement` hold. Never serialised — this is
    /// actor-local scratch state, not part of the client-facing snapshot.
    pub pending_category_mode: Option<CategoryMode>,
    /// Scratch slot for a category decided mid-mode but not yet confirmed
    /// (voting tiebreak winner, wheel's pre-picked category). Exclusive
    /// per phase, never serialised.
    pub pending_category: Option<CategoryId>,
    /// Full question bank for the round in progress, drawn once at
    /// `question_round::begin`. `MatchState.round_questions` only tracks
    /// ids (for the client and for `used_question_ids`); this is the
    /// actor-local cache `question_round` indexes into as the round
    /// advances. Never serialised.
    pub round_question_bank: Vec<crate::model::question::Question>,
}

impl Ctx {
    pub fn now(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Stamps `server_time` and fans `msg` out to every outbox, logging
    /// (not failing) on a dead channel — matches the earlier
    /// `Room::broadcast` tolerance for a player who already dropped.
    pub fn broadcast(&mut self, msg: ServerMessage) {
        self.room.state.server_time = self.now();
        for (id, tx) in self.outboxes.iter() {
            if tx.send(msg.clone()).is_err() {
                log::warn!("failed broadcast to {id} in room {}", self.room.code);
            }
        }
    }

    pub fn broadcast_snapshot(&mut self) {
        let snapshot = RoomSnapshot::from(&self.room);
        self.broadcast(ServerMessage::RoomUpdate { room: snapshot });
    }

    pub fn unicast(&self, player_id: &PlayerId, msg: ServerMessage) {
        if let Some(tx) = self.outboxes.get(player_id) {
            if tx.send(msg).is_err() {
                log::warn!("failed unicast to {player_id} in room {}", self.room.code);
            }
        }
    }

    /// Bumps the phase token without changing `room.state.phase` — used
    /// for sub-phase transitions (e.g. hot-button rebuzz) that still need
    /// stale in-flight timers to be invalidated (spec.md §9, "timer
    /// validity tokens").
    pub fn retoken(&mut self) -> PhaseToken {
        self.room.state.phase_token += 1;
        self.room.state.phase_token
    }

    /// Cancels every outstanding timer and arms a new one that fires
    /// `RoomInbound::TimerFired` with the *current* phase token after
    /// `delay`. Handlers must re-check the token on fire and no-op on
    /// mismatch (spec.md §4.1, §9).
    pub fn arm_timer(&mut self, delay: Duration) {
        let token = self.room.state.phase_token;
        self.room.state.arm_timer(self.now() + delay.as_millis() as u64);
        self.timers.schedule_once(
            delay,
            self.self_tx.clone(),
            RoomInbound::TimerFired { token, kind: TimerKind::Phase },
        );
    }

    /// Arms a one-shot `Phase`-kind timer without touching
    /// `room.state.timer_end` — used when a phase timer (e.g. hot-button's
    /// buzzer timeout) must coexist with another, more client-relevant
    /// deadline already reflected there.
    pub fn arm_side_timer(&mut self, delay: Duration) {
        let token = self.room.state.phase_token;
        self.timers.schedule_once(
            delay,
            self.self_tx.clone(),
            RoomInbound::TimerFired { token, kind: TimerKind::Phase },
        );
    }

    /// Starts hot-button's character-reveal ticker: a periodic timer that
    /// coexists with the buzzer timeout at the same phase token, tagged
    /// `HotButtonReveal` so the dispatcher can tell it apart (spec.md
    /// §4.6).
    pub fn arm_reveal_tick(&mut self, interval: Duration) {
        let token = self.room.state.phase_token;
        self.timers.schedule_periodic(
            interval,
            self.self_tx.clone(),
            RoomInbound::TimerFired { token, kind: TimerKind::HotButtonReveal },
        );
    }

    pub fn clear_timers(&mut self) {
        self.timers.clear_all();
    }

    /// Schedules this room's delisting from the registry after
    /// `ROOM_CLEANUP_DELAY`, deliberately not gated by the phase token so
    /// it fires even across an intervening phase change (spec.md §4.2).
    pub fn request_close(&mut self) {
        self.timers
            .schedule_once(ROOM_CLEANUP_DELAY, self.self_tx.clone(), RoomInbound::CloseRoom);
    }

    /// Schedules `RoomInbound::DisconnectGraceExpired`, also ungated by
    /// phase token, so a room with nobody connected gets cleaned up even
    /// if a reconnect and a second disconnect happen in between (the
    /// handler re-checks `no_connected_players` on fire).
    pub fn arm_disconnect_grace(&mut self) {
        self.timers
            .schedule_once(DISCONNECT_GRACE, self.self_tx.clone(), RoomInbound::DisconnectGraceExpired);
    }

    /// Installs a pending ack gate (spec.md §4.1: game-start/intro/scoreboard
    /// client-ack callbacks) and arms its fallback timer.
    pub fn arm_ack(&mut self, kind: AckKind, fallback: Duration) {
        self.room.pending_ack = Some(PendingAck::new(kind));
        self.arm_timer(fallback);
    }

    /// Records an ack from `player_id` if one is pending and tagged `kind`.
    /// Returns `true` once every connected player has acked, in which case
    /// the caller should clear the gate and advance.
    pub fn record_ack(&mut self, player_id: &PlayerId, kind: AckKind) -> bool {
        let connected = self.room.players.connected_ids();
        let refs: Vec<&PlayerId> = connected.iter().collect();
        match &mut self.room.pending_ack {
            Some(pending) if pending.kind == kind => {
                pending.acked_by.insert(player_id.clone());
                pending.all_connected_acked(&refs)
            }
            _ => false,
        }
    }

    pub fn clear_ack(&mut self) {
        self.room.pending_ack = None;
        self.clear_timers();
    }

    pub fn next_socket_id(&mut self) -> crate::ids::SocketId {
        self.socket_counter += 1;
        crate::ids::SocketId(self.socket_counter)
    }
}

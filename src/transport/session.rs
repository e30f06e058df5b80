//! Per-connection bridge between a raw WebSocket and a room actor
//! (spec.md §5, §6.1). Grounded on `hosting::casino::Casino::bridge`'s
//! `tokio::select! { biased; ... }` relay loop, generalized from a single
//! untyped `String` channel pair to the typed `InboundMessage`/
//! `ServerMessage` wire protocol, and extended with the bootstrap phase
//! (`create_room`/`join_room`/`reconnect`) the earlier per-room HTTP
//! routes used to handle before a socket ever opened.

use crate::error::RoomError;
use crate::ids::PlayerId;
use crate::room_actor::{self, RoomDeps, RoomInbound};
use crate::store::rooms::RoomStore;
use crate::transport::messages::{InboundMessage, ServerMessage};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::oneshot;

fn send_text(session: &mut actix_ws::Session, message: &ServerMessage) -> bool {
    match serde_json::to_string(message) {
        Ok(json) => session.text(json).is_ok(),
        Err(e) => {
            log::error!("failed to serialize outbound message: {e}");
            false
        }
    }
}

fn parse_inbound(text: &str) -> Option<InboundMessage> {
    match serde_json::from_str(text) {
        Ok(msg) => Some(msg),
        Err(e) => {
            log::warn!("dropping unparseable inbound message: {e}");
            None
        }
    }
}

fn error_reply(session_err: RoomError) -> ServerMessage {
    ServerMessage::Error {
        code: session_err.code(),
        message: session_err.to_string(),
    }
}

/// Seated state a bootstrap exchange hands off to the relay loop: which
/// room actor owns this connection and which player it became.
struct Seated {
    room_tx: UnboundedSender<RoomInbound>,
    player_id: PlayerId,
    outbox: tokio::sync::mpsc::UnboundedReceiver<ServerMessage>,
}

/// Runs the bootstrap exchange: waits for `create_room`, `join_room`, or
/// `reconnect`, looping on anything else until one of those seats the
/// connection or the socket closes first.
async fn bootstrap(
    session: &mut actix_ws::Session,
    stream: &mut actix_ws::MessageStream,
    rooms: &Arc<RoomStore<RoomInbound>>,
    deps: &RoomDeps,
) -> Option<Seated> {
    loop {
        let message = match stream.next().await {
            Some(Ok(actix_ws::Message::Text(text))) => parse_inbound(&text)?,
            Some(Ok(actix_ws::Message::Close(_))) | None => return None,
            Some(Err(_)) => return None,
            _ => continue,
        };
        match message {
            InboundMessage::CreateRoom { settings } => {
                let settings = settings.unwrap_or_default().clamped();
                let deps = deps.clone();
                let rooms_for_spawn = Arc::clone(rooms);
                let code = rooms
                    .insert_with_generated_code(|code| {
                        room_actor::spawn(code, settings.clone(), deps.clone(), Arc::clone(&rooms_for_spawn))
                    })
                    .await;
                if !send_text(session, &ServerMessage::RoomCreated { code }) {
                    return None;
                }
            }
            InboundMessage::JoinRoom { code, name } => {
                let Some(room_tx) = rooms.sender(&code).await else {
                    if !send_text(session, &error_reply(RoomError::RoomNotFound)) {
                        return None;
                    }
                    continue;
                };
                let (outbox_tx, outbox_rx) = tokio::sync::mpsc::unbounded_channel();
                let (reply_tx, reply_rx) = oneshot::channel();
                if room_tx
                    .send(RoomInbound::Join {
                        name,
                        outbox: outbox_tx,
                        reply: reply_tx,
                    })
                    .is_err()
                {
                    if !send_text(session, &error_reply(RoomError::RoomNotFound)) {
                        return None;
                    }
                    continue;
                }
                match reply_rx.await {
                    Ok(Ok(player_id)) => {
                        if !send_text(session, &ServerMessage::Welcome { player_id: player_id.clone() }) {
                            return None;
                        }
                        return Some(Seated {
                            room_tx,
                            player_id,
                            outbox: outbox_rx,
                        });
                    }
                    Ok(Err(e)) => {
                        if !send_text(session, &error_reply(e)) {
                            return None;
                        }
                    }
                    Err(_) => {
                        if !send_text(session, &error_reply(RoomError::RoomNotFound)) {
                            return None;
                        }
                    }
                }
            }
            InboundMessage::Reconnect { code, player_id } => {
                let Some(room_tx) = rooms.sender(&code).await else {
                    if !send_text(session, &error_reply(RoomError::RoomNotFound)) {
                        return None;
                    }
                    continue;
                };
                let (outbox_tx, outbox_rx) = tokio::sync::mpsc::unbounded_channel();
                let (reply_tx, reply_rx) = oneshot::channel();
                if room_tx
                    .send(RoomInbound::Reconnect {
                        player_id: player_id.clone(),
                        outbox: outbox_tx,
                        reply: reply_tx,
                    })
                    .is_err()
                {
                    if !send_text(session, &error_reply(RoomError::RoomNotFound)) {
                        return None;
                    }
                    continue;
                }
                match reply_rx.await {
                    Ok(Ok(())) => {
                        if !send_text(session, &ServerMessage::Welcome { player_id: player_id.clone() }) {
                            return None;
                        }
                        return Some(Seated {
                            room_tx,
                            player_id,
                            outbox: outbox_rx,
                        });
                    }
                    Ok(Err(e)) => {
                        if !send_text(session, &error_reply(e)) {
                            return None;
                        }
                    }
                    Err(_) => {
                        if !send_text(session, &error_reply(RoomError::RoomNotFound)) {
                            return None;
                        }
                    }
                }
            }
            _ => {
                let _ = send_text(
                    session,
                    &ServerMessage::Error {
                        code: "invalid_input",
                        message: "expected create_room, join_room, or reconnect".into(),
                    },
                );
            }
        }
    }
}

/// The steady-state relay once a connection is seated in a room: forward
/// outbound broadcasts to the socket, forward inbound text as intents to
/// the room actor, and tell the room when the socket drops.
async fn relay(mut session: actix_ws::Session, mut stream: actix_ws::MessageStream, mut seated: Seated) {
    'sesh: loop {
        tokio::select! {
            biased;
            msg = seated.outbox.recv() => match msg {
                Some(message) => if !send_text(&mut session, &message) { break 'sesh },
                None => break 'sesh,
            },
            msg = stream.next() => match msg {
                Some(Ok(actix_ws::Message::Text(text))) => {
                    let Some(message) = parse_inbound(&text) else { continue 'sesh };
                    let intent = RoomInbound::Intent {
                        player_id: seated.player_id.clone(),
                        message,
                    };
                    if seated.room_tx.send(intent).is_err() {
                        break 'sesh;
                    }
                }
                Some(Ok(actix_ws::Message::Close(_))) => break 'sesh,
                Some(Err(_)) => break 'sesh,
                None => break 'sesh,
                _ => continue 'sesh,
            },
        }
    }
    let _ = seated.room_tx.send(RoomInbound::SocketClosed { player_id: seated.player_id });
    let _ = session.close(None).await;
}

/// Spawns the full per-connection task: bootstrap then relay. Mirrors the
/// teacher's `actix_web::rt::spawn` inside `Casino::bridge`.
pub fn spawn(
    session: actix_ws::Session,
    stream: actix_ws::MessageStream,
    rooms: Arc<RoomStore<RoomInbound>>,
    deps: RoomDeps,
) {
    actix_web::rt::spawn(async move {
        let mut session = session;
        let mut stream = stream;
        match bootstrap(&mut session, &mut stream, &rooms, &deps).await {
            Some(seated) => relay(session, stream, seated).await,
            None => {
                let _ = session.close(None).await;
            }
        }
    });
}

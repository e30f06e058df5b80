//! Process-wide room registry (spec.md §3.1, §5.3: "no cross-room
//! coordination; the registry is the only thing shared between rooms").
//!
//! Grounded directly on `hosting::casino::Casino`: a `tokio::sync::RwLock`
//! over a `HashMap` keyed by id, `start`/`close`/`channels` methods, one
//! room task spawned per `start`. The key type changes from a numeric
//! counter to a generated `RoomCode` with collision retry, since spec.md
//! requires human-typeable codes rather than opaque ids.

use crate::ids::RoomCode;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tokio::sync::mpsc::UnboundedSender;

/// What the registry hands back for a room: the sender half of the
/// room actor's inbound channel, plus a generation counter used to
/// reject bridge attempts against a room that already closed and was
/// replaced (codes are never reused while a room is open, but closed
/// codes free up once `ROOM_CLEANUP_DELAY` elapses).
pub struct RoomHandle<Inbound> {
    pub tx: UnboundedSender<Inbound>,
}

pub struct RoomStore<Inbound> {
    rooms: RwLock<HashMap<RoomCode, RoomHandle<Inbound>>>,
    attempts: AtomicU64,
}

impl<Inbound> Default for RoomStore<Inbound> {
    fn default() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            attempts: AtomicU64::new(0),
        }
    }
}

impl<Inbound> RoomStore<Inbound> {
    /// Generates a code that isn't already in use, builds the room's
    /// inbound sender from it via `spawn`, and registers the result.
    /// Retries on the rare alphabet collision rather than failing the
    /// whole room-creation request. `spawn` takes the code because the
    /// room actor needs it before it can exist (spec.md §3.1: the code
    /// is part of the room's own state, not just a registry key).
    pub async fn insert_with_generated_code<F>(&self, spawn: F) -> RoomCode
    where
        F: Fn(RoomCode) -> UnboundedSender<Inbound>,
    {
        let mut rng = rand::rng();
        loop {
            let code = RoomCode::generate(&mut rng);
            self.attempts.fetch_add(1, Ordering::Relaxed);
            let mut rooms = self.rooms.write().await;
            if !rooms.contains_key(&code) {
                let tx = spawn(code.clone());
                rooms.insert(code.clone(), RoomHandle { tx });
                return code;
            }
        }
    }

    pub async fn close(&self, code: &RoomCode) {
        if self.rooms.write().await.remove(code).is_some() {
            log::info!("closed room {code}");
        }
    }

    pub async fn sender(&self, code: &RoomCode) -> Option<UnboundedSender<Inbound>> {
        self.rooms.read().await.get(code).map(|h| h.tx.clone())
    }

    pub async fn contains(&self, code: &RoomCode) -> bool {
        self.rooms.read().await.contains_key(code)
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_then_lookup_round_trips() {
        let store: RoomStore<u32> = RoomStore::default();
        let code = store
            .insert_with_generated_code(|_code| {
                let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
                tx
            })
            .await;
        assert!(store.contains(&code).await);
        assert!(store.sender(&code).await.is_some());
    }

    #[tokio::test]
    async fn close_removes_room() {
        let store: RoomStore<u32> = RoomStore::default();
        let code = store
            .insert_with_generated_code(|_code| {
                let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
                tx
            })
            .await;
        store.close(&code).await;
        assert!(!store.contains(&code).await);
        assert_eq!(store.room_count().await, 0);
    }
}

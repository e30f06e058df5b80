//! Room entity (spec.md §3.1) — the top-level aggregate a room actor
//! owns and mutates. Grounded on `gameroom::room::Room`'s imperative
//! shell holding `Table` + `Vec<Seat>`, generalized to players keyed by
//! id with insertion order preserved for turn order and loser lookup.

use crate::ids::{PlayerId, RoomCode};
use crate::model::bonus::BonusType;
use crate::model::category::CategoryId;
use crate::model::player::Player;
use crate::model::settings::MatchSettings;
use crate::model::state::MatchState;
use std::collections::HashSet;

/// A one-shot continuation the room is waiting on acks for before it can
/// advance past a phase early (spec.md §4.1: "game start, intro hold, and
/// scoreboard hold can all be shortened once every connected player has
/// acknowledged, but never wait past their own timeout").
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AckKind {
    GameStart,
    Intro,
    Scoreboard,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PendingAck {
    pub kind: AckKind,
    pub acked_by: HashSet<PlayerId>,
}

impl PendingAck {
    pub fn new(kind: AckKind) -> Self {
        Self {
            kind,
            acked_by: HashSet::new(),
        }
    }

    pub fn all_connected_acked(&self, connected: &[&PlayerId]) -> bool {
        !connected.is_empty() && connected.iter().all(|id| self.acked_by.contains(*id))
    }
}

/// Ordered player roster. Preserves join order, which spec.md uses for
/// turn order in the collective-list bonus round and for "next eligible
/// player" lookups in loser's-pick category selection.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    pub fn insert(&mut self, player: Player) {
        self.players.push(player);
    }

    pub fn remove(&mut self, id: &PlayerId) -> Option<Player> {
        let index = self.players.iter().position(|p| &p.id == id)?;
        Some(self.players.remove(index))
    }

    pub fn get(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == id)
    }

    pub fn get_mut(&mut self, id: &PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| &p.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    pub fn connected_ids(&self) -> Vec<PlayerId> {
        self.players
            .iter()
            .filter(|p| p.is_connected)
            .map(|p| p.id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Drops every seated player, used when a room is being torn down.
    pub fn clear(&mut self) {
        self.players.clear();
    }

    /// First connected, non-bot player after `after`, wrapping around —
    /// used for host reassignment on disconnect (spec.md §4.2).
    pub fn next_eligible_host(&self, after: Option<&PlayerId>) -> Option<PlayerId> {
        let start = after
            .and_then(|id| self.players.iter().position(|p| &p.id == id))
            .map_or(0, |i| i + 1);
        self.players
            .iter()
            .cycle()
            .skip(start)
            .take(self.players.len())
            .find(|p| p.is_connected && !p.is_bot)
            .map(|p| p.id.clone())
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Room {
    pub code: RoomCode,
    pub host_id: PlayerId,
    pub players: Roster,
    pub settings: MatchSettings,
    pub state: MatchState,
    pub pending_ack: Option<PendingAck>,
    pub forced_category_mode: Option<CategoryId>,
    pub explained_bonus_intros: HashSet<BonusType>,
}

impl Room {
    pub fn new(code: RoomCode, host_id: PlayerId, settings: MatchSettings) -> Self {
        Self {
            code,
            host_id,
            players: Roster::default(),
            settings,
            state: MatchState::default(),
            pending_ack: None,
            forced_category_mode: None,
            explained_bonus_intros: HashSet::new(),
        }
    }

    pub fn is_host(&self, id: &PlayerId) -> bool {
        self.host_id == *id
    }

    /// Reassigns the host to the next eligible connected player. Returns
    /// `false` (and leaves the room in a state the caller should close)
    /// when nobody eligible remains.
    pub fn reassign_host_if_needed(&mut self) -> bool {
        if self
            .players
            .get(&self.host_id)
            .is_some_and(|p| p.is_connected)
        {
            return true;
        }
        match self.players.next_eligible_host(None) {
            Some(new_host) => {
                if let Some(player) = self.players.get_mut(&self.host_id) {
                    player.is_host = false;
                }
                if let Some(player) = self.players.get_mut(&new_host) {
                    player.is_host = true;
                }
                self.host_id = new_host;
                true
            }
            None => false,
        }
    }

    pub fn no_connected_players(&self) -> bool {
        self.players.iter().all(|p| !p.is_connected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SocketId;

    fn make_player(id: &str, connected: bool, is_bot: bool) -> Player {
        let mut p = Player::new(
            PlayerId::generate(&mut rand::rngs::SmallRng::seed_from_u64(id.len() as u64)),
            SocketId(0),
            id.to_string(),
            "seed".to_string(),
        );
        p.is_connected = connected;
        p.is_bot = is_bot;
        p
    }

    use rand::SeedableRng;

    #[test]
    fn next_eligible_host_skips_disconnected_and_bots() {
        let mut roster = Roster::default();
        let a = make_player("a", false, false);
        let b = make_player("bb", true, true);
        let c = make_player("ccc", true, false);
        let a_id = a.id.clone();
        let c_id = c.id.clone();
        roster.insert(a);
        roster.insert(b);
        roster.insert(c);
        assert_eq!(roster.next_eligible_host(Some(&a_id)), Some(c_id));
    }

    #[test]
    fn pending_ack_requires_every_connected_player() {
        let mut ack = PendingAck::new(crate::model::room::AckKind::Intro);
        let p1 = PlayerId::generate(&mut rand::rngs::SmallRng::seed_from_u64(1));
        let p2 = PlayerId::generate(&mut rand::rngs::SmallRng::seed_from_u64(2));
        ack.acked_by.insert(p1.clone());
        assert!(!ack.all_connected_acked(&[&p1, &p2]));
        ack.acked_by.insert(p2.clone());
        assert!(ack.all_connected_acked(&[&p1, &p2]));
    }
}

//! Room codes and player ids (spec.md §6.2, §4.2).
//!
//! Grounded on `hosting::handle::RoomHandle` (an opaque id type held by the
//! registry) generalized to the string code scheme spec.md demands, and on
//! the existing sole use of `rand` for all server-side randomness.

use crate::config::{ROOM_CODE_ALPHABET, ROOM_CODE_LEN};
use rand::Rng;
use rand::seq::IndexedRandom;

/// 4-character room code drawn from an unambiguous alphabet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct RoomCode(String);

impl<'de> serde::Deserialize<'de> for RoomCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.parse().expect("RoomCode::from_str is infallible"))
    }
}

impl RoomCode {
    pub fn generate(rng: &mut impl Rng) -> Self {
        let alphabet: Vec<char> = ROOM_CODE_ALPHABET.chars().collect();
        let code: String = (0..ROOM_CODE_LEN)
            .map(|_| *alphabet.choose(rng).expect("alphabet is non-empty"))
            .collect();
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoomCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RoomCode {
    type Err = std::convert::Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_uppercase()))
    }
}

/// Opaque player identifier, stable for the room's lifetime.
/// Prefix `p_` followed by random lowercase alphanumeric characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn generate(rng: &mut impl Rng) -> Self {
        const CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
        let suffix: String = (0..12)
            .map(|_| *CHARS.choose(rng).expect("alphabet is non-empty") as char)
            .collect();
        Self(format!("p_{suffix}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PlayerId {
    type Err = std::convert::Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl<'de> serde::Deserialize<'de> for PlayerId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.parse().expect("PlayerId::from_str is infallible"))
    }
}

/// Current transport identity for a player; changes across reconnects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SocketId(pub u64);

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn room_code_has_expected_length_and_alphabet() {
        let mut rng = SmallRng::seed_from_u64(7);
        let code = RoomCode::generate(&mut rng);
        assert_eq!(code.as_str().len(), ROOM_CODE_LEN);
        assert!(code.as_str().chars().all(|c| ROOM_CODE_ALPHABET.contains(c)));
    }

    #[test]
    fn player_id_has_prefix() {
        let mut rng = SmallRng::seed_from_u64(1);
        let id = PlayerId::generate(&mut rng);
        assert!(id.as_str().starts_with("p_"));
        assert_eq!(id.as_str().len(), 14);
    }
}

//! Client-facing error kinds (spec.md §7).
//!
//! The teacher never reaches for `thiserror` anywhere in its own error
//! types (`anyhow::anyhow!(...)` for internal plumbing, plain `impl
//! Display` where a type needs to cross a boundary), so this follows
//! suit: a plain enum with a manual `Display`/`std::error::Error` impl.
//! Only the kinds that owe the sender an explicit reply live here
//! (`room_not_found`, `room_full`, `game_running`, `invalid_name`);
//! everything else in spec.md §7's table (`invalid_input`, `invalid_phase`,
//! `not_authorised`, `stale_timer`, `connection_lost`) is handled inline
//! as a logged no-op and never becomes a `Result::Err`.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomError {
    RoomNotFound,
    RoomFull,
    GameRunning,
    InvalidName,
}

impl RoomError {
    /// Stable wire code, used as the `code` field of an error reply.
    pub fn code(&self) -> &'static str {
        match self {
            Self::RoomNotFound => "room_not_found",
            Self::RoomFull => "room_full",
            Self::GameRunning => "game_running",
            Self::InvalidName => "invalid_name",
        }
    }
}

impl std::fmt::Display for RoomError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RoomNotFound => write!(f, "room not found"),
            Self::RoomFull => write!(f, "room is full"),
            Self::GameRunning => write!(f, "a match is already running in this room"),
            Self::InvalidName => write!(f, "invalid player name"),
        }
    }
}

impl std::error::Error for RoomError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(RoomError::RoomNotFound.code(), "room_not_found");
        assert_eq!(RoomError::RoomFull.code(), "room_full");
        assert_eq!(RoomError::GameRunning.code(), "game_running");
        assert_eq!(RoomError::InvalidName.code(), "invalid_name");
    }
}

//! Data model: the entities a room actor owns (spec.md §3).

pub mod bonus;
pub mod category;
pub mod player;
pub mod question;
pub mod room;
pub mod settings;
pub mod state;

pub use category::{Category, CategoryId};
pub use player::Player;
pub use question::{Question, QuestionContent, QuestionId};
pub use room::Room;
pub use settings::MatchSettings;
pub use state::{MatchState, Phase};

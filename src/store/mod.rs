//! External collaborators and the process-wide room registry (spec.md §3,
//! §9: "treat the question bank as an external interface").

pub mod questions;
pub mod rooms;

pub use questions::QuestionStore;
pub use rooms::RoomStore;

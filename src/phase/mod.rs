//! Phase handlers (spec.md §4). Each submodule owns one phase or cluster
//! of phases and exposes a `handle_message`/`handle_timer` pair that
//! `machine` dispatches into; all of them mutate `Ctx` directly, mirroring
//! the earlier `gameroom::room::Room` imperative shell.

pub mod bonus;
pub mod category_selection;
pub mod ctx;
pub mod lobby;
pub mod machine;
pub mod question_round;
pub mod rematch;
pub mod scoreboard;

pub use ctx::Ctx;

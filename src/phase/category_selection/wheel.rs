//! Category wheel (spec.md §4.4.2): server pre-picks one of the eight
//! seeded categories and holds while clients animate the spin.

use crate::config::WHEEL_SPIN_HOLD;
use crate::model::state::Phase;
use crate::phase::category_selection;
use crate::phase::ctx::Ctx;
use crate::transport::messages::ServerMessage;
use rand::Rng;

pub fn begin(ctx: &mut Ctx) {
    ctx.room.state.enter_phase(Phase::CategoryWheel);
    ctx.clear_timers();
    let len = ctx.room.state.voting_categories.len();
    let index = if len == 0 { None } else { Some(ctx.rng.random_range(0..len)) };
    ctx.room.state.wheel_selected_index = index;
    ctx.broadcast(ServerMessage::PhaseChange { phase: Phase::CategoryWheel });
    ctx.broadcast_snapshot();
    ctx.arm_timer(WHEEL_SPIN_HOLD);
}

pub async fn on_timer(ctx: &mut Ctx) {
    let category_id = ctx
        .room
        .state
        .wheel_selected_index
        .and_then(|i| ctx.room.state.voting_categories.get(i).cloned());
    if let Some(category_id) = category_id {
        category_selection::on_category_selected(ctx, category_id).await;
    }
}

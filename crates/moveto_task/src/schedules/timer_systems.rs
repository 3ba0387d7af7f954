//! Timer systems для move tasks

use bevy::prelude::{Res, ResMut, Time};

use super::MoveTimers;

/// System: продвинуть move таймеры (FixedUpdate, запускается ПЕРВЫМ)
///
/// В FixedUpdate `Res<Time>`: fixed time, т.е. delta детерминистична.
pub fn advance_move_timers(time: Res<Time>, mut timers: ResMut<MoveTimers>) {
    timers.advance(time.delta_secs());
}

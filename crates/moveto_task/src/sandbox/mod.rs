//! Sandbox backends для headless прогонов.
//!
//! # Architecture
//!
//! Orchestrator'у нужны planner, follower и readiness probe. Здесь простейшие
//! реализации всех трёх как Bevy resources:
//! - `SandboxNavigation`: прямоугольная область, прямые path'ы, partial за границей
//! - `SandboxFollower`: движение по точкам с постоянной скоростью
//! - `SandboxReadiness`: seeded "world busy" монетка (`DeterministicRng`)
//!
//! `SandboxPlugin` подключает их вместе с `MoveToPlugin`.

use bevy::prelude::*;

use crate::components::NavAgent;
use crate::schedules::advance_move_timers;
use crate::task::{MoveToPlugin, PathFollowingFinished};
use crate::DeterministicRng;

pub mod follower;
pub mod navigation;
pub mod readiness;


pub use follower::SandboxFollower;
pub use navigation::{SandboxNavigation, SANDBOX_NAV_DATA};
pub use readiness::{roll_sandbox_readiness, SandboxReadiness};

/// MoveToPlugin на sandbox backends
pub type SandboxMoveToPlugin = MoveToPlugin<SandboxNavigation, SandboxFollower, SandboxReadiness>;

/// Sandbox plugin
///
/// Порядок выполнения (FixedUpdate, до move task systems):
/// 1. roll_sandbox_readiness
/// 2. step_sandbox_follower: движение + `PathFollowingFinished`
/// 3. step_sandbox_navigation: repath'ы и goal observation
pub struct SandboxPlugin {
    pub area_min: Vec2,
    pub area_max: Vec2,
    pub follower_speed: f32,
    pub postpone_chance: f32,
}

impl Default for SandboxPlugin {
    fn default() -> Self {
        Self {
            area_min: Vec2::splat(-50.0),
            area_max: Vec2::splat(50.0),
            follower_speed: 4.0,
            postpone_chance: 0.0,
        }
    }
}

impl Plugin for SandboxPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }

        app.insert_resource(SandboxNavigation::new(self.area_min, self.area_max))
            .insert_resource(SandboxFollower::new(self.follower_speed))
            .insert_resource(SandboxReadiness::with_chance(self.postpone_chance))
            .add_plugins(SandboxMoveToPlugin::default())
            .add_systems(
                FixedUpdate,
                (roll_sandbox_readiness, step_sandbox_follower, step_sandbox_navigation)
                    .chain() // Последовательное выполнение для детерминизма
                    .before(advance_move_timers),
            );
    }
}

/// System: продвинуть агентов и отправить результаты follower'а
pub fn step_sandbox_follower(
    time: Res<Time>,
    mut follower: ResMut<SandboxFollower>,
    mut agents: Query<&mut NavAgent>,
    mut finished: EventWriter<PathFollowingFinished>,
) {
    let moved = follower.advance(time.delta_secs(), |entity| {
        agents.get(entity).ok().map(|agent| agent.location)
    });

    for (entity, location) in moved {
        if let Ok(mut agent) = agents.get_mut(entity) {
            agent.location = location;
        }
    }

    for result in follower.drain_finished() {
        crate::log(&format!(
            "🏃 SandboxFollower {:?}: request {:?} finished ({:?})",
            result.agent, result.request_id, result.result.code
        ));
        finished.write(result);
    }
}

/// System: отложенные repath'ы и goal observation
pub fn step_sandbox_navigation(mut navigation: ResMut<SandboxNavigation>, agents: Query<&NavAgent>) {
    navigation.step(|entity| agents.get(entity).ok().map(|agent| agent.location));
}

//! Мир вокруг агента: готовность к планированию и запросы к акторам.

use bevy::prelude::*;

use crate::components::NavAgent;

/// "Можно ли сейчас планировать?"
///
/// Например, navmesh перестраивается или мир в середине мутации: тогда
/// orchestrator откладывает query и ретраит по таймеру.
#[cfg_attr(test, mockall::automock)]
pub trait ReadinessProbe {
    fn should_postpone_path_updates(&self, agent: Entity) -> bool;
}

/// Планирование никогда не откладывается
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysReady;

impl ReadinessProbe for AlwaysReady {
    fn should_postpone_path_updates(&self, _agent: Entity) -> bool {
        false
    }
}

/// Позиции и габариты акторов (агент и goal entity)
pub trait ActorQuery {
    /// `None`: entity не существует или не навигационный актор
    fn nav_agent(&self, entity: Entity) -> Option<NavAgent>;

    /// Offset, который goal задаёт для подходящего к ней агента (в фрейме goal)
    fn move_goal_offset(&self, goal: Entity, mover: Entity) -> Vec3;
}

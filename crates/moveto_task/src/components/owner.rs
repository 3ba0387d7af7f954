//! Task owner компоненты

use bevy::prelude::*;

/// Default priority gameplay task'ов
pub const DEFAULT_TASK_PRIORITY: u8 = 127;

/// Маркер: entity (controller) умеет владеть move tasks
///
/// Controller-путь запуска (`MoveToTask::for_controller`) требует этот компонент.
/// Ability-путь его не проверяет: владельцем там выступает ability.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct GameplayTaskOwner {
    pub default_priority: u8,
}

impl Default for GameplayTaskOwner {
    fn default() -> Self {
        Self {
            default_priority: DEFAULT_TASK_PRIORITY - 1,
        }
    }
}

//! Move task events
//!
//! Вход: `MoveTaskCommand` (caller), `PathFollowingFinished` (follower).
//! Выход: `MoveTaskCompleted` / `MoveTaskFailed` (ровно одно на task),
//! `MoveTaskRestarted` (диагностика resume).

use bevy::prelude::*;

use super::TaskOwner;
use crate::following::{FollowResult, RequestId};
use crate::orchestrator::Outcome;
use crate::request::MoveToParams;

/// Команда move task'у агента
#[derive(Event, Debug, Clone)]
pub struct MoveTaskCommand {
    pub agent: Entity,
    pub action: MoveTaskAction,
}

#[derive(Debug, Clone)]
pub enum MoveTaskAction {
    /// Создать и активировать task (живой task агента тихо уничтожается)
    Begin { owner: TaskOwner, params: MoveToParams },
    /// Начать текущий request заново
    Restart,
    Stop,
    Pause,
    Resume,
    SetContinuousTracking(bool),
}

impl MoveTaskCommand {
    pub fn new(agent: Entity, action: MoveTaskAction) -> Self {
        Self { agent, action }
    }
}

/// Follower закончил request агента
#[derive(Event, Debug, Clone, Copy)]
pub struct PathFollowingFinished {
    pub agent: Entity,
    pub request_id: RequestId,
    pub result: FollowResult,
}

/// Move закончился (success / aborted / failed)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveTaskCompleted {
    pub agent: Entity,
    pub controller: Entity,
    pub outcome: Outcome,
    /// Последний path был partial
    pub partial: bool,
}

/// Request невалиден (нет goal, нет navigation, planner не смог)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveTaskFailed {
    pub agent: Entity,
    pub controller: Entity,
}

/// Resume не смог продолжить request, move начат заново
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveTaskRestarted {
    pub agent: Entity,
    pub previous: RequestId,
}

//! Move task: ECS обёртка над MoveOrchestrator.
//!
//! Два пути создания одного и того же task'а:
//! - **controller**: `MoveToTask::for_controller`: controller должен быть
//!   `GameplayTaskOwner`, приоритет повышенный (192)
//! - **ability**: `MoveToTask::for_ability`: владелец ability, приоритет default (127)
//!
//! Дальше оба живут одинаково: `MoveToPlugin` гоняет orchestrator в FixedUpdate.

use bevy::prelude::*;
use std::marker::PhantomData;

use crate::components::{GameplayTaskOwner, MoveGoalOffset, NavAgent, DEFAULT_TASK_PRIORITY};
use crate::config::MoveToConfig;
use crate::environment::ReadinessProbe;
use crate::error::MoveTaskError;
use crate::following::PathFollower;
use crate::navigation::NavigationQueryService;
use crate::orchestrator::{MoveContext, MoveOrchestrator, MoveTask};
use crate::request::{MoveRequest, MoveToParams};
use crate::schedules::{advance_move_timers, MoveTimers};

pub mod events;
pub mod systems;


pub use events::*;
pub use systems::*;

/// 1.5 * default priority
pub const CONTROLLER_TASK_PRIORITY: u8 = 192;

/// Кто запустил task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOwner {
    Controller {
        controller: Entity,
    },
    Ability {
        ability: Entity,
        controller: Entity,
        instance_name: String,
    },
}

impl TaskOwner {
    /// Controller агента (адресат уведомлений)
    pub fn controller(&self) -> Entity {
        match self {
            TaskOwner::Controller { controller } => *controller,
            TaskOwner::Ability { controller, .. } => *controller,
        }
    }
}

/// Move task агента (один на агента)
#[derive(Component, Debug)]
pub struct MoveToTask {
    owner: TaskOwner,
    priority: u8,
    orchestrator: MoveOrchestrator,
}

impl MoveToTask {
    /// Controller-путь. Без `GameplayTaskOwner` на controller'е task не создаётся.
    pub fn for_controller(
        controller: Entity,
        task_owner: Option<&GameplayTaskOwner>,
        agent: Entity,
        params: MoveToParams,
        config: &MoveToConfig,
    ) -> Result<Self, MoveTaskError> {
        if task_owner.is_none() {
            let err = MoveTaskError::MissingTaskOwner(format!("{:?}", controller));
            crate::log_error(&format!("❌ MoveToTask: {}", err));
            return Err(err);
        }

        Ok(Self::new(
            TaskOwner::Controller { controller },
            CONTROLLER_TASK_PRIORITY,
            agent,
            params,
            config,
        ))
    }

    /// Ability-путь (без проверки owner'а)
    pub fn for_ability(
        ability: Entity,
        instance_name: impl Into<String>,
        controller: Entity,
        agent: Entity,
        params: MoveToParams,
        config: &MoveToConfig,
    ) -> Self {
        Self::new(
            TaskOwner::Ability {
                ability,
                controller,
                instance_name: instance_name.into(),
            },
            DEFAULT_TASK_PRIORITY,
            agent,
            params,
            config,
        )
    }

    fn new(owner: TaskOwner, priority: u8, agent: Entity, params: MoveToParams, config: &MoveToConfig) -> Self {
        let continuous_tracking = params.use_continuous_goal_tracking;
        let mut orchestrator = MoveOrchestrator::new(agent, params.into_request(config), config);
        orchestrator.set_continuous_tracking(continuous_tracking);

        Self {
            owner,
            priority,
            orchestrator,
        }
    }

    pub fn owner(&self) -> &TaskOwner {
        &self.owner
    }

    pub fn controller(&self) -> Entity {
        self.owner.controller()
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }

    pub fn orchestrator(&self) -> &MoveOrchestrator {
        &self.orchestrator
    }

    pub fn orchestrator_mut(&mut self) -> &mut MoveOrchestrator {
        &mut self.orchestrator
    }

    pub fn is_finished(&self) -> bool {
        self.orchestrator.is_finished()
    }

    /// Запустить move с request'ом, заданным при создании
    pub fn activate(&mut self, ctx: &mut MoveContext<'_>) -> Result<(), MoveTaskError> {
        crate::log(&format!(
            "📋 MoveToTask {:?}: activate (owner {:?}, priority {})",
            self.orchestrator.agent(),
            self.owner,
            self.priority
        ));
        self.orchestrator.restart(ctx)
    }
}

impl MoveTask for MoveToTask {
    fn start(&mut self, ctx: &mut MoveContext<'_>, request: MoveRequest) -> Result<(), MoveTaskError> {
        self.orchestrator.start(ctx, request)
    }

    fn stop(&mut self, ctx: &mut MoveContext<'_>) {
        self.orchestrator.stop(ctx);
    }

    fn pause(&mut self, ctx: &mut MoveContext<'_>) {
        self.orchestrator.pause(ctx);
    }

    fn resume(&mut self, ctx: &mut MoveContext<'_>) {
        self.orchestrator.resume(ctx);
    }

    fn agent(&self) -> Entity {
        self.orchestrator.agent()
    }
}

/// Move task plugin
///
/// `N`, `F`, `R`: resources хоста (planner, follower, readiness).
/// Порядок выполнения (FixedUpdate):
/// 1. advance_move_timers: время таймеров
/// 2. drive_move_tasks: commands → таймеры → follower results → path events → уведомления
/// 3. cleanup_finished_move_tasks: убрать завершённые tasks
pub struct MoveToPlugin<N, F, R> {
    _marker: PhantomData<fn() -> (N, F, R)>,
}

impl<N, F, R> Default for MoveToPlugin<N, F, R> {
    fn default() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<N, F, R> Plugin for MoveToPlugin<N, F, R>
where
    N: NavigationQueryService + Resource,
    F: PathFollower + Resource,
    R: ReadinessProbe + Resource,
{
    fn build(&self, app: &mut App) {
        app.init_resource::<MoveToConfig>()
            .init_resource::<MoveTimers>()
            .add_event::<MoveTaskCommand>()
            .add_event::<PathFollowingFinished>()
            .add_event::<MoveTaskCompleted>()
            .add_event::<MoveTaskFailed>()
            .add_event::<MoveTaskRestarted>()
            .register_type::<NavAgent>()
            .register_type::<MoveGoalOffset>()
            .register_type::<GameplayTaskOwner>()
            .add_systems(
                FixedUpdate,
                (
                    advance_move_timers,
                    drive_move_tasks::<N, F, R>,
                    cleanup_finished_move_tasks,
                )
                    .chain(), // Последовательное выполнение для детерминизма
            );
    }
}

//! Move task systems (FixedUpdate)

use bevy::prelude::*;
use std::collections::BTreeMap;

use super::events::{
    MoveTaskAction, MoveTaskCommand, MoveTaskCompleted, MoveTaskFailed, MoveTaskRestarted, PathFollowingFinished,
};
use super::{MoveToTask, TaskOwner};
use crate::components::{GameplayTaskOwner, MoveGoalOffset, NavAgent};
use crate::config::MoveToConfig;
use crate::environment::{ActorQuery, ReadinessProbe};
use crate::following::PathFollower;
use crate::navigation::NavigationQueryService;
use crate::orchestrator::{MoveContext, MoveNotification, MoveTask};
use crate::schedules::MoveTimers;

/// Данные акторов, нужные orchestrator'у
pub type ActorData = (&'static NavAgent, Option<&'static MoveGoalOffset>);

/// `ActorQuery` поверх ECS query
pub struct EcsActors<'a, 'w, 's> {
    pub agents: &'a Query<'w, 's, ActorData>,
}

impl ActorQuery for EcsActors<'_, '_, '_> {
    fn nav_agent(&self, entity: Entity) -> Option<NavAgent> {
        self.agents.get(entity).ok().map(|(agent, _)| *agent)
    }

    fn move_goal_offset(&self, goal: Entity, _mover: Entity) -> Vec3 {
        self.agents
            .get(goal)
            .ok()
            .and_then(|(_, offset)| offset.map(|offset| offset.0))
            .unwrap_or(Vec3::ZERO)
    }
}

/// Task агента: сначала созданные в этом тике, потом из ECS
fn task_mut<'a>(
    tasks: &'a mut Query<&mut MoveToTask>,
    fresh: &'a mut BTreeMap<Entity, MoveToTask>,
    agent: Entity,
) -> Option<&'a mut MoveToTask> {
    if let Some(task) = fresh.get_mut(&agent) {
        return Some(task);
    }
    tasks.get_mut(agent).ok().map(|task| task.into_inner())
}

/// System: один шаг всех move tasks
///
/// Порядок внутри шага фиксирован:
/// 1. `MoveTaskCommand` (begin / stop / pause / resume / ...)
/// 2. Сработавшие таймеры (readiness retry, repath retry, tracking restart)
/// 3. `PathFollowingFinished` от follower'а
/// 4. События observed path'ов
/// 5. Уведомления → `MoveTaskCompleted` / `MoveTaskFailed` / `MoveTaskRestarted`
#[allow(clippy::too_many_arguments)]
pub fn drive_move_tasks<N, F, R>(
    mut commands: Commands,
    mut task_commands: EventReader<MoveTaskCommand>,
    mut follower_results: EventReader<PathFollowingFinished>,
    mut completed: EventWriter<MoveTaskCompleted>,
    mut failed: EventWriter<MoveTaskFailed>,
    mut restarted: EventWriter<MoveTaskRestarted>,
    mut tasks: Query<&mut MoveToTask>,
    actors: Query<ActorData>,
    owners: Query<&GameplayTaskOwner>,
    config: Res<MoveToConfig>,
    mut timers: ResMut<MoveTimers>,
    mut navigation: ResMut<N>,
    mut follower: ResMut<F>,
    readiness: Res<R>,
) where
    N: NavigationQueryService + Resource,
    F: PathFollower + Resource,
    R: ReadinessProbe + Resource,
{
    let fired = timers.take_fired();
    let actor_query = EcsActors { agents: &actors };
    let mut ctx = MoveContext {
        navigation: &mut *navigation,
        follower: &mut *follower,
        scheduler: &mut *timers,
        readiness: &*readiness,
        actors: &actor_query,
    };

    // Tasks, созданные в этом тике (в ECS попадут через Commands)
    let mut fresh: BTreeMap<Entity, MoveToTask> = BTreeMap::new();

    // 1. Commands
    for command in task_commands.read() {
        let agent = command.agent;

        if let MoveTaskAction::Begin { owner, params } = &command.action {
            // Живой task агента уходит молча: это teardown старого orchestrator'а
            // (таймеры → observers → abort → path), а не новый attempt внутри него
            if let Some(previous) = task_mut(&mut tasks, &mut fresh, agent) {
                previous.orchestrator_mut().teardown(&mut ctx);
            }

            let task = match owner.clone() {
                TaskOwner::Controller { controller } => {
                    MoveToTask::for_controller(controller, owners.get(controller).ok(), agent, params.clone(), &config)
                }
                TaskOwner::Ability {
                    ability,
                    controller,
                    instance_name,
                } => Ok(MoveToTask::for_ability(
                    ability,
                    instance_name,
                    controller,
                    agent,
                    params.clone(),
                    &config,
                )),
            };

            let Ok(mut task) = task else {
                continue;
            };
            if let Err(err) = task.activate(&mut ctx) {
                crate::log_error(&format!("❌ MoveToTask {:?}: {}", agent, err));
                continue;
            }
            fresh.insert(agent, task);
            continue;
        }

        let Some(task) = task_mut(&mut tasks, &mut fresh, agent) else {
            crate::log_warning(&format!(
                "⚠️ MoveTaskCommand {:?} for {:?} without move task",
                command.action, agent
            ));
            continue;
        };

        match &command.action {
            MoveTaskAction::Begin { .. } => {}
            MoveTaskAction::Restart => {
                if let Err(err) = task.orchestrator_mut().restart(&mut ctx) {
                    crate::log_warning(&format!("⚠️ MoveToTask {:?}: {}", agent, err));
                }
            }
            MoveTaskAction::Stop => task.stop(&mut ctx),
            MoveTaskAction::Pause => task.pause(&mut ctx),
            MoveTaskAction::Resume => task.resume(&mut ctx),
            MoveTaskAction::SetContinuousTracking(enable) => {
                task.orchestrator_mut().set_continuous_tracking(*enable);
            }
        }
    }

    // 2. Timers
    for timer in fired {
        if let Some(task) = task_mut(&mut tasks, &mut fresh, timer.owner) {
            task.orchestrator_mut().on_timer(&mut ctx, timer.handle);
        }
    }

    // 3. Follower results
    for finished in follower_results.read() {
        if let Some(task) = task_mut(&mut tasks, &mut fresh, finished.agent) {
            task.orchestrator_mut()
                .on_request_finished(&mut ctx, finished.request_id, finished.result);
        }
    }

    // 4. Path events
    for mut task in tasks.iter_mut() {
        task.orchestrator_mut().poll_path_events(&mut ctx);
    }
    for task in fresh.values_mut() {
        task.orchestrator_mut().poll_path_events(&mut ctx);
    }

    // 5. Notifications
    let mut publish = |task: &mut MoveToTask| {
        let agent = task.agent();
        let controller = task.controller();
        for notification in task.orchestrator_mut().drain_notifications() {
            match notification {
                MoveNotification::Completed { outcome, partial } => {
                    completed.write(MoveTaskCompleted {
                        agent,
                        controller,
                        outcome,
                        partial,
                    });
                }
                MoveNotification::Failed => {
                    failed.write(MoveTaskFailed { agent, controller });
                }
                MoveNotification::ResumedWithRestart { previous } => {
                    restarted.write(MoveTaskRestarted { agent, previous });
                }
            }
        }
    };

    for mut task in tasks.iter_mut() {
        publish(&mut *task);
    }
    for (agent, mut task) in fresh {
        publish(&mut task);
        if !task.is_finished() {
            commands.entity(agent).insert(task);
        }
    }
}

/// System: убрать завершённые tasks
pub fn cleanup_finished_move_tasks(
    mut commands: Commands,
    tasks: Query<(Entity, &MoveToTask)>,
    mut timers: ResMut<MoveTimers>,
) {
    for (entity, task) in tasks.iter() {
        if !task.is_finished() {
            continue;
        }

        let dropped = timers.clear_all_for(entity);
        if dropped > 0 {
            crate::log_warning(&format!("⚠️ MoveToTask {:?}: dropped {} stale timers", entity, dropped));
        }
        commands.entity(entity).remove::<MoveToTask>();
        crate::log(&format!("🧹 MoveToTask {:?}: removed", entity));
    }
}

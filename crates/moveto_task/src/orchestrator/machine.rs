//! MoveOrchestrator: state machine одного move request'а

use bevy::prelude::*;

use super::state::{MoveNotification, OrchestratorState, Outcome};
use super::{MoveContext, MoveTask};
use crate::config::MoveToConfig;
use crate::error::{MoveRequestError, MoveTaskError, Result};
use crate::following::{FollowResult, FollowResultCode, FollowResultFlags, FollowerStatus, RequestId};
use crate::navigation::{NavPathRef, PathEvent, PathObserverHandle, PathQuery, PathQueryOutcome, PathUpdateKind};
use crate::request::{MoveGoal, MoveRequest, ResolvedGoal};
use crate::schedules::TimerHandle;

/// Именованные слоты таймеров (каждый отменяется независимо)
#[derive(Debug, Clone, Copy, Default)]
struct TimerSlots {
    /// Readiness retry перед perform_move
    move_retry: Option<TimerHandle>,
    /// Readiness retry перед repath
    path_retry: Option<TimerHandle>,
    /// Continuous tracking: restart на следующем тике
    restart: Option<TimerHandle>,
}

impl TimerSlots {
    fn count(&self) -> usize {
        [self.move_retry, self.path_retry, self.restart]
            .iter()
            .filter(|slot| slot.is_some())
            .count()
    }

    fn take_all(&mut self) -> Vec<TimerHandle> {
        [self.move_retry.take(), self.path_retry.take(), self.restart.take()]
            .into_iter()
            .flatten()
            .collect()
    }
}

/// Что получилось у одной попытки
enum MoveAttempt {
    AlreadyAtGoal(RequestId),
    Following { request_id: RequestId, path: NavPathRef },
}

/// Orchestrator одного логического move
///
/// Единственный мутатор своего состояния; все входы идут с одного тика.
#[derive(Debug)]
pub struct MoveOrchestrator {
    agent: Entity,
    request: MoveRequest,
    state: OrchestratorState,
    request_id: RequestId,

    path: Option<NavPathRef>,
    path_observer: Option<PathObserverHandle>,
    listening_to_follower: bool,

    continuous_tracking: bool,
    paused: bool,
    /// На паузе был взведён path retry → после resume repath нужно повторить
    repath_on_resume: bool,

    timers: TimerSlots,
    retry_interval: f32,
    max_readiness_retries: Option<u32>,
    max_repath_retries: Option<u32>,
    readiness_retries: u32,
    repath_retries: u32,
    goal_tether_distance: f32,

    move_result: Option<Outcome>,
    last_partial: bool,
    notified: bool,
    notifications: Vec<MoveNotification>,
}

impl MoveOrchestrator {
    pub fn new(agent: Entity, request: MoveRequest, config: &MoveToConfig) -> Self {
        Self {
            agent,
            request,
            state: OrchestratorState::Idle,
            request_id: RequestId::INVALID,
            path: None,
            path_observer: None,
            listening_to_follower: false,
            continuous_tracking: false,
            paused: false,
            repath_on_resume: false,
            timers: TimerSlots::default(),
            retry_interval: config.retry_interval_secs,
            max_readiness_retries: config.max_readiness_retries,
            max_repath_retries: config.max_repath_retries,
            readiness_retries: 0,
            repath_retries: 0,
            goal_tether_distance: config.goal_tether_distance,
            move_result: None,
            last_partial: false,
            notified: false,
            notifications: Vec::new(),
        }
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    pub fn agent(&self) -> Entity {
        self.agent
    }

    pub fn request(&self) -> &MoveRequest {
        &self.request
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn is_finished(&self) -> bool {
        self.state == OrchestratorState::Finished
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn continuous_tracking(&self) -> bool {
        self.continuous_tracking
    }

    pub fn path(&self) -> Option<&NavPathRef> {
        self.path.as_ref()
    }

    /// Исход (после Finished)
    pub fn move_result(&self) -> Option<Outcome> {
        self.move_result
    }

    pub fn was_move_successful(&self) -> bool {
        self.move_result == Some(Outcome::Success)
    }

    pub fn was_move_partial(&self) -> bool {
        self.last_partial
    }

    pub fn outstanding_timer_count(&self) -> usize {
        self.timers.count()
    }

    pub fn is_observing_path(&self) -> bool {
        self.path_observer.is_some()
    }

    pub fn is_listening_to_follower(&self) -> bool {
        self.listening_to_follower
    }

    /// Забрать накопленные уведомления
    pub fn drain_notifications(&mut self) -> Vec<MoveNotification> {
        std::mem::take(&mut self.notifications)
    }

    // ========================================================================
    // Caller API
    // ========================================================================

    pub fn set_continuous_tracking(&mut self, enable: bool) {
        self.continuous_tracking = enable;
    }

    /// Начать move с новым request'ом (вытесняет текущую попытку)
    pub fn start(&mut self, ctx: &mut MoveContext<'_>, request: MoveRequest) -> std::result::Result<(), MoveTaskError> {
        if self.is_finished() {
            return Err(MoveTaskError::AlreadyFinished);
        }
        self.request = request;
        self.activate(ctx);
        Ok(())
    }

    /// Начать move заново с текущим request'ом
    pub fn restart(&mut self, ctx: &mut MoveContext<'_>) -> std::result::Result<(), MoveTaskError> {
        if self.is_finished() {
            return Err(MoveTaskError::AlreadyFinished);
        }
        self.activate(ctx);
        Ok(())
    }

    /// Отмена caller'ом: Finished(Aborted) через completion канал
    pub fn stop(&mut self, ctx: &mut MoveContext<'_>) {
        if self.is_finished() {
            return;
        }

        crate::log(&format!("🛑 MoveTo {:?}: stopped by caller", self.agent));
        if self.request_id.is_valid() && ctx.follower.status(self.agent) != FollowerStatus::Idle {
            self.reset_observers();
            ctx.follower.abort(self.agent, self.request_id, FollowResultFlags::USER_ABORT);
        }
        self.request_id = RequestId::INVALID;
        self.finish_move_task(ctx, Outcome::Aborted);
    }

    pub fn pause(&mut self, ctx: &mut MoveContext<'_>) {
        if !self.is_active() || self.paused {
            return;
        }

        if self.request_id.is_valid() {
            ctx.follower.pause(self.agent, self.request_id);
        }

        self.repath_on_resume = self.timers.path_retry.is_some();
        self.reset_timers(ctx);
        self.paused = true;
        crate::log(&format!("⏸️ MoveTo {:?}: paused ({:?})", self.agent, self.state));
    }

    pub fn resume(&mut self, ctx: &mut MoveContext<'_>) {
        if !self.is_active() || !self.paused {
            return;
        }
        self.paused = false;

        let previous = self.request_id;
        if previous.is_valid()
            && ctx.follower.current_request_id(self.agent) == previous
            && ctx.follower.resume(self.agent, previous)
        {
            crate::log(&format!("▶️ MoveTo {:?}: resumed request {:?}", self.agent, previous));

            if std::mem::take(&mut self.repath_on_resume) {
                self.conditional_update_path(ctx);
            }
            return;
        }

        self.repath_on_resume = false;
        if previous.is_valid() {
            crate::log(&format!(
                "🔁 MoveTo {:?}: resume of request {:?} failed, starting new move",
                self.agent, previous
            ));
            self.notifications.push(MoveNotification::ResumedWithRestart { previous });
        }

        self.request_id = RequestId::INVALID;
        self.conditional_perform_move(ctx);
    }

    /// Уничтожение task'а без уведомлений
    ///
    /// Порядок: таймеры → observers → abort живого request'а → release path.
    pub fn teardown(&mut self, ctx: &mut MoveContext<'_>) {
        if self.state != OrchestratorState::Finished {
            crate::log(&format!("🧹 MoveTo {:?}: teardown in {:?}", self.agent, self.state));
        }
        self.release(ctx);
    }

    // ========================================================================
    // Callbacks (timers, follower, path)
    // ========================================================================

    /// Сработал таймер (handle'ы чужих / отменённых таймеров игнорируются)
    pub fn on_timer(&mut self, ctx: &mut MoveContext<'_>, handle: TimerHandle) {
        if !self.is_active() {
            return;
        }

        if self.paused {
            // Слот освобождается, repath переносится на resume()
            if self.timers.path_retry == Some(handle) {
                self.timers.path_retry = None;
                self.repath_on_resume = true;
            } else if self.timers.move_retry == Some(handle) {
                self.timers.move_retry = None;
            } else if self.timers.restart == Some(handle) {
                self.timers.restart = None;
            }
            return;
        }

        if self.timers.move_retry == Some(handle) {
            self.timers.move_retry = None;
            self.conditional_perform_move(ctx);
        } else if self.timers.path_retry == Some(handle) {
            self.timers.path_retry = None;
            self.conditional_update_path(ctx);
        } else if self.timers.restart == Some(handle) {
            self.timers.restart = None;
            crate::log(&format!("🎯 MoveTo {:?}: goal tracking restart", self.agent));
            self.perform_move(ctx);
        }
    }

    /// Follower закончил request
    pub fn on_request_finished(&mut self, ctx: &mut MoveContext<'_>, request_id: RequestId, result: FollowResult) {
        if !self.is_active() {
            return;
        }

        if !self.listening_to_follower || !self.request_id.matches(request_id) {
            crate::log_warning(&format!(
                "⚠️ MoveTo {:?}: ignoring finish of {:?} (current {:?})",
                self.agent, request_id, self.request_id
            ));
            return;
        }

        self.handle_request_finished(ctx, result);
    }

    /// Прочитать события observed path'а
    pub fn poll_path_events(&mut self, ctx: &mut MoveContext<'_>) {
        let events = match (&self.path, self.path_observer) {
            (Some(path), Some(handle)) => path.take_events(handle),
            _ => return,
        };

        for event in events {
            // Finish/supersession снимает observer: остаток очереди уже не наш
            if !self.is_active() || self.path_observer.is_none() {
                break;
            }
            self.on_path_event(ctx, event);
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn activate(&mut self, ctx: &mut MoveContext<'_>) {
        if self.is_active() {
            crate::log(&format!("🔀 MoveTo {:?}: superseding attempt in {:?}", self.agent, self.state));
            self.reset_observers();
            self.reset_timers(ctx);
            if self.request_id.is_valid() && ctx.follower.status(self.agent) != FollowerStatus::Idle {
                ctx.follower.abort(
                    self.agent,
                    self.request_id,
                    FollowResultFlags::USER_ABORT | FollowResultFlags::NEW_REQUEST,
                );
            }
        }

        if self.continuous_tracking {
            let looping = if self.request.is_move_to_entity() {
                "entity => looping successful moves"
            } else {
                "location => will NOT loop"
            };
            crate::log(&format!("🎯 MoveTo {:?}: continuous goal tracking, {}", self.agent, looping));
        }

        crate::log(&format!("🚶 MoveTo {:?}: start → {}", self.agent, self.request));
        self.paused = false;
        self.repath_on_resume = false;
        self.readiness_retries = 0;
        self.request_id = RequestId::INVALID;
        self.conditional_perform_move(ctx);
    }

    fn should_postpone(&self, ctx: &MoveContext<'_>) -> bool {
        self.request.uses_pathfinding() && ctx.readiness.should_postpone_path_updates(self.agent)
    }

    fn conditional_perform_move(&mut self, ctx: &mut MoveContext<'_>) {
        if self.should_postpone(ctx) {
            self.readiness_retries += 1;
            if self.max_readiness_retries.is_some_and(|cap| self.readiness_retries > cap) {
                crate::log_warning(&format!(
                    "⚠️ MoveTo {:?}: readiness retries exhausted ({}), giving up",
                    self.agent,
                    self.readiness_retries - 1
                ));
                self.finish_move_task(ctx, Outcome::Failed);
                return;
            }

            crate::log(&format!("⏳ MoveTo {:?}: can't path right now, waiting...", self.agent));
            if let Some(stale) = self.timers.move_retry.take() {
                ctx.scheduler.clear_timer(stale);
            }
            self.timers.move_retry = Some(ctx.scheduler.set_timer(self.agent, self.retry_interval));
            self.state = OrchestratorState::AwaitingReadiness;
        } else {
            if let Some(stale) = self.timers.move_retry.take() {
                ctx.scheduler.clear_timer(stale);
            }
            self.readiness_retries = 0;
            self.perform_move(ctx);
        }
    }

    fn perform_move(&mut self, ctx: &mut MoveContext<'_>) {
        self.reset_observers();
        self.reset_timers(ctx);
        self.request_id = RequestId::INVALID;

        match self.move_to(ctx) {
            Ok(MoveAttempt::AlreadyAtGoal(request_id)) => {
                crate::log(&format!("✅ MoveTo {:?}: already at goal", self.agent));
                self.request_id = request_id;
                self.state = OrchestratorState::Following;
                self.handle_request_finished(
                    ctx,
                    FollowResult::new(FollowResultCode::Success, FollowResultFlags::ALREADY_AT_GOAL),
                );
            }
            Ok(MoveAttempt::Following { request_id, path }) => {
                self.request_id = request_id;
                self.listening_to_follower = true;
                self.last_partial = path.is_partial();
                self.set_observed_path(path);
                self.repath_retries = 0;
                self.state = OrchestratorState::Following;
                crate::log(&format!(
                    "🧭 MoveTo {:?}: following {:?} (partial: {})",
                    self.agent, request_id, self.last_partial
                ));
            }
            Err(err) => {
                crate::log_error(&format!("❌ MoveTo {:?}: {}", self.agent, err));
                self.finish_move_task(ctx, err.outcome());
            }
        }
    }

    /// Одна попытка. При ошибке follower узнаёт о провале через immediate finish.
    fn move_to(&mut self, ctx: &mut MoveContext<'_>) -> Result<MoveAttempt> {
        let attempt = self.try_move_to(ctx);
        if attempt.is_err() {
            ctx.follower.request_immediate_finish(self.agent, FollowResultCode::Invalid);
        }
        attempt
    }

    fn try_move_to(&mut self, ctx: &mut MoveContext<'_>) -> Result<MoveAttempt> {
        let agent = ctx
            .actors
            .nav_agent(self.agent)
            .ok_or_else(|| MoveRequestError::SpecInvalid(format!("agent {:?} is not a navigation agent", self.agent)))?;

        let goal = self.resolve_goal(ctx, &agent)?;

        if ctx.follower.has_reached(&agent, &goal, &self.request) {
            let request_id = ctx.follower.request_immediate_finish(self.agent, FollowResultCode::Success);
            return Ok(MoveAttempt::AlreadyAtGoal(request_id));
        }

        let query = ctx
            .navigation
            .build_query(
                self.agent,
                &agent,
                goal.location,
                self.request.navigation_filter(),
                self.request.allows_partial_path(),
                self.request.uses_pathfinding(),
            )
            .ok_or(MoveRequestError::NoNavigationData)?;

        let path = self.find_path(ctx, &query)?;

        let request_id = ctx.follower.request_move(self.agent, &self.request, path.clone());
        if !request_id.is_valid() {
            return Err(MoveRequestError::FollowerRejected);
        }

        Ok(MoveAttempt::Following { request_id, path })
    }

    /// Goal на момент query: entity goal пересчитывается каждый раз
    fn resolve_goal(&mut self, ctx: &MoveContext<'_>, agent: &crate::components::NavAgent) -> Result<ResolvedGoal> {
        match self.request.goal() {
            MoveGoal::Location(location) => {
                if !location.is_finite() {
                    return Err(MoveRequestError::InvalidDestination(format!("{:?}", location)));
                }
                if !self.request.projects_goal() {
                    return Ok(ResolvedGoal::point(location));
                }

                match ctx.navigation.project(location, agent) {
                    Some(projected) => {
                        self.request.update_goal_location(projected);
                        Ok(ResolvedGoal::point(projected))
                    }
                    None if self.request.uses_pathfinding() => {
                        Err(MoveRequestError::ProjectionFailed(format!("{:?}", location)))
                    }
                    None => {
                        crate::log_warning(&format!(
                            "⚠️ MoveTo {:?}: failed to project {:?} onto navigation, pathfinding is disabled (disable goal projection?)",
                            self.agent, location
                        ));
                        Ok(ResolvedGoal::point(location))
                    }
                }
            }
            MoveGoal::Entity(goal) => {
                let anchor = ctx.actors.nav_agent(goal).ok_or_else(|| {
                    MoveRequestError::SpecInvalid(format!("goal entity {:?} no longer exists", goal))
                })?;
                let offset = ctx.actors.move_goal_offset(goal, self.agent);

                Ok(ResolvedGoal {
                    location: anchor.transform_point(offset),
                    entity: Some(goal),
                    radius: anchor.radius,
                })
            }
        }
    }

    fn find_path(&self, ctx: &mut MoveContext<'_>, query: &PathQuery) -> Result<NavPathRef> {
        let result = ctx.navigation.find_path(query);

        let path = match result.outcome {
            PathQueryOutcome::Error => {
                return Err(MoveRequestError::PlanningFailed(format!(
                    "planner error towards {:?}",
                    query.goal
                )))
            }
            PathQueryOutcome::Fail => {
                return Err(MoveRequestError::PlanningFailed(format!("no path to {:?}", query.goal)))
            }
            PathQueryOutcome::Success => result
                .path
                .ok_or_else(|| MoveRequestError::PlanningFailed("planner returned no path".to_string()))?,
        };

        if path.is_partial() && !self.request.allows_partial_path() {
            return Err(MoveRequestError::PartialPathRejected);
        }

        if let Some(goal) = self.request.goal_entity() {
            path.with_mut(|p| p.set_goal_observation(goal, self.goal_tether_distance));
        }

        Ok(path)
    }

    fn set_observed_path(&mut self, path: NavPathRef) {
        if let (Some(old), Some(handle)) = (&self.path, self.path_observer.take()) {
            old.unsubscribe(handle);
        }

        // Repath делает orchestrator (с учётом readiness), не backend
        path.with_mut(|p| p.enable_recalculation_on_invalidation(false));
        self.path_observer = Some(path.subscribe());
        self.path = Some(path);
    }

    fn handle_request_finished(&mut self, ctx: &mut MoveContext<'_>, result: FollowResult) {
        if result.is_replaced_by_new_request() {
            crate::log(&format!(
                "↩️ MoveTo {:?}: ignoring finish, move was aborted by new request",
                self.agent
            ));
            return;
        }

        // Follower уже idle по этому request'у, finish не должен его абортить
        self.request_id = RequestId::INVALID;

        if self.continuous_tracking && self.request.is_move_to_entity() && result.is_success() {
            crate::log(&format!(
                "🎯 MoveTo {:?}: goal tracking active, moving again next tick",
                self.agent
            ));
            if let Some(stale) = self.timers.restart.take() {
                ctx.scheduler.clear_timer(stale);
            }
            self.timers.restart = Some(ctx.scheduler.set_timer_for_next_tick(self.agent));
            self.state = OrchestratorState::Following;
        } else {
            self.finish_move_task(ctx, Outcome::from(result.code));
        }
    }

    fn on_path_event(&mut self, ctx: &mut MoveContext<'_>, event: PathEvent) {
        crate::log(&format!("🛤️ MoveTo {:?}: path event {:?}", self.agent, event));

        match event {
            PathEvent::NewPath | PathEvent::UpdatedDueToGoalMoved | PathEvent::UpdatedDueToNavigationChanged => {
                let partial = self.path.as_ref().is_some_and(|path| path.is_partial());
                self.last_partial = partial;

                if partial && !self.request.allows_partial_path() {
                    crate::log(&format!("✂️ MoveTo {:?}: partial path is not allowed, aborting", self.agent));
                    self.finish_move_task(ctx, Outcome::Aborted);
                } else if self.state == OrchestratorState::RepathPending {
                    self.repath_retries = 0;
                    self.state = OrchestratorState::Following;
                }
            }
            PathEvent::Invalidated => self.conditional_update_path(ctx),
            PathEvent::Cleared | PathEvent::RepathFailed => {
                crate::log(&format!("🚫 MoveTo {:?}: no path, aborting", self.agent));
                self.finish_move_task(ctx, Outcome::Aborted);
            }
            PathEvent::MetaPathUpdate => {}
        }
    }

    fn conditional_update_path(&mut self, ctx: &mut MoveContext<'_>) {
        // Follower не бросает path, пока мы выбираем момент repath
        if let Some(path) = &self.path {
            path.set_manual_repath_waiting(true);
        }
        self.state = OrchestratorState::RepathPending;

        if self.should_postpone(ctx) {
            if self.paused {
                // Пока на паузе таймеров нет: repath проверит resume()
                crate::log(&format!("⏳ MoveTo {:?}: repath deferred until resume", self.agent));
                self.repath_on_resume = true;
                return;
            }

            self.repath_retries += 1;
            if self.max_repath_retries.is_some_and(|cap| self.repath_retries > cap) {
                crate::log_warning(&format!(
                    "⚠️ MoveTo {:?}: repath retries exhausted ({}), giving up",
                    self.agent,
                    self.repath_retries - 1
                ));
                self.finish_move_task(ctx, Outcome::Failed);
                return;
            }

            crate::log(&format!("⏳ MoveTo {:?}: can't repath right now, waiting...", self.agent));
            if let Some(stale) = self.timers.path_retry.take() {
                ctx.scheduler.clear_timer(stale);
            }
            self.timers.path_retry = Some(ctx.scheduler.set_timer(self.agent, self.retry_interval));
            return;
        }

        if let Some(stale) = self.timers.path_retry.take() {
            ctx.scheduler.clear_timer(stale);
        }

        match self.path.as_ref().filter(|path| path.nav_data().is_some()) {
            Some(path) => {
                crate::log(&format!("🔄 MoveTo {:?}: requesting repath", self.agent));
                ctx.navigation.request_repath(path, PathUpdateKind::NavigationChanged);
            }
            None => {
                crate::log(&format!("🚫 MoveTo {:?}: unable to repath, aborting", self.agent));
                self.finish_move_task(ctx, Outcome::Aborted);
            }
        }
    }

    fn finish_move_task(&mut self, ctx: &mut MoveContext<'_>, outcome: Outcome) {
        if self.request_id.is_valid() && ctx.follower.status(self.agent) != FollowerStatus::Idle {
            self.reset_observers();
            ctx.follower.abort(self.agent, self.request_id, FollowResultFlags::OWNER_FINISHED);
            self.request_id = RequestId::INVALID;
        }

        if let Some(path) = &self.path {
            self.last_partial = path.is_partial();
        }
        self.move_result = Some(outcome);
        self.release(ctx);

        crate::log_info(&format!(
            "🏁 MoveTo {:?}: finished with {:?} (partial: {})",
            self.agent, outcome, self.last_partial
        ));
        self.notify(outcome);
    }

    /// Teardown: таймеры → observers → abort → path
    fn release(&mut self, ctx: &mut MoveContext<'_>) {
        self.reset_timers(ctx);
        self.reset_observers();

        if self.request_id.is_valid() && ctx.follower.status(self.agent) != FollowerStatus::Idle {
            ctx.follower.abort(self.agent, self.request_id, FollowResultFlags::OWNER_FINISHED);
        }
        self.request_id = RequestId::INVALID;

        self.path = None;
        self.paused = false;
        self.repath_on_resume = false;
        self.state = OrchestratorState::Finished;
    }

    fn notify(&mut self, outcome: Outcome) {
        if self.notified {
            return;
        }
        self.notified = true;

        let notification = match outcome {
            Outcome::Invalid => MoveNotification::Failed,
            outcome => MoveNotification::Completed {
                outcome,
                partial: self.last_partial,
            },
        };
        self.notifications.push(notification);
    }

    /// Supersession order: path observer → goal observation → follower listening
    fn reset_observers(&mut self) {
        if let Some(path) = &self.path {
            if let Some(handle) = self.path_observer.take() {
                path.unsubscribe(handle);
            }
            path.with_mut(|p| p.disable_goal_observation());
        }
        self.path_observer = None;
        self.listening_to_follower = false;
    }

    fn reset_timers(&mut self, ctx: &mut MoveContext<'_>) {
        for handle in self.timers.take_all() {
            ctx.scheduler.clear_timer(handle);
        }
    }
}

impl MoveTask for MoveOrchestrator {
    fn start(&mut self, ctx: &mut MoveContext<'_>, request: MoveRequest) -> std::result::Result<(), MoveTaskError> {
        MoveOrchestrator::start(self, ctx, request)
    }

    fn stop(&mut self, ctx: &mut MoveContext<'_>) {
        MoveOrchestrator::stop(self, ctx)
    }

    fn pause(&mut self, ctx: &mut MoveContext<'_>) {
        MoveOrchestrator::pause(self, ctx)
    }

    fn resume(&mut self, ctx: &mut MoveContext<'_>) {
        MoveOrchestrator::resume(self, ctx)
    }

    fn agent(&self) -> Entity {
        self.agent
    }
}

//! Tests for the move orchestrator state machine.
//!
//! Коллабораторы: инструментированные fakes (счётчики query, abort'ов,
//! observers) и mockall mocks для "никогда не вызывается" ожиданий.

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::HashMap;
    use std::f32::consts::FRAC_PI_2;

    use bevy::prelude::*;

    use super::super::{MoveContext, MoveNotification, MoveOrchestrator, MoveTask, OrchestratorState, Outcome};
    use crate::components::NavAgent;
    use crate::config::MoveToConfig;
    use crate::environment::{ActorQuery, MockReadinessProbe, ReadinessProbe};
    use crate::error::MoveTaskError;
    use crate::following::{FollowResult, FollowResultCode, FollowResultFlags, FollowerStatus, PathFollower, RequestId};
    use crate::navigation::{
        MockNavigationQueryService, NavDataId, NavPath, NavPathRef, NavigationQueryService, PathEvent, PathQuery,
        PathQueryOutcome, PathResult, PathUpdateKind,
    };
    use crate::request::{MoveRequest, NavFilterId};
    use crate::schedules::MoveTimers;

    const STEP: f32 = 1.0 / 60.0;

    fn agent() -> Entity {
        Entity::from_raw(1)
    }

    fn target() -> Entity {
        Entity::from_raw(2)
    }

    // ========================================================================
    // Fakes
    // ========================================================================

    struct FakeNavigation {
        projection_works: bool,
        has_nav_data: bool,
        outcome: PathQueryOutcome,
        partial: bool,
        build_query_calls: Cell<usize>,
        find_path_calls: usize,
        /// Observers на предыдущем path в момент каждого find_path
        observers_at_query: Vec<usize>,
        queries: Vec<PathQuery>,
        paths: Vec<NavPathRef>,
        repaths: Vec<PathUpdateKind>,
    }

    impl Default for FakeNavigation {
        fn default() -> Self {
            Self {
                projection_works: true,
                has_nav_data: true,
                outcome: PathQueryOutcome::Success,
                partial: false,
                build_query_calls: Cell::new(0),
                find_path_calls: 0,
                observers_at_query: Vec::new(),
                queries: Vec::new(),
                paths: Vec::new(),
                repaths: Vec::new(),
            }
        }
    }

    impl FakeNavigation {
        fn last_path(&self) -> NavPathRef {
            self.paths.last().cloned().expect("no path was planned")
        }
    }

    impl NavigationQueryService for FakeNavigation {
        fn project(&self, point: Vec3, _agent: &NavAgent) -> Option<Vec3> {
            self.projection_works.then_some(Vec3::new(point.x, 0.0, point.z))
        }

        fn build_query(
            &self,
            querier: Entity,
            agent: &NavAgent,
            goal: Vec3,
            filter: Option<NavFilterId>,
            allow_partial: bool,
            use_pathfinding: bool,
        ) -> Option<PathQuery> {
            self.build_query_calls.set(self.build_query_calls.get() + 1);
            let nav_data = if use_pathfinding {
                if !self.has_nav_data {
                    return None;
                }
                NavDataId(1)
            } else {
                NavDataId::ABSTRACT
            };

            Some(PathQuery {
                querier,
                nav_data,
                start: agent.location,
                goal,
                filter,
                allow_partial,
            })
        }

        fn find_path(&mut self, query: &PathQuery) -> PathResult {
            self.find_path_calls += 1;
            self.observers_at_query
                .push(self.paths.last().map_or(0, |path| path.observer_count()));
            self.queries.push(query.clone());

            match self.outcome {
                PathQueryOutcome::Success => {
                    let path = NavPathRef::new(NavPath::new(vec![query.start, query.goal], self.partial, query.clone()));
                    self.paths.push(path.clone());
                    PathResult::success(path)
                }
                PathQueryOutcome::Fail => PathResult::fail(),
                PathQueryOutcome::Error => PathResult::error(),
            }
        }

        fn request_repath(&mut self, _path: &NavPathRef, reason: PathUpdateKind) {
            self.repaths.push(reason);
        }
    }

    struct FakeFollower {
        next_id: u32,
        current: RequestId,
        status: FollowerStatus,
        reject: bool,
        requests: Vec<RequestId>,
        immediate: Vec<FollowResultCode>,
        aborts: Vec<(RequestId, FollowResultFlags)>,
        pauses: Vec<RequestId>,
        resumes: Vec<RequestId>,
    }

    impl Default for FakeFollower {
        fn default() -> Self {
            Self {
                next_id: 0,
                current: RequestId::INVALID,
                status: FollowerStatus::Idle,
                reject: false,
                requests: Vec::new(),
                immediate: Vec::new(),
                aborts: Vec::new(),
                pauses: Vec::new(),
                resumes: Vec::new(),
            }
        }
    }

    impl FakeFollower {
        fn issue(&mut self) -> RequestId {
            self.next_id += 1;
            self.current = RequestId(self.next_id);
            self.current
        }
    }

    impl PathFollower for FakeFollower {
        fn status(&self, _agent: Entity) -> FollowerStatus {
            self.status
        }

        fn current_request_id(&self, _agent: Entity) -> RequestId {
            self.current
        }

        fn request_move(&mut self, _agent: Entity, _request: &MoveRequest, _path: NavPathRef) -> RequestId {
            if self.reject {
                return RequestId::INVALID;
            }
            let id = self.issue();
            self.status = FollowerStatus::Moving;
            self.requests.push(id);
            id
        }

        fn request_immediate_finish(&mut self, _agent: Entity, code: FollowResultCode) -> RequestId {
            self.status = FollowerStatus::Idle;
            self.immediate.push(code);
            self.issue()
        }

        fn abort(&mut self, _agent: Entity, request_id: RequestId, flags: FollowResultFlags) {
            self.aborts.push((request_id, flags));
            if request_id == self.current {
                self.status = FollowerStatus::Idle;
            }
        }

        fn pause(&mut self, _agent: Entity, request_id: RequestId) {
            self.pauses.push(request_id);
            if request_id == self.current {
                self.status = FollowerStatus::Paused;
            }
        }

        fn resume(&mut self, _agent: Entity, request_id: RequestId) -> bool {
            self.resumes.push(request_id);
            if request_id == self.current {
                self.status = FollowerStatus::Moving;
                return true;
            }
            false
        }
    }

    #[derive(Default)]
    struct FakeReadiness {
        postpone: bool,
    }

    impl ReadinessProbe for FakeReadiness {
        fn should_postpone_path_updates(&self, _agent: Entity) -> bool {
            self.postpone
        }
    }

    #[derive(Default)]
    struct StaticActors {
        agents: HashMap<Entity, NavAgent>,
        offsets: HashMap<Entity, Vec3>,
    }

    impl ActorQuery for StaticActors {
        fn nav_agent(&self, entity: Entity) -> Option<NavAgent> {
            self.agents.get(&entity).copied()
        }

        fn move_goal_offset(&self, goal: Entity, _mover: Entity) -> Vec3 {
            self.offsets.get(&goal).copied().unwrap_or(Vec3::ZERO)
        }
    }

    struct Harness {
        navigation: FakeNavigation,
        follower: FakeFollower,
        timers: MoveTimers,
        readiness: FakeReadiness,
        actors: StaticActors,
    }

    impl Harness {
        fn new() -> Self {
            let mut actors = StaticActors::default();
            actors.agents.insert(agent(), NavAgent::at(Vec3::ZERO));
            actors.agents.insert(target(), NavAgent::at(Vec3::new(6.0, 0.0, 0.0)));

            Self {
                navigation: FakeNavigation::default(),
                follower: FakeFollower::default(),
                timers: MoveTimers::default(),
                readiness: FakeReadiness::default(),
                actors,
            }
        }

        fn ctx(&mut self) -> MoveContext<'_> {
            MoveContext {
                navigation: &mut self.navigation,
                follower: &mut self.follower,
                scheduler: &mut self.timers,
                readiness: &self.readiness,
                actors: &self.actors,
            }
        }

        /// Продвинуть время и доставить сработавшие таймеры
        fn advance(&mut self, orchestrator: &mut MoveOrchestrator, secs: f32) {
            let steps = (secs / STEP).ceil() as usize;
            for _ in 0..steps {
                self.tick(orchestrator);
            }
        }

        fn tick(&mut self, orchestrator: &mut MoveOrchestrator) {
            self.timers.advance(STEP);
            for fired in self.timers.take_fired() {
                if fired.owner == orchestrator.agent() {
                    orchestrator.on_timer(&mut self.ctx(), fired.handle);
                }
            }
        }

        /// Follower заканчивает текущий request
        fn finish_current(&mut self, orchestrator: &mut MoveOrchestrator, code: FollowResultCode) {
            let id = self.follower.current;
            self.follower.status = FollowerStatus::Idle;
            orchestrator.on_request_finished(&mut self.ctx(), id, FollowResult::new(code, FollowResultFlags::NONE));
        }

        fn emit(&mut self, orchestrator: &mut MoveOrchestrator, event: PathEvent) {
            self.navigation.last_path().broadcast(event);
            orchestrator.poll_path_events(&mut self.ctx());
        }
    }

    fn orchestrator(request: MoveRequest) -> MoveOrchestrator {
        MoveOrchestrator::new(agent(), request, &MoveToConfig::default())
    }

    fn far_point() -> MoveRequest {
        MoveRequest::to_location(Vec3::new(10.0, 0.0, 0.0))
    }

    fn started(h: &mut Harness, request: MoveRequest) -> MoveOrchestrator {
        let mut orchestrator = orchestrator(request.clone());
        orchestrator.start(&mut h.ctx(), request).expect("start failed");
        orchestrator
    }

    // ========================================================================
    // Reachability short-circuit
    // ========================================================================

    #[test]
    fn test_already_at_goal_never_plans() {
        let mut h = Harness::new();
        let mut navigation = MockNavigationQueryService::new();
        navigation.expect_project().returning(|point, _| Some(point));
        navigation.expect_build_query().never();
        navigation.expect_find_path().never();
        navigation.expect_request_repath().never();

        let request = MoveRequest::to_location(Vec3::new(0.3, 0.0, 0.0));
        let mut orchestrator = orchestrator(request.clone());
        let mut ctx = MoveContext {
            navigation: &mut navigation,
            follower: &mut h.follower,
            scheduler: &mut h.timers,
            readiness: &h.readiness,
            actors: &h.actors,
        };
        orchestrator.start(&mut ctx, request).unwrap();

        assert_eq!(orchestrator.state(), OrchestratorState::Finished);
        assert!(orchestrator.was_move_successful());
        assert_eq!(
            orchestrator.drain_notifications(),
            vec![MoveNotification::Completed {
                outcome: Outcome::Success,
                partial: false
            }]
        );
        assert_eq!(h.follower.immediate, vec![FollowResultCode::Success]);
        assert!(h.follower.aborts.is_empty());
        assert_eq!(orchestrator.outstanding_timer_count(), 0);
    }

    #[test]
    fn test_already_at_goal_uses_projected_location() {
        let mut h = Harness::new();
        // Над агентом на 3м: после проекции на пол: уже на месте
        let request = MoveRequest::to_location(Vec3::new(0.2, 3.0, 0.0));
        let mut orchestrator = started(&mut h, request);

        assert!(orchestrator.was_move_successful());
        assert_eq!(orchestrator.request().goal_location(), Some(Vec3::new(0.2, 0.0, 0.0)));
        assert_eq!(h.navigation.find_path_calls, 0);
        assert_eq!(orchestrator.drain_notifications().len(), 1);
    }

    // ========================================================================
    // Readiness
    // ========================================================================

    #[test]
    fn test_postponed_start_waits_for_readiness() {
        let mut h = Harness::new();
        h.readiness.postpone = true;
        let mut orchestrator = started(&mut h, far_point());

        assert_eq!(orchestrator.state(), OrchestratorState::AwaitingReadiness);
        for _ in 0..60 {
            h.tick(&mut orchestrator);
            assert_eq!(h.navigation.find_path_calls, 0);
            assert_eq!(h.navigation.build_query_calls.get(), 0);
            assert_eq!(orchestrator.outstanding_timer_count(), 1);
            assert_eq!(h.timers.outstanding_for(agent()), 1);
        }

        h.readiness.postpone = false;
        h.advance(&mut orchestrator, 0.25);

        assert_eq!(orchestrator.state(), OrchestratorState::Following);
        assert_eq!(h.navigation.find_path_calls, 1);
        assert_eq!(orchestrator.outstanding_timer_count(), 0);
    }

    #[test]
    fn test_postponed_start_never_queries_planner() {
        let mut navigation = MockNavigationQueryService::new();
        navigation.expect_project().returning(|point, _| Some(point));
        navigation.expect_build_query().never();
        navigation.expect_find_path().never();

        let mut readiness = MockReadinessProbe::new();
        readiness.expect_should_postpone_path_updates().return_const(true);

        let mut follower = FakeFollower::default();
        let mut timers = MoveTimers::default();
        let actors = Harness::new().actors;

        let request = far_point();
        let mut orchestrator = orchestrator(request.clone());
        {
            let mut ctx = MoveContext {
                navigation: &mut navigation,
                follower: &mut follower,
                scheduler: &mut timers,
                readiness: &readiness,
                actors: &actors,
            };
            orchestrator.start(&mut ctx, request).unwrap();
        }
        assert_eq!(orchestrator.state(), OrchestratorState::AwaitingReadiness);

        for _ in 0..120 {
            timers.advance(STEP);
            let fired = timers.take_fired();
            let mut ctx = MoveContext {
                navigation: &mut navigation,
                follower: &mut follower,
                scheduler: &mut timers,
                readiness: &readiness,
                actors: &actors,
            };
            for timer in fired {
                orchestrator.on_timer(&mut ctx, timer.handle);
            }
            assert_eq!(orchestrator.outstanding_timer_count(), 1);
        }
        assert_eq!(timers.outstanding_for(agent()), 1);
    }

    #[test]
    fn test_pathfinding_disabled_ignores_readiness() {
        let mut h = Harness::new();
        h.readiness.postpone = true;
        let orchestrator = started(&mut h, far_point().with_use_pathfinding(false));

        assert_eq!(orchestrator.state(), OrchestratorState::Following);
        assert_eq!(h.navigation.queries[0].nav_data, NavDataId::ABSTRACT);
    }

    #[test]
    fn test_readiness_cap_fails_move() {
        let mut h = Harness::new();
        h.readiness.postpone = true;
        let config = MoveToConfig {
            max_readiness_retries: Some(2),
            ..Default::default()
        };
        let mut orchestrator = MoveOrchestrator::new(agent(), far_point(), &config);
        orchestrator.start(&mut h.ctx(), far_point()).unwrap();

        h.advance(&mut orchestrator, 1.0);

        assert_eq!(orchestrator.state(), OrchestratorState::Finished);
        assert_eq!(
            orchestrator.drain_notifications(),
            vec![MoveNotification::Completed {
                outcome: Outcome::Failed,
                partial: false
            }]
        );
        assert_eq!(h.timers.outstanding_for(agent()), 0);
    }

    // ========================================================================
    // Supersession & stale callbacks
    // ========================================================================

    #[test]
    fn test_new_attempt_detaches_previous_observer_first() {
        let mut h = Harness::new();
        let mut orchestrator = started(&mut h, MoveRequest::to_entity(target()));
        let first_id = orchestrator.request_id();
        let first_path = h.navigation.last_path();
        assert_eq!(first_path.observer_count(), 1);
        assert!(first_path.with(|p| p.goal_observation()).is_some());

        orchestrator.start(&mut h.ctx(), far_point()).unwrap();

        // На момент второго find_path старый observer уже снят
        assert_eq!(h.navigation.observers_at_query, vec![0, 0]);
        assert_eq!(first_path.observer_count(), 0);
        assert!(first_path.with(|p| p.goal_observation()).is_none());
        assert_eq!(
            h.follower.aborts,
            vec![(first_id, FollowResultFlags::USER_ABORT | FollowResultFlags::NEW_REQUEST)]
        );
        assert_ne!(orchestrator.request_id(), first_id);
        assert!(orchestrator.request_id().is_valid());
    }

    #[test]
    fn test_stale_request_id_is_ignored() {
        let mut h = Harness::new();
        let mut orchestrator = started(&mut h, far_point());
        let current = orchestrator.request_id();

        orchestrator.on_request_finished(&mut h.ctx(), RequestId(999), FollowResult::success());

        assert_eq!(orchestrator.state(), OrchestratorState::Following);
        assert_eq!(orchestrator.request_id(), current);
        assert!(orchestrator.drain_notifications().is_empty());
    }

    #[test]
    fn test_superseded_request_finish_is_ignored() {
        let mut h = Harness::new();
        let mut orchestrator = started(&mut h, far_point());
        let first_id = orchestrator.request_id();

        orchestrator.restart(&mut h.ctx()).unwrap();
        orchestrator.on_request_finished(&mut h.ctx(), first_id, FollowResult::success());

        assert_eq!(orchestrator.state(), OrchestratorState::Following);
        assert!(orchestrator.drain_notifications().is_empty());
    }

    #[test]
    fn test_replaced_by_new_request_is_ignored() {
        let mut h = Harness::new();
        let mut orchestrator = started(&mut h, far_point());
        let id = orchestrator.request_id();

        orchestrator.on_request_finished(
            &mut h.ctx(),
            id,
            FollowResult::new(
                FollowResultCode::Aborted,
                FollowResultFlags::USER_ABORT | FollowResultFlags::NEW_REQUEST,
            ),
        );

        assert_eq!(orchestrator.state(), OrchestratorState::Following);
        assert_eq!(orchestrator.request_id(), id);
        assert!(orchestrator.drain_notifications().is_empty());
    }

    // ========================================================================
    // Follower results
    // ========================================================================

    #[test]
    fn test_follower_success_completes() {
        let mut h = Harness::new();
        let mut orchestrator = started(&mut h, far_point());

        h.finish_current(&mut orchestrator, FollowResultCode::Success);

        assert_eq!(
            orchestrator.drain_notifications(),
            vec![MoveNotification::Completed {
                outcome: Outcome::Success,
                partial: false
            }]
        );
        assert!(h.follower.aborts.is_empty());
        assert!(orchestrator.path().is_none());
        assert_eq!(h.navigation.last_path().observer_count(), 0);
    }

    #[test]
    fn test_follower_codes_map_to_outcomes() {
        let cases = [
            (FollowResultCode::Blocked, MoveNotification::Completed { outcome: Outcome::Failed, partial: false }),
            (FollowResultCode::OffPath, MoveNotification::Completed { outcome: Outcome::Failed, partial: false }),
            (FollowResultCode::Aborted, MoveNotification::Completed { outcome: Outcome::Aborted, partial: false }),
            (FollowResultCode::Invalid, MoveNotification::Failed),
        ];

        for (code, expected) in cases {
            let mut h = Harness::new();
            let mut orchestrator = started(&mut h, far_point());
            h.finish_current(&mut orchestrator, code);
            assert_eq!(orchestrator.drain_notifications(), vec![expected], "code {:?}", code);
        }
    }

    #[test]
    fn test_partial_path_reported_on_completion() {
        let mut h = Harness::new();
        h.navigation.partial = true;
        let mut orchestrator = started(&mut h, far_point());

        h.finish_current(&mut orchestrator, FollowResultCode::Success);

        assert!(orchestrator.was_move_partial());
        assert_eq!(
            orchestrator.drain_notifications(),
            vec![MoveNotification::Completed {
                outcome: Outcome::Success,
                partial: true
            }]
        );
    }

    // ========================================================================
    // Continuous tracking
    // ========================================================================

    #[test]
    fn test_continuous_tracking_loops_on_success() {
        let mut h = Harness::new();
        let request = MoveRequest::to_entity(target());
        let mut orchestrator = orchestrator(request.clone());
        orchestrator.set_continuous_tracking(true);
        orchestrator.start(&mut h.ctx(), request).unwrap();

        for round in 1..=3 {
            h.finish_current(&mut orchestrator, FollowResultCode::Success);
            assert_eq!(orchestrator.state(), OrchestratorState::Following);
            assert_eq!(orchestrator.outstanding_timer_count(), 1);
            assert_eq!(h.navigation.find_path_calls, round);

            // Restart: только на следующем тике
            h.tick(&mut orchestrator);
            assert_eq!(h.navigation.find_path_calls, round + 1);
        }

        assert_eq!(h.follower.requests.len(), 4);
        assert!(orchestrator.drain_notifications().is_empty());

        orchestrator.stop(&mut h.ctx());
        assert_eq!(
            orchestrator.drain_notifications(),
            vec![MoveNotification::Completed {
                outcome: Outcome::Aborted,
                partial: false
            }]
        );
    }

    #[test]
    fn test_continuous_tracking_ends_on_planning_failure() {
        let mut h = Harness::new();
        let request = MoveRequest::to_entity(target());
        let mut orchestrator = orchestrator(request.clone());
        orchestrator.set_continuous_tracking(true);
        orchestrator.start(&mut h.ctx(), request).unwrap();

        h.finish_current(&mut orchestrator, FollowResultCode::Success);
        h.navigation.outcome = PathQueryOutcome::Fail;
        h.tick(&mut orchestrator);

        assert_eq!(orchestrator.state(), OrchestratorState::Finished);
        assert_eq!(orchestrator.drain_notifications(), vec![MoveNotification::Failed]);
    }

    #[test]
    fn test_continuous_tracking_ends_when_goal_disappears() {
        let mut h = Harness::new();
        let request = MoveRequest::to_entity(target());
        let mut orchestrator = orchestrator(request.clone());
        orchestrator.set_continuous_tracking(true);
        orchestrator.start(&mut h.ctx(), request).unwrap();

        h.finish_current(&mut orchestrator, FollowResultCode::Success);
        h.actors.agents.remove(&target());
        h.tick(&mut orchestrator);

        assert_eq!(orchestrator.drain_notifications(), vec![MoveNotification::Failed]);
        assert_eq!(h.follower.immediate, vec![FollowResultCode::Invalid]);
    }

    #[test]
    fn test_continuous_tracking_does_not_loop_for_points() {
        let mut h = Harness::new();
        let mut orchestrator = orchestrator(far_point());
        orchestrator.set_continuous_tracking(true);
        orchestrator.start(&mut h.ctx(), far_point()).unwrap();

        h.finish_current(&mut orchestrator, FollowResultCode::Success);

        assert_eq!(orchestrator.state(), OrchestratorState::Finished);
        assert!(orchestrator.was_move_successful());
    }

    #[test]
    fn test_continuous_tracking_at_goal_restarts_every_tick() {
        let mut h = Harness::new();
        h.actors.agents.insert(target(), NavAgent::at(Vec3::new(0.5, 0.0, 0.0)));
        let request = MoveRequest::to_entity(target());
        let mut orchestrator = orchestrator(request.clone());
        orchestrator.set_continuous_tracking(true);
        orchestrator.start(&mut h.ctx(), request).unwrap();

        for _ in 0..5 {
            assert_eq!(orchestrator.outstanding_timer_count(), 1);
            h.tick(&mut orchestrator);
        }

        assert_eq!(h.follower.immediate.len(), 6);
        assert_eq!(h.navigation.find_path_calls, 0);
        assert!(orchestrator.drain_notifications().is_empty());
    }

    // ========================================================================
    // Pause / resume
    // ========================================================================

    #[test]
    fn test_resume_continues_same_request() {
        let mut h = Harness::new();
        let mut orchestrator = started(&mut h, far_point());
        let id = orchestrator.request_id();

        orchestrator.pause(&mut h.ctx());
        assert!(orchestrator.is_paused());
        orchestrator.resume(&mut h.ctx());

        assert_eq!(h.follower.pauses, vec![id]);
        assert_eq!(h.follower.resumes, vec![id]);
        assert_eq!(h.navigation.find_path_calls, 1);
        assert_eq!(orchestrator.request_id(), id);
        assert!(orchestrator.drain_notifications().is_empty());
    }

    #[test]
    fn test_resume_after_divergence_restarts_once() {
        let mut h = Harness::new();
        let mut orchestrator = started(&mut h, far_point());
        let id = orchestrator.request_id();

        orchestrator.pause(&mut h.ctx());
        // Кто-то другой занял follower
        h.follower.current = RequestId(77);
        orchestrator.resume(&mut h.ctx());

        assert!(h.follower.resumes.is_empty());
        assert_eq!(h.navigation.find_path_calls, 2);
        assert_eq!(orchestrator.state(), OrchestratorState::Following);
        assert_ne!(orchestrator.request_id(), id);
        assert_eq!(
            orchestrator.drain_notifications(),
            vec![MoveNotification::ResumedWithRestart { previous: id }]
        );
    }

    #[test]
    fn test_pause_cancels_retry_timers() {
        let mut h = Harness::new();
        h.readiness.postpone = true;
        let mut orchestrator = started(&mut h, far_point());
        assert_eq!(orchestrator.outstanding_timer_count(), 1);

        orchestrator.pause(&mut h.ctx());
        assert_eq!(orchestrator.outstanding_timer_count(), 0);
        assert_eq!(h.timers.outstanding_for(agent()), 0);
        assert!(h.follower.pauses.is_empty());

        h.readiness.postpone = false;
        orchestrator.resume(&mut h.ctx());

        // Request id не было: restart без диагностики
        assert_eq!(orchestrator.state(), OrchestratorState::Following);
        assert!(orchestrator.drain_notifications().is_empty());
    }

    #[test]
    fn test_resume_retries_pending_repath() {
        let mut h = Harness::new();
        let mut orchestrator = started(&mut h, far_point());
        h.readiness.postpone = true;
        h.emit(&mut orchestrator, PathEvent::Invalidated);
        assert_eq!(orchestrator.state(), OrchestratorState::RepathPending);

        orchestrator.pause(&mut h.ctx());
        h.readiness.postpone = false;
        orchestrator.resume(&mut h.ctx());

        assert_eq!(h.navigation.repaths, vec![PathUpdateKind::NavigationChanged]);
    }

    #[test]
    fn test_invalidation_while_paused_repaths_on_resume() {
        let mut h = Harness::new();
        let mut orchestrator = started(&mut h, far_point());
        let path = h.navigation.last_path();

        orchestrator.pause(&mut h.ctx());
        h.readiness.postpone = true;
        h.emit(&mut orchestrator, PathEvent::Invalidated);

        // На паузе таймеры не взводятся
        assert_eq!(orchestrator.state(), OrchestratorState::RepathPending);
        assert_eq!(orchestrator.outstanding_timer_count(), 0);
        assert_eq!(h.timers.outstanding_for(agent()), 0);
        h.advance(&mut orchestrator, 0.5);
        assert!(h.navigation.repaths.is_empty());

        h.readiness.postpone = false;
        orchestrator.resume(&mut h.ctx());
        assert_eq!(h.navigation.repaths, vec![PathUpdateKind::NavigationChanged]);

        path.with_mut(|p| p.set_points(vec![Vec3::ZERO, Vec3::new(10.0, 0.0, 1.0)], false));
        h.emit(&mut orchestrator, PathEvent::UpdatedDueToNavigationChanged);
        assert_eq!(orchestrator.state(), OrchestratorState::Following);
    }

    #[test]
    fn test_invalidation_while_paused_keeps_waiting_after_resume() {
        let mut h = Harness::new();
        let mut orchestrator = started(&mut h, far_point());

        orchestrator.pause(&mut h.ctx());
        h.readiness.postpone = true;
        h.emit(&mut orchestrator, PathEvent::Invalidated);
        orchestrator.resume(&mut h.ctx());

        // World всё ещё busy: обычный retry таймер
        assert!(h.navigation.repaths.is_empty());
        assert_eq!(orchestrator.outstanding_timer_count(), 1);
        assert_eq!(h.timers.outstanding_for(agent()), 1);

        h.readiness.postpone = false;
        h.advance(&mut orchestrator, 0.25);
        assert_eq!(h.navigation.repaths, vec![PathUpdateKind::NavigationChanged]);
        assert_eq!(orchestrator.outstanding_timer_count(), 0);
    }

    // ========================================================================
    // Path events
    // ========================================================================

    #[test]
    fn test_invalidated_path_requests_repath() {
        let mut h = Harness::new();
        let mut orchestrator = started(&mut h, far_point());
        let path = h.navigation.last_path();
        assert!(!path.with(|p| p.recalculates_on_invalidation()));

        h.emit(&mut orchestrator, PathEvent::Invalidated);

        assert_eq!(orchestrator.state(), OrchestratorState::RepathPending);
        assert!(path.with(|p| p.is_manual_repath_waiting()));
        assert_eq!(h.navigation.repaths, vec![PathUpdateKind::NavigationChanged]);

        path.with_mut(|p| p.set_points(vec![Vec3::ZERO, Vec3::new(10.0, 0.0, 1.0)], false));
        h.emit(&mut orchestrator, PathEvent::UpdatedDueToNavigationChanged);

        assert_eq!(orchestrator.state(), OrchestratorState::Following);
        assert!(orchestrator.drain_notifications().is_empty());
    }

    #[test]
    fn test_invalidated_path_waits_for_readiness() {
        let mut h = Harness::new();
        let mut orchestrator = started(&mut h, far_point());
        h.readiness.postpone = true;

        h.emit(&mut orchestrator, PathEvent::Invalidated);
        h.advance(&mut orchestrator, 0.5);
        assert!(h.navigation.repaths.is_empty());
        assert_eq!(orchestrator.outstanding_timer_count(), 1);

        h.readiness.postpone = false;
        h.advance(&mut orchestrator, 0.25);
        assert_eq!(h.navigation.repaths.len(), 1);
        assert_eq!(orchestrator.outstanding_timer_count(), 0);
    }

    #[test]
    fn test_repath_cap_fails_move() {
        let mut h = Harness::new();
        let config = MoveToConfig {
            max_repath_retries: Some(1),
            ..Default::default()
        };
        let mut orchestrator = MoveOrchestrator::new(agent(), far_point(), &config);
        orchestrator.start(&mut h.ctx(), far_point()).unwrap();
        h.readiness.postpone = true;

        h.emit(&mut orchestrator, PathEvent::Invalidated);
        h.advance(&mut orchestrator, 1.0);

        assert_eq!(
            orchestrator.drain_notifications(),
            vec![MoveNotification::Completed {
                outcome: Outcome::Failed,
                partial: false
            }]
        );
    }

    #[test]
    fn test_cleared_path_without_nav_data_aborts_repath() {
        let mut h = Harness::new();
        let mut orchestrator = started(&mut h, far_point());
        h.navigation.last_path().with_mut(|p| p.clear());

        h.emit(&mut orchestrator, PathEvent::Invalidated);

        assert!(h.navigation.repaths.is_empty());
        assert_eq!(orchestrator.move_result(), Some(Outcome::Aborted));
    }

    #[test]
    fn test_cleared_and_repath_failed_abort() {
        for event in [PathEvent::Cleared, PathEvent::RepathFailed] {
            let mut h = Harness::new();
            let mut orchestrator = started(&mut h, far_point());
            let id = orchestrator.request_id();

            h.emit(&mut orchestrator, event);

            assert_eq!(orchestrator.move_result(), Some(Outcome::Aborted), "event {:?}", event);
            // Follower ещё шёл: orchestrator сам абортит свой request
            assert_eq!(h.follower.aborts, vec![(id, FollowResultFlags::OWNER_FINISHED)]);
            assert!(!orchestrator.is_observing_path());
        }
    }

    #[test]
    fn test_disallowed_partial_update_aborts_in_any_state() {
        for invalidate_first in [false, true] {
            let mut h = Harness::new();
            let mut orchestrator = started(&mut h, far_point().with_allow_partial_path(false));
            let path = h.navigation.last_path();

            if invalidate_first {
                h.emit(&mut orchestrator, PathEvent::Invalidated);
                assert_eq!(orchestrator.state(), OrchestratorState::RepathPending);
            }

            path.with_mut(|p| p.set_points(vec![Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0)], true));
            h.emit(&mut orchestrator, PathEvent::UpdatedDueToGoalMoved);

            assert_eq!(
                orchestrator.drain_notifications(),
                vec![MoveNotification::Completed {
                    outcome: Outcome::Aborted,
                    partial: true
                }]
            );
        }
    }

    #[test]
    fn test_partial_path_rejected_at_planning() {
        let mut h = Harness::new();
        h.navigation.partial = true;
        let mut orchestrator = started(&mut h, far_point().with_allow_partial_path(false));

        assert_eq!(orchestrator.move_result(), Some(Outcome::Aborted));
        assert_eq!(h.follower.immediate, vec![FollowResultCode::Invalid]);
        assert!(h.follower.requests.is_empty());
        assert_eq!(orchestrator.drain_notifications().len(), 1);
    }

    #[test]
    fn test_meta_path_update_is_ignored() {
        let mut h = Harness::new();
        let mut orchestrator = started(&mut h, far_point());

        h.emit(&mut orchestrator, PathEvent::MetaPathUpdate);

        assert_eq!(orchestrator.state(), OrchestratorState::Following);
    }

    #[test]
    fn test_events_of_superseded_path_never_arrive() {
        let mut h = Harness::new();
        let mut orchestrator = started(&mut h, far_point());
        let old_path = h.navigation.last_path();

        orchestrator.restart(&mut h.ctx()).unwrap();
        old_path.broadcast(PathEvent::Cleared);
        orchestrator.poll_path_events(&mut h.ctx());

        assert_eq!(orchestrator.state(), OrchestratorState::Following);
    }

    // ========================================================================
    // Failures before following
    // ========================================================================

    #[test]
    fn test_failures_surface_on_failure_channel() {
        let setups: [(&str, fn(&mut Harness) -> MoveRequest); 6] = [
            ("projection", |h| {
                h.navigation.projection_works = false;
                far_point()
            }),
            ("nan goal", |_| MoveRequest::to_location(Vec3::new(f32::NAN, 0.0, 0.0))),
            ("missing goal entity", |_| MoveRequest::to_entity(Entity::from_raw(40))),
            ("no nav data", |h| {
                h.navigation.has_nav_data = false;
                far_point()
            }),
            ("planner error", |h| {
                h.navigation.outcome = PathQueryOutcome::Error;
                far_point()
            }),
            ("follower rejects", |h| {
                h.follower.reject = true;
                far_point()
            }),
        ];

        for (name, setup) in setups {
            let mut h = Harness::new();
            let request = setup(&mut h);
            let mut orchestrator = started(&mut h, request);

            assert_eq!(orchestrator.state(), OrchestratorState::Finished, "{}", name);
            assert_eq!(orchestrator.move_result(), Some(Outcome::Invalid), "{}", name);
            assert_eq!(orchestrator.drain_notifications(), vec![MoveNotification::Failed], "{}", name);
            assert_eq!(h.follower.immediate, vec![FollowResultCode::Invalid], "{}", name);
        }
    }

    #[test]
    fn test_unprojectable_goal_without_pathfinding_proceeds() {
        let mut h = Harness::new();
        h.navigation.projection_works = false;
        let orchestrator = started(&mut h, far_point().with_use_pathfinding(false));

        assert_eq!(orchestrator.state(), OrchestratorState::Following);
        assert_eq!(h.navigation.find_path_calls, 1);
    }

    #[test]
    fn test_missing_agent_is_invalid() {
        let mut h = Harness::new();
        h.actors.agents.remove(&agent());
        let mut orchestrator = started(&mut h, far_point());

        assert_eq!(orchestrator.drain_notifications(), vec![MoveNotification::Failed]);
    }

    // ========================================================================
    // Goal resolution
    // ========================================================================

    #[test]
    fn test_entity_goal_resolved_with_rotated_offset() {
        let mut h = Harness::new();
        h.actors.agents.insert(
            target(),
            NavAgent::at(Vec3::new(6.0, 0.0, 0.0)).with_rotation(Quat::from_rotation_y(FRAC_PI_2)),
        );
        h.actors.offsets.insert(target(), Vec3::new(2.0, 0.0, 0.0));

        let _orchestrator = started(&mut h, MoveRequest::to_entity(target()));

        let goal = h.navigation.queries[0].goal;
        let expected = Vec3::new(6.0, 0.0, -2.0);
        assert!(goal.abs_diff_eq(expected, 1e-4), "goal {:?}", goal);
    }

    #[test]
    fn test_entity_goal_recomputed_per_attempt() {
        let mut h = Harness::new();
        let mut orchestrator = started(&mut h, MoveRequest::to_entity(target()));

        h.actors.agents.insert(target(), NavAgent::at(Vec3::new(0.0, 0.0, 8.0)));
        orchestrator.restart(&mut h.ctx()).unwrap();

        assert_eq!(h.navigation.queries[0].goal, Vec3::new(6.0, 0.0, 0.0));
        assert_eq!(h.navigation.queries[1].goal, Vec3::new(0.0, 0.0, 8.0));
    }

    #[test]
    fn test_entity_path_observes_goal_with_tether() {
        let mut h = Harness::new();
        let _orchestrator = started(&mut h, MoveRequest::to_entity(target()));

        let observation = h.navigation.last_path().with(|p| p.goal_observation());
        assert_eq!(observation.map(|o| o.goal), Some(target()));
        assert_eq!(
            observation.map(|o| o.tether_distance),
            Some(MoveToConfig::default().goal_tether_distance)
        );
    }

    // ========================================================================
    // Stop / teardown
    // ========================================================================

    #[test]
    fn test_stop_aborts_and_notifies_once() {
        let mut h = Harness::new();
        let mut orchestrator = started(&mut h, far_point());
        let id = orchestrator.request_id();

        orchestrator.stop(&mut h.ctx());
        orchestrator.stop(&mut h.ctx());

        assert_eq!(h.follower.aborts, vec![(id, FollowResultFlags::USER_ABORT)]);
        assert_eq!(
            orchestrator.drain_notifications(),
            vec![MoveNotification::Completed {
                outcome: Outcome::Aborted,
                partial: false
            }]
        );
    }

    #[test]
    fn test_start_after_finish_is_rejected() {
        let mut h = Harness::new();
        let mut orchestrator = started(&mut h, far_point());
        orchestrator.stop(&mut h.ctx());

        assert_eq!(
            orchestrator.start(&mut h.ctx(), far_point()),
            Err(MoveTaskError::AlreadyFinished)
        );
        assert_eq!(orchestrator.restart(&mut h.ctx()), Err(MoveTaskError::AlreadyFinished));
    }

    #[test]
    fn test_teardown_releases_everything_in_every_state() {
        let scenarios: [(&str, fn(&mut Harness, &mut MoveOrchestrator)); 4] = [
            ("awaiting readiness", |h, o| {
                h.readiness.postpone = true;
                o.start(&mut h.ctx(), far_point()).unwrap();
            }),
            ("following", |h, o| {
                o.start(&mut h.ctx(), far_point()).unwrap();
            }),
            ("repath pending", |h, o| {
                o.start(&mut h.ctx(), far_point()).unwrap();
                h.readiness.postpone = true;
                h.emit(o, PathEvent::Invalidated);
            }),
            ("restart pending", |h, o| {
                o.set_continuous_tracking(true);
                o.start(&mut h.ctx(), MoveRequest::to_entity(target())).unwrap();
                h.finish_current(o, FollowResultCode::Success);
            }),
        ];

        for (name, setup) in scenarios {
            let mut h = Harness::new();
            let mut orchestrator = orchestrator(far_point());
            setup(&mut h, &mut orchestrator);
            assert!(orchestrator.is_active(), "{}", name);

            orchestrator.teardown(&mut h.ctx());

            assert_eq!(orchestrator.state(), OrchestratorState::Finished, "{}", name);
            assert_eq!(orchestrator.outstanding_timer_count(), 0, "{}", name);
            assert_eq!(h.timers.outstanding_for(agent()), 0, "{}", name);
            assert!(!orchestrator.is_observing_path(), "{}", name);
            assert!(!orchestrator.is_listening_to_follower(), "{}", name);
            assert!(orchestrator.path().is_none(), "{}", name);
            for path in &h.navigation.paths {
                assert_eq!(path.observer_count(), 0, "{}", name);
            }
            assert!(orchestrator.drain_notifications().is_empty(), "{}", name);
        }
    }

    #[test]
    fn test_teardown_aborts_live_request_as_owner() {
        let mut h = Harness::new();
        let mut orchestrator = started(&mut h, far_point());
        let id = orchestrator.request_id();

        orchestrator.teardown(&mut h.ctx());

        assert_eq!(h.follower.aborts, vec![(id, FollowResultFlags::OWNER_FINISHED)]);
        assert_eq!(h.navigation.last_path().holders(), 1);
    }

    #[test]
    fn test_move_task_capability_interface() {
        let mut h = Harness::new();
        let mut orchestrator = orchestrator(far_point());
        let task: &mut dyn MoveTask = &mut orchestrator;

        task.start(&mut h.ctx(), far_point()).unwrap();
        task.pause(&mut h.ctx());
        task.resume(&mut h.ctx());
        task.stop(&mut h.ctx());

        assert_eq!(task.agent(), agent());
        assert_eq!(orchestrator.move_result(), Some(Outcome::Aborted));
    }
}

//! SandboxFollower: ведёт агента по точкам path'а с постоянной скоростью.

use bevy::prelude::*;
use std::collections::BTreeMap;

use crate::following::{FollowResult, FollowResultCode, FollowResultFlags, FollowerStatus, PathFollower, RequestId};
use crate::navigation::NavPathRef;
use crate::request::MoveRequest;
use crate::task::PathFollowingFinished;

/// Порог "точка достигнута"
const ARRIVAL_EPSILON: f32 = 0.01;

#[derive(Debug)]
struct FollowState {
    request_id: RequestId,
    status: FollowerStatus,
    path: Option<NavPathRef>,
    /// Копия точек path'а: изменились → repath, идём с начала
    points: Vec<Vec3>,
    next_point: usize,
    acceptance_radius: f32,
}

#[derive(Resource, Debug)]
pub struct SandboxFollower {
    /// Метров в секунду
    speed: f32,
    next_request_id: u32,
    agents: BTreeMap<Entity, FollowState>,
    outbox: Vec<PathFollowingFinished>,
}

impl Default for SandboxFollower {
    fn default() -> Self {
        Self::new(4.0)
    }
}

impl SandboxFollower {
    pub fn new(speed: f32) -> Self {
        Self {
            speed: speed.max(0.0),
            next_request_id: 1,
            agents: BTreeMap::new(),
            outbox: Vec::new(),
        }
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    fn allocate_id(&mut self) -> RequestId {
        let id = RequestId(self.next_request_id);
        self.next_request_id = self.next_request_id.wrapping_add(1).max(1);
        id
    }

    fn report(&mut self, agent: Entity, request_id: RequestId, result: FollowResult) {
        self.outbox.push(PathFollowingFinished {
            agent,
            request_id,
            result,
        });
    }

    /// Завершить текущий request агента (если живой)
    fn finish_current(&mut self, agent: Entity, code: FollowResultCode, flags: FollowResultFlags) {
        let Some(state) = self.agents.get_mut(&agent) else {
            return;
        };
        if state.status == FollowerStatus::Idle {
            return;
        }

        state.status = FollowerStatus::Idle;
        state.path = None;
        let request_id = state.request_id;
        self.report(agent, request_id, FollowResult::new(code, flags));
    }

    /// Результаты, накопленные с прошлого drain'а
    pub fn drain_finished(&mut self) -> Vec<PathFollowingFinished> {
        std::mem::take(&mut self.outbox)
    }

    /// Продвинуть всех движущихся агентов на `delta` секунд.
    ///
    /// Возвращает новые позиции агентов; применяет их вызывающий.
    pub fn advance(&mut self, delta: f32, locate: impl Fn(Entity) -> Option<Vec3>) -> Vec<(Entity, Vec3)> {
        let mut moved = Vec::new();
        let mut finished = Vec::new();

        for (&agent, state) in self.agents.iter_mut() {
            if state.status != FollowerStatus::Moving && state.status != FollowerStatus::Waiting {
                continue;
            }
            let Some(path) = state.path.clone() else {
                continue;
            };
            let Some(mut location) = locate(agent) else {
                continue;
            };

            let (waiting, valid, points) = path.with(|p| (p.is_manual_repath_waiting(), p.is_valid(), p.points().to_vec()));

            // Orchestrator ждёт repath: стоим на месте
            if waiting {
                state.status = FollowerStatus::Waiting;
                continue;
            }
            state.status = FollowerStatus::Moving;

            if !valid {
                finished.push((agent, FollowResultCode::Aborted, FollowResultFlags::INVALID_PATH));
                continue;
            }

            if points != state.points {
                state.points = points;
                state.next_point = 1.min(state.points.len() - 1);
            }

            let mut budget = self.speed * delta;
            while budget > 0.0 && state.next_point < state.points.len() {
                let target = state.points[state.next_point];
                let to_target = target - location;
                let distance = to_target.length();

                if distance <= budget {
                    location = target;
                    budget -= distance;
                    state.next_point += 1;
                } else {
                    location += to_target / distance * budget;
                    budget = 0.0;
                }
            }
            moved.push((agent, location));

            let end = state.points[state.points.len() - 1];
            let arrived = state.next_point >= state.points.len()
                || location.distance(end) <= ARRIVAL_EPSILON
                || Vec2::new(location.x - end.x, location.z - end.z).length() <= state.acceptance_radius;
            if arrived {
                finished.push((agent, FollowResultCode::Success, FollowResultFlags::NONE));
            }
        }

        for (agent, code, flags) in finished {
            self.finish_current(agent, code, flags);
        }
        moved
    }
}

impl PathFollower for SandboxFollower {
    fn status(&self, agent: Entity) -> FollowerStatus {
        self.agents.get(&agent).map_or(FollowerStatus::Idle, |state| state.status)
    }

    fn current_request_id(&self, agent: Entity) -> RequestId {
        self.agents.get(&agent).map_or(RequestId::INVALID, |state| state.request_id)
    }

    fn request_move(&mut self, agent: Entity, request: &MoveRequest, path: NavPathRef) -> RequestId {
        if !path.is_valid() {
            return RequestId::INVALID;
        }

        self.finish_current(
            agent,
            FollowResultCode::Aborted,
            FollowResultFlags::USER_ABORT | FollowResultFlags::NEW_REQUEST,
        );

        let request_id = self.allocate_id();
        let points = path.with(|p| p.points().to_vec());
        self.agents.insert(
            agent,
            FollowState {
                request_id,
                status: FollowerStatus::Moving,
                path: Some(path),
                next_point: 1.min(points.len() - 1),
                points,
                acceptance_radius: request.acceptance_radius(),
            },
        );
        request_id
    }

    fn request_immediate_finish(&mut self, agent: Entity, code: FollowResultCode) -> RequestId {
        self.finish_current(
            agent,
            FollowResultCode::Aborted,
            FollowResultFlags::USER_ABORT | FollowResultFlags::NEW_REQUEST,
        );

        let request_id = self.allocate_id();
        self.agents.insert(
            agent,
            FollowState {
                request_id,
                status: FollowerStatus::Idle,
                path: None,
                points: Vec::new(),
                next_point: 0,
                acceptance_radius: 0.0,
            },
        );

        let flags = if code == FollowResultCode::Success {
            FollowResultFlags::ALREADY_AT_GOAL
        } else {
            FollowResultFlags::NONE
        };
        self.report(agent, request_id, FollowResult::new(code, flags));
        request_id
    }

    fn abort(&mut self, agent: Entity, request_id: RequestId, flags: FollowResultFlags) {
        if !self.current_request_id(agent).matches(request_id) {
            return;
        }
        self.finish_current(agent, FollowResultCode::Aborted, FollowResultFlags::USER_ABORT | flags);
    }

    fn pause(&mut self, agent: Entity, request_id: RequestId) {
        if let Some(state) = self.agents.get_mut(&agent) {
            let live = matches!(state.status, FollowerStatus::Moving | FollowerStatus::Waiting);
            if state.request_id.matches(request_id) && live {
                state.status = FollowerStatus::Paused;
            }
        }
    }

    fn resume(&mut self, agent: Entity, request_id: RequestId) -> bool {
        let Some(state) = self.agents.get_mut(&agent) else {
            return false;
        };
        if !state.request_id.matches(request_id) {
            return false;
        }
        if state.status == FollowerStatus::Paused {
            state.status = FollowerStatus::Moving;
        }
        state.status != FollowerStatus::Idle
    }
}

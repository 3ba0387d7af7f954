//! SandboxNavigation: прямоугольная walkable область без препятствий.
//!
//! Не pathfinding: path: прямой отрезок. Достаточно, чтобы прогнать
//! lifecycle (partial paths, invalidation, repath, goal moved).

use bevy::prelude::*;

use crate::components::NavAgent;
use crate::navigation::{
    NavDataId, NavPath, NavPathRef, NavigationQueryService, PathEvent, PathQuery, PathResult, PathUpdateKind,
};
use crate::request::NavFilterId;

/// NavDataId sandbox navmesh'а
pub const SANDBOX_NAV_DATA: NavDataId = NavDataId(1);

#[derive(Debug)]
struct LivePath {
    path: NavPathRef,
    /// Позиция goal entity при последнем planning (для goal observation)
    goal_anchor: Option<Vec3>,
}

#[derive(Resource, Debug)]
pub struct SandboxNavigation {
    /// Walkable область в XZ
    min: Vec2,
    max: Vec2,
    floor: f32,
    /// Насколько точка может быть вне области и всё ещё спроецироваться
    projection_extent: f32,
    /// Есть ли navmesh (abstract navigation есть всегда)
    has_nav_data: bool,
    /// false: repath'ы проваливаются
    available: bool,
    live_paths: Vec<LivePath>,
    pending_repaths: Vec<(NavPathRef, PathUpdateKind)>,
    query_count: usize,
}

impl Default for SandboxNavigation {
    fn default() -> Self {
        Self::new(Vec2::splat(-50.0), Vec2::splat(50.0))
    }
}

impl SandboxNavigation {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
            floor: 0.0,
            projection_extent: 2.0,
            has_nav_data: true,
            available: true,
            live_paths: Vec::new(),
            pending_repaths: Vec::new(),
            query_count: 0,
        }
    }

    pub fn contains(&self, point: Vec3) -> bool {
        let xz = Vec2::new(point.x, point.z);
        xz.cmpge(self.min).all() && xz.cmple(self.max).all()
    }

    /// Ближайшая точка области (на полу)
    pub fn clamp(&self, point: Vec3) -> Vec3 {
        let xz = Vec2::new(point.x, point.z).clamp(self.min, self.max);
        Vec3::new(xz.x, self.floor, xz.y)
    }

    pub fn set_has_nav_data(&mut self, has_nav_data: bool) {
        self.has_nav_data = has_nav_data;
    }

    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    pub fn query_count(&self) -> usize {
        self.query_count
    }

    /// Сколько path'ов ещё кем-то удерживаются
    pub fn live_path_count(&self) -> usize {
        self.live_paths.len()
    }

    /// Navigation поменялась: все живые path'ы инвалидированы
    pub fn invalidate_paths(&mut self) {
        self.prune();
        for live in &self.live_paths {
            live.path.broadcast(PathEvent::Invalidated);
        }
        crate::log(&format!("🗺️ SandboxNavigation: invalidated {} paths", self.live_paths.len()));
    }

    fn straight_path(&self, query: &PathQuery) -> Option<(Vec<Vec3>, bool)> {
        if query.nav_data.is_abstract() {
            return Some((vec![query.start, query.goal], false));
        }

        if self.contains(query.goal) {
            Some((vec![query.start, Vec3::new(query.goal.x, self.floor, query.goal.z)], false))
        } else if query.allow_partial {
            Some((vec![query.start, self.clamp(query.goal)], true))
        } else {
            None
        }
    }

    /// Path'ы, которые держит только sandbox, больше никому не нужны
    fn prune(&mut self) {
        self.live_paths.retain(|live| live.path.holders() > 1);
    }

    /// Шаг backend'а: отложенные repath'ы и goal observation
    ///
    /// `locate`: текущая позиция entity (агент / goal).
    pub fn step(&mut self, locate: impl Fn(Entity) -> Option<Vec3>) {
        self.prune();

        for (path, reason) in std::mem::take(&mut self.pending_repaths) {
            if !self.available {
                crate::log("🗺️ SandboxNavigation: repath failed (navigation unavailable)");
                path.broadcast(PathEvent::RepathFailed);
                continue;
            }
            self.recompute(&path, &locate, reason);
        }

        let mut moved_goals = Vec::new();
        for live in &mut self.live_paths {
            let Some(observation) = live.path.with(|p| p.goal_observation()) else {
                live.goal_anchor = None;
                continue;
            };
            let Some(anchor) = locate(observation.goal) else {
                continue;
            };

            match live.goal_anchor {
                None => live.goal_anchor = Some(anchor),
                Some(previous) if previous.distance(anchor) > observation.tether_distance => {
                    let shift = anchor - previous;
                    live.path.with_mut(|p| {
                        let goal = p.query().goal + shift;
                        p.set_goal(goal);
                    });
                    live.goal_anchor = Some(anchor);
                    moved_goals.push(live.path.clone());
                }
                Some(_) => {}
            }
        }

        for path in moved_goals {
            self.recompute(&path, &locate, PathUpdateKind::GoalMoved);
        }
    }

    fn recompute(&self, path: &NavPathRef, locate: &impl Fn(Entity) -> Option<Vec3>, reason: PathUpdateKind) {
        let mut query = path.with(|p| p.query().clone());
        if let Some(start) = locate(query.querier) {
            query.start = start;
        }

        match self.straight_path(&query) {
            Some((points, partial)) => {
                path.with_mut(|p| p.set_points(points, partial));
                path.broadcast(match reason {
                    PathUpdateKind::NavigationChanged => PathEvent::UpdatedDueToNavigationChanged,
                    PathUpdateKind::GoalMoved => PathEvent::UpdatedDueToGoalMoved,
                });
            }
            None => path.broadcast(PathEvent::RepathFailed),
        }
    }
}

impl NavigationQueryService for SandboxNavigation {
    fn project(&self, point: Vec3, agent: &NavAgent) -> Option<Vec3> {
        let snapped = self.clamp(point);
        let horizontal = Vec2::new(point.x - snapped.x, point.z - snapped.z).length();
        let vertical = (point.y - self.floor).abs();

        (horizontal <= self.projection_extent && vertical <= agent.height * 2.0).then_some(snapped)
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
        let nav_data = if !use_pathfinding {
            NavDataId::ABSTRACT
        } else if self.has_nav_data {
            SANDBOX_NAV_DATA
        } else {
            return None;
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
        self.query_count += 1;

        let Some((points, partial)) = self.straight_path(query) else {
            return PathResult::fail();
        };

        let path = NavPathRef::new(NavPath::new(points, partial, query.clone()));
        self.live_paths.push(LivePath {
            path: path.clone(),
            goal_anchor: None,
        });
        PathResult::success(path)
    }

    fn request_repath(&mut self, path: &NavPathRef, reason: PathUpdateKind) {
        self.pending_repaths.push((path.clone(), reason));
    }
}

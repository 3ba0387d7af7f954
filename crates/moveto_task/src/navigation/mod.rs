//! Navigation domain: внешний planner и наблюдаемый path.
//!
//! # Architecture
//!
//! Сам pathfinding (геометрия, navmesh): внешний коллаборатор.
//! Orchestrator видит его только через `NavigationQueryService`:
//! - **project**: goal → ближайшая walkable точка
//! - **build_query**: выбор navigation data (navmesh или abstract) + query
//! - **find_path**: синхронный поиск, результат: `NavPathRef`
//! - **request_repath**: пересчёт существующего path in-place (асинхронно,
//!   результат приходит событием `PathEvent` через observer path'а)

use bevy::prelude::*;

use crate::components::NavAgent;
use crate::request::NavFilterId;

pub mod path;


pub use path::*;

/// Идентификатор navigation data, на которой построен path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NavDataId(pub u32);

impl NavDataId {
    /// Abstract navigation: прямой отрезок, без navmesh.
    /// Используется requests с `use_pathfinding = false` (reachability всё равно считается).
    pub const ABSTRACT: NavDataId = NavDataId(0);

    pub fn is_abstract(&self) -> bool {
        *self == Self::ABSTRACT
    }
}

/// Pathfinding query (snapshot на момент запроса)
#[derive(Debug, Clone, PartialEq)]
pub struct PathQuery {
    /// Кто спрашивает (агент)
    pub querier: Entity,
    pub nav_data: NavDataId,
    pub start: Vec3,
    pub goal: Vec3,
    pub filter: Option<NavFilterId>,
    pub allow_partial: bool,
}

/// Результат поиска
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathQueryOutcome {
    Success,
    /// Path не найден
    Fail,
    /// Planner сломался (невалидная query, нет данных)
    Error,
}

#[derive(Debug, Clone)]
pub struct PathResult {
    pub outcome: PathQueryOutcome,
    pub path: Option<NavPathRef>,
}

impl PathResult {
    pub fn success(path: NavPathRef) -> Self {
        Self {
            outcome: PathQueryOutcome::Success,
            path: Some(path),
        }
    }

    pub fn fail() -> Self {
        Self {
            outcome: PathQueryOutcome::Fail,
            path: None,
        }
    }

    pub fn error() -> Self {
        Self {
            outcome: PathQueryOutcome::Error,
            path: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == PathQueryOutcome::Success && self.path.is_some()
    }

    pub fn is_partial(&self) -> bool {
        self.path.as_ref().is_some_and(|path| path.is_partial())
    }
}

/// Почему path перепланируется
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathUpdateKind {
    NavigationChanged,
    GoalMoved,
}

/// Внешний planner (navmesh, grid, abstract)
#[cfg_attr(test, mockall::automock)]
pub trait NavigationQueryService {
    /// Проекция точки на walkable поверхность для данного агента
    fn project(&self, point: Vec3, agent: &NavAgent) -> Option<Vec3>;

    /// Собрать query. `None`: нет navigation data для агента.
    /// `use_pathfinding = false` должен давать query на abstract navigation.
    fn build_query(
        &self,
        querier: Entity,
        agent: &NavAgent,
        goal: Vec3,
        filter: Option<NavFilterId>,
        allow_partial: bool,
        use_pathfinding: bool,
    ) -> Option<PathQuery>;

    /// Синхронный поиск path
    fn find_path(&mut self, query: &PathQuery) -> PathResult;

    /// Пересчитать path in-place. Результат: событие на path
    /// (`UpdatedDueToNavigationChanged` / `RepathFailed`).
    fn request_repath(&mut self, path: &NavPathRef, reason: PathUpdateKind);
}

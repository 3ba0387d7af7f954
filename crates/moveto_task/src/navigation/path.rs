//! Наблюдаемый navigation path (shared, reference-counted).
//!
//! Path одновременно держат orchestrator, follower и navigation backend.
//! Backend мутирует его (repath, goal moved, clear) и рассылает `PathEvent`;
//! каждый observer получает свою очередь событий и читает её через
//! `take_events(handle)`. Отписка удаляет очередь: stale события после
//! supersession физически не доходят.

use bevy::prelude::*;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{NavDataId, PathQuery};

/// События path'а
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathEvent {
    NewPath,
    /// Navigation под path'ом поменялась, path больше не валиден
    Invalidated,
    UpdatedDueToGoalMoved,
    UpdatedDueToNavigationChanged,
    /// Path очищен владельцем
    Cleared,
    RepathFailed,
    /// Обновление метаданных, геометрия не менялась
    MetaPathUpdate,
}

/// Handle подписки на события path'а
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathObserverHandle(pub u64);

/// Наблюдение за goal entity: backend перепланирует, когда цель уходит дальше tether
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalObservation {
    pub goal: Entity,
    pub tether_distance: f32,
}

#[derive(Debug)]
struct PathObserver {
    handle: PathObserverHandle,
    pending: VecDeque<PathEvent>,
}

#[derive(Debug)]
pub struct NavPath {
    points: Vec<Vec3>,
    partial: bool,
    query: PathQuery,
    /// Orchestrator сам управляет моментом repath → follower не должен бросать path
    manual_repath_waiting: bool,
    /// Backend сам перепланирует при Invalidated (orchestrator выключает)
    recalculate_on_invalidation: bool,
    goal_observation: Option<GoalObservation>,
    observers: Vec<PathObserver>,
    next_observer_id: u64,
}

impl NavPath {
    pub fn new(points: Vec<Vec3>, partial: bool, query: PathQuery) -> Self {
        Self {
            points,
            partial,
            query,
            manual_repath_waiting: false,
            recalculate_on_invalidation: false,
            goal_observation: None,
            observers: Vec::new(),
            next_observer_id: 1,
        }
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn end_location(&self) -> Option<Vec3> {
        self.points.last().copied()
    }

    pub fn is_partial(&self) -> bool {
        self.partial
    }

    pub fn is_valid(&self) -> bool {
        !self.points.is_empty()
    }

    pub fn query(&self) -> &PathQuery {
        &self.query
    }

    pub fn nav_data(&self) -> Option<NavDataId> {
        self.is_valid().then_some(self.query.nav_data)
    }

    /// Repath завершён: новая геометрия, флаг ожидания сбрасывается
    pub fn set_points(&mut self, points: Vec<Vec3>, partial: bool) {
        self.points = points;
        self.partial = partial;
        self.manual_repath_waiting = false;
    }

    pub fn set_goal(&mut self, goal: Vec3) {
        self.query.goal = goal;
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.manual_repath_waiting = false;
    }

    pub fn is_manual_repath_waiting(&self) -> bool {
        self.manual_repath_waiting
    }

    pub fn set_manual_repath_waiting(&mut self, waiting: bool) {
        self.manual_repath_waiting = waiting;
    }

    pub fn recalculates_on_invalidation(&self) -> bool {
        self.recalculate_on_invalidation
    }

    pub fn enable_recalculation_on_invalidation(&mut self, enable: bool) {
        self.recalculate_on_invalidation = enable;
    }

    pub fn goal_observation(&self) -> Option<GoalObservation> {
        self.goal_observation
    }

    pub fn set_goal_observation(&mut self, goal: Entity, tether_distance: f32) {
        self.goal_observation = Some(GoalObservation { goal, tether_distance });
    }

    pub fn disable_goal_observation(&mut self) {
        self.goal_observation = None;
    }

    pub fn add_observer(&mut self) -> PathObserverHandle {
        let handle = PathObserverHandle(self.next_observer_id);
        self.next_observer_id += 1;
        self.observers.push(PathObserver {
            handle,
            pending: VecDeque::new(),
        });
        handle
    }

    /// false: handle уже не подписан
    pub fn remove_observer(&mut self, handle: PathObserverHandle) -> bool {
        let before = self.observers.len();
        self.observers.retain(|observer| observer.handle != handle);
        self.observers.len() != before
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Разослать событие всем текущим observers
    pub fn broadcast(&mut self, event: PathEvent) {
        for observer in &mut self.observers {
            observer.pending.push_back(event);
        }
    }

    /// Забрать накопленные события observer'а (в порядке поступления)
    pub fn take_events(&mut self, handle: PathObserverHandle) -> Vec<PathEvent> {
        self.observers
            .iter_mut()
            .find(|observer| observer.handle == handle)
            .map(|observer| observer.pending.drain(..).collect())
            .unwrap_or_default()
    }
}

/// Shared handle на path
///
/// Mutex: только ради `Send + Sync` для ECS компонентов; все мутации идут
/// с одного логического тика.
#[derive(Clone)]
pub struct NavPathRef(Arc<Mutex<NavPath>>);

impl NavPathRef {
    pub fn new(path: NavPath) -> Self {
        Self(Arc::new(Mutex::new(path)))
    }

    fn lock(&self) -> MutexGuard<'_, NavPath> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn with<T>(&self, f: impl FnOnce(&NavPath) -> T) -> T {
        f(&self.lock())
    }

    pub fn with_mut<T>(&self, f: impl FnOnce(&mut NavPath) -> T) -> T {
        f(&mut self.lock())
    }

    pub fn ptr_eq(&self, other: &NavPathRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Сколько владельцев держат path
    pub fn holders(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    pub fn is_partial(&self) -> bool {
        self.lock().is_partial()
    }

    pub fn is_valid(&self) -> bool {
        self.lock().is_valid()
    }

    pub fn nav_data(&self) -> Option<NavDataId> {
        self.lock().nav_data()
    }

    pub fn end_location(&self) -> Option<Vec3> {
        self.lock().end_location()
    }

    pub fn set_manual_repath_waiting(&self, waiting: bool) {
        self.lock().set_manual_repath_waiting(waiting);
    }

    pub fn subscribe(&self) -> PathObserverHandle {
        self.lock().add_observer()
    }

    pub fn unsubscribe(&self, handle: PathObserverHandle) -> bool {
        self.lock().remove_observer(handle)
    }

    pub fn observer_count(&self) -> usize {
        self.lock().observer_count()
    }

    pub fn broadcast(&self, event: PathEvent) {
        self.lock().broadcast(event);
    }

    pub fn take_events(&self, handle: PathObserverHandle) -> Vec<PathEvent> {
        self.lock().take_events(handle)
    }
}

impl std::fmt::Debug for NavPathRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let path = self.lock();
        f.debug_struct("NavPathRef")
            .field("points", &path.points.len())
            .field("partial", &path.partial)
            .field("observers", &path.observers.len())
            .finish()
    }
}

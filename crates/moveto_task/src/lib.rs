//! MoveTo Task
//!
//! Orchestrator "подойди к точке / к entity" поверх внешних
//! коллабораторов (planner, path follower, readiness probe) и Bevy 0.16 ECS хост.
//!
//! Слои:
//! - `orchestrator`: state machine одного move task'а (без ECS)
//! - `task`: ECS обёртка: `MoveToTask` component, events, `MoveToPlugin`
//! - `sandbox`: простые backends для headless прогонов и тестов

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

// Публичные модули
pub mod components;
pub mod config;
pub mod environment;
pub mod error;
pub mod following;
pub mod logger;
pub mod navigation;
pub mod orchestrator;
pub mod request;
pub mod sandbox;
pub mod schedules;
pub mod task;

// Re-export для удобства
pub use components::*;
pub use config::MoveToConfig;
pub use error::{MoveRequestError, MoveTaskError};
pub use logger::{
    init_logger, log, log_error, log_info, log_warning, log_with_level, set_log_level, set_logger, LogLevel,
    LogPrinter,
};
pub use orchestrator::{MoveContext, MoveNotification, MoveOrchestrator, MoveTask, OrchestratorState, Outcome};
pub use request::{AiOptionFlag, MoveGoal, MoveRequest, MoveToParams};
pub use sandbox::{SandboxFollower, SandboxNavigation, SandboxPlugin, SandboxReadiness};
pub use task::{
    MoveTaskAction, MoveTaskCommand, MoveTaskCompleted, MoveTaskFailed, MoveTaskRestarted, MoveToPlugin, MoveToTask,
    PathFollowingFinished, TaskOwner,
};

/// Частота FixedUpdate (Hz)
pub const FIXED_HZ: f64 = 60.0;

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless прогона
///
/// Время идёт ровно на один fixed тик за `app.update()` (первый update: нулевой).
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(FIXED_HZ)) // 60Hz FixedUpdate
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(1.0 / FIXED_HZ)));

    app
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}

//! Move orchestrator: lifecycle одного логического move.
//!
//! # Architecture
//!
//! Orchestrator не держит ссылок на коллабораторов: каждый вход
//! (`start`, `on_timer`, `on_request_finished`, `poll_path_events`, ...)
//! получает `MoveContext` с planner'ом, follower'ом, таймерами и world queries.
//! Это делает его чистой state machine, которую можно гонять и в ECS
//! (`task::MoveToPlugin`), и в unit тестах с fakes.
//!
//! ```text
//! Idle ──start──► AwaitingReadiness ──timer──► (ready) ──► Following
//!                                                           │   ▲
//!                                         Invalidated ──────┘   │ Updated
//!                                              ▼                │
//!                                        RepathPending ─────────┘
//! любое ──(result / cleared / repath failed / stop)──► Finished
//! ```

use bevy::prelude::*;

use crate::environment::{ActorQuery, ReadinessProbe};
use crate::error::MoveTaskError;
use crate::following::PathFollower;
use crate::navigation::NavigationQueryService;
use crate::request::MoveRequest;
use crate::schedules::DeferredScheduler;

pub mod machine;
pub mod state;

#[cfg(test)]
mod machine_tests;

pub use machine::MoveOrchestrator;
pub use state::{MoveNotification, OrchestratorState, Outcome};

/// Коллабораторы одного шага orchestrator'а
pub struct MoveContext<'a> {
    pub navigation: &'a mut dyn NavigationQueryService,
    pub follower: &'a mut dyn PathFollower,
    pub scheduler: &'a mut dyn DeferredScheduler,
    pub readiness: &'a dyn ReadinessProbe,
    pub actors: &'a dyn ActorQuery,
}

/// Capability interface move task'а (controller- и ability-initiated одинаково)
pub trait MoveTask {
    fn start(&mut self, ctx: &mut MoveContext<'_>, request: MoveRequest) -> Result<(), MoveTaskError>;

    fn stop(&mut self, ctx: &mut MoveContext<'_>);

    fn pause(&mut self, ctx: &mut MoveContext<'_>);

    fn resume(&mut self, ctx: &mut MoveContext<'_>);

    fn agent(&self) -> Entity;
}

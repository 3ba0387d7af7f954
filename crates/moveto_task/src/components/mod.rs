//! ECS Components для move tasks
//!
//! Организация по доменам:
//! - agent: навигационный якорь актора (NavAgent, MoveGoalOffset)
//! - owner: кто имеет право запускать tasks (GameplayTaskOwner)

pub mod agent;
pub mod owner;


pub use agent::*;
pub use owner::*;

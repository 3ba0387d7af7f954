//! Error types для move tasks.
//!
//! `MoveRequestError` никогда не уходит к caller'у как `Err`: orchestrator
//! сворачивает его в `Outcome` и доставляет через тот же канал, что и успех.

use thiserror::Error;

use crate::orchestrator::Outcome;

/// Почему конкретная попытка движения не смогла стартовать
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MoveRequestError {
    /// Goal entity больше не существует (или не имеет NavAgent)
    #[error("move request is not valid: {0}")]
    SpecInvalid(String),

    /// Goal location содержит NaN/inf
    #[error("destination is not valid: {0}")]
    InvalidDestination(String),

    /// Goal не проецируется на walkable поверхность (pathfinding включён)
    #[error("failed to project destination {0} onto navigation")]
    ProjectionFailed(String),

    /// Нет navigation data для агента (даже abstract)
    #[error("no navigation data for agent")]
    NoNavigationData,

    /// Planner вернул ошибку или пустой результат
    #[error("pathfinding failed: {0}")]
    PlanningFailed(String),

    /// Planner вернул partial path, а request его запрещает
    #[error("partial path is not allowed by the request")]
    PartialPathRejected,

    /// Follower не принял path (вернул invalid request id)
    #[error("path follower rejected the move request")]
    FollowerRejected,
}

impl MoveRequestError {
    /// Во что превращается ошибка для caller'а
    pub fn outcome(&self) -> Outcome {
        match self {
            MoveRequestError::PartialPathRejected => Outcome::Aborted,
            _ => Outcome::Invalid,
        }
    }
}

/// Ошибки capability interface и конструирования task'ов
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveTaskError {
    #[error("move task already finished")]
    AlreadyFinished,

    #[error("controller {0} does not carry a GameplayTaskOwner, aborting movement")]
    MissingTaskOwner(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse move config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid move config field `{field}`: {message}")]
    Invalid { field: &'static str, message: String },
}

pub type Result<T> = std::result::Result<T, MoveRequestError>;

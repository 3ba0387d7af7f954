//! Состояния, исходы и уведомления orchestrator'а

use crate::following::{FollowResultCode, RequestId};

/// Где сейчас логический move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrchestratorState {
    /// Ещё не стартовал
    #[default]
    Idle,
    /// Планирование отложено, ждём retry таймер
    AwaitingReadiness,
    /// Follower идёт по path (или ждём restart на следующем тике)
    Following,
    /// Path инвалидирован, ждём repath
    RepathPending,
    /// Терминальное состояние
    Finished,
}

impl OrchestratorState {
    pub fn is_active(&self) -> bool {
        !matches!(self, OrchestratorState::Idle | OrchestratorState::Finished)
    }
}

/// Терминальный исход move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Aborted,
    /// Follower не дошёл (blocked / off path) или исчерпан retry cap
    Failed,
    /// Request невалиден (уходит через failure канал)
    Invalid,
}

impl From<FollowResultCode> for Outcome {
    fn from(code: FollowResultCode) -> Self {
        match code {
            FollowResultCode::Success => Outcome::Success,
            FollowResultCode::Aborted => Outcome::Aborted,
            FollowResultCode::Blocked | FollowResultCode::OffPath => Outcome::Failed,
            FollowResultCode::Invalid => Outcome::Invalid,
        }
    }
}

/// Уведомления для caller'а
///
/// `Completed`/`Failed`: ровно одно на весь lifetime orchestrator'а.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveNotification {
    Completed { outcome: Outcome, partial: bool },
    Failed,
    /// Resume не смог продолжить request follower'а, move начат заново
    ResumedWithRestart { previous: RequestId },
}

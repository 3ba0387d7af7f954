//! Path following: внешний исполнитель path'а.
//!
//! Follower потребляет path, генерирует motion и в конце сообщает результат
//! (`PathFollowingFinished` в ECS слое). Orchestrator различает "свои" и
//! "чужие" результаты по `RequestId`.

use bevy::prelude::*;
use std::ops::{BitOr, BitOrAssign};

use crate::components::NavAgent;
use crate::navigation::NavPathRef;
use crate::request::{MoveRequest, ResolvedGoal};


/// Идентификатор follower-side request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u32);

impl RequestId {
    pub const INVALID: RequestId = RequestId(0);

    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }

    /// "Этот callback: для моей текущей попытки"
    pub fn matches(&self, other: RequestId) -> bool {
        self.is_valid() && *self == other
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::INVALID
    }
}

/// Терминальный код follower'а
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowResultCode {
    Success,
    /// Застрял (нет прогресса)
    Blocked,
    /// Сошёл с path
    OffPath,
    Aborted,
    /// Request не был валиден
    Invalid,
}

/// Дополнительные флаги результата (битовая маска)
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FollowResultFlags(u16);

impl FollowResultFlags {
    pub const NONE: Self = Self(0);
    /// Abort инициирован через `abort()` (не самим follower'ом)
    pub const USER_ABORT: Self = Self(1 << 0);
    /// Abort от владельца request'а (task завершился)
    pub const OWNER_FINISHED: Self = Self(1 << 1);
    pub const INVALID_PATH: Self = Self(1 << 2);
    pub const MOVEMENT_STOP: Self = Self(1 << 3);
    /// Request вытеснен новым request'ом
    pub const NEW_REQUEST: Self = Self(1 << 4);
    /// Новый request пришёл от скрипта, который явно перебил текущий
    pub const FORCED_SCRIPT: Self = Self(1 << 5);
    pub const ALREADY_AT_GOAL: Self = Self(1 << 6);

    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn bits(&self) -> u16 {
        self.0
    }
}

impl BitOr for FollowResultFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for FollowResultFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl std::fmt::Debug for FollowResultFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const NAMES: [(FollowResultFlags, &str); 7] = [
            (FollowResultFlags::USER_ABORT, "UserAbort"),
            (FollowResultFlags::OWNER_FINISHED, "OwnerFinished"),
            (FollowResultFlags::INVALID_PATH, "InvalidPath"),
            (FollowResultFlags::MOVEMENT_STOP, "MovementStop"),
            (FollowResultFlags::NEW_REQUEST, "NewRequest"),
            (FollowResultFlags::FORCED_SCRIPT, "ForcedScript"),
            (FollowResultFlags::ALREADY_AT_GOAL, "AlreadyAtGoal"),
        ];

        let names: Vec<&str> = NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        if names.is_empty() {
            write!(f, "None")
        } else {
            write!(f, "{}", names.join("|"))
        }
    }
}

/// Результат follow request'а
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FollowResult {
    pub code: FollowResultCode,
    pub flags: FollowResultFlags,
}

impl FollowResult {
    pub fn new(code: FollowResultCode, flags: FollowResultFlags) -> Self {
        Self { code, flags }
    }

    pub fn success() -> Self {
        Self::new(FollowResultCode::Success, FollowResultFlags::NONE)
    }

    pub fn is_success(&self) -> bool {
        self.code == FollowResultCode::Success
    }

    /// Request вытеснен новым request'ом от кого-то другого (не скриптом)
    pub fn is_replaced_by_new_request(&self) -> bool {
        self.flags.contains(FollowResultFlags::USER_ABORT | FollowResultFlags::NEW_REQUEST)
            && !self.flags.contains(FollowResultFlags::FORCED_SCRIPT)
    }
}

/// Состояние follower'а для агента
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowerStatus {
    Idle,
    /// Ждёт path (например, manual repath)
    Waiting,
    Paused,
    Moving,
}

/// Reach test: агент уже внутри acceptance радиуса goal'а
///
/// XZ дистанция ≤ acceptance (+ радиус агента при stop-on-overlap, + радиус цели),
/// по вертикали: в пределах высоты агента.
pub fn reach_test(agent: &NavAgent, goal: &ResolvedGoal, request: &MoveRequest) -> bool {
    let mut radius = request.acceptance_radius() + goal.radius;
    if request.reach_test_includes_agent_radius() {
        radius += agent.radius;
    }

    let vertical = (goal.location.y - agent.location.y).abs();
    agent.horizontal_distance(goal.location) <= radius && vertical <= agent.height
}

/// Внешний step-follower (locomotion не наша забота)
pub trait PathFollower {
    fn status(&self, agent: Entity) -> FollowerStatus;

    fn current_request_id(&self, agent: Entity) -> RequestId;

    fn has_reached(&self, agent: &NavAgent, goal: &ResolvedGoal, request: &MoveRequest) -> bool {
        reach_test(agent, goal, request)
    }

    /// Начать следование. `RequestId::INVALID`: follower отказал.
    fn request_move(&mut self, agent: Entity, request: &MoveRequest, path: NavPathRef) -> RequestId;

    /// Зарегистрировать request, который сразу закончен с данным кодом
    fn request_immediate_finish(&mut self, agent: Entity, code: FollowResultCode) -> RequestId;

    fn abort(&mut self, agent: Entity, request_id: RequestId, flags: FollowResultFlags);

    fn pause(&mut self, agent: Entity, request_id: RequestId);

    /// false: request уже не текущий, продолжить нельзя
    fn resume(&mut self, agent: Entity, request_id: RequestId) -> bool;
}

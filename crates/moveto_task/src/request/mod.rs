//! Move request: неизменяемое (в рамках попытки) описание желаемого движения.
//!
//! - `MoveGoal`: точка XOR entity (enum гарантирует ровно одно)
//! - `MoveRequest`: goal + acceptance/partial/pathfinding/projection/filter policy
//! - `MoveToParams`: параметры в стиле "MoveTo(location, actor, flags...)" с tri-state флагами

use bevy::prelude::*;

use crate::config::MoveToConfig;


/// Идентификатор navigation filter (area costs / exclusions задаёт navigation backend)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NavFilterId(pub u32);

/// Куда двигаемся
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveGoal {
    /// Фиксированная точка (world coordinates)
    Location(Vec3),
    /// Отслеживаемая entity (позиция пересчитывается на каждом query)
    Entity(Entity),
}

/// Tri-state флаг: Default → берём значение из MoveToConfig
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AiOptionFlag {
    #[default]
    Default,
    Enable,
    Disable,
}

impl AiOptionFlag {
    pub fn pick(self, default_value: bool) -> bool {
        match self {
            AiOptionFlag::Default => default_value,
            AiOptionFlag::Enable => true,
            AiOptionFlag::Disable => false,
        }
    }
}

/// Описание одного логического move
#[derive(Debug, Clone, PartialEq)]
pub struct MoveRequest {
    goal: MoveGoal,
    acceptance_radius: f32,
    reach_test_includes_agent_radius: bool,
    allow_partial_path: bool,
    use_pathfinding: bool,
    project_goal_on_navigation: bool,
    navigation_filter: Option<NavFilterId>,
}

impl MoveRequest {
    /// Request с defaults из config
    pub fn new(goal: MoveGoal, config: &MoveToConfig) -> Self {
        Self {
            goal,
            acceptance_radius: config.default_acceptance_radius,
            reach_test_includes_agent_radius: config.finish_move_on_goal_overlap,
            allow_partial_path: config.accept_partial_paths,
            use_pathfinding: true,
            project_goal_on_navigation: config.project_goal_on_navigation,
            navigation_filter: None,
        }
    }

    pub fn to_location(location: Vec3) -> Self {
        Self::new(MoveGoal::Location(location), &MoveToConfig::default())
    }

    pub fn to_entity(entity: Entity) -> Self {
        Self::new(MoveGoal::Entity(entity), &MoveToConfig::default())
    }

    /// Отрицательный радиус: "используй configured default", т.е. оставляем текущий
    pub fn with_acceptance_radius(mut self, radius: f32) -> Self {
        if radius.is_finite() && radius >= 0.0 {
            self.acceptance_radius = radius;
        }
        self
    }

    pub fn with_reach_test_includes_agent_radius(mut self, include: bool) -> Self {
        self.reach_test_includes_agent_radius = include;
        self
    }

    pub fn with_allow_partial_path(mut self, allow: bool) -> Self {
        self.allow_partial_path = allow;
        self
    }

    pub fn with_use_pathfinding(mut self, use_pathfinding: bool) -> Self {
        self.use_pathfinding = use_pathfinding;
        self
    }

    pub fn with_project_goal(mut self, project: bool) -> Self {
        self.project_goal_on_navigation = project;
        self
    }

    pub fn with_navigation_filter(mut self, filter: Option<NavFilterId>) -> Self {
        self.navigation_filter = filter;
        self
    }

    pub fn goal(&self) -> MoveGoal {
        self.goal
    }

    pub fn goal_entity(&self) -> Option<Entity> {
        match self.goal {
            MoveGoal::Entity(entity) => Some(entity),
            MoveGoal::Location(_) => None,
        }
    }

    pub fn goal_location(&self) -> Option<Vec3> {
        match self.goal {
            MoveGoal::Location(location) => Some(location),
            MoveGoal::Entity(_) => None,
        }
    }

    pub fn is_move_to_entity(&self) -> bool {
        matches!(self.goal, MoveGoal::Entity(_))
    }

    pub fn acceptance_radius(&self) -> f32 {
        self.acceptance_radius
    }

    pub fn reach_test_includes_agent_radius(&self) -> bool {
        self.reach_test_includes_agent_radius
    }

    pub fn allows_partial_path(&self) -> bool {
        self.allow_partial_path
    }

    pub fn uses_pathfinding(&self) -> bool {
        self.use_pathfinding
    }

    pub fn projects_goal(&self) -> bool {
        self.project_goal_on_navigation
    }

    pub fn navigation_filter(&self) -> Option<NavFilterId> {
        self.navigation_filter
    }

    /// Goal location валидна (для entity goal проверяется при resolve)
    pub fn has_valid_location(&self) -> bool {
        match self.goal {
            MoveGoal::Location(location) => location.is_finite(),
            MoveGoal::Entity(_) => true,
        }
    }

    /// Заменить location goal (после projection). Для entity goal: no-op.
    pub(crate) fn update_goal_location(&mut self, location: Vec3) {
        if let MoveGoal::Location(current) = &mut self.goal {
            *current = location;
        }
    }
}

impl std::fmt::Display for MoveRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.goal {
            MoveGoal::Location(location) => write!(f, "location {:?}", location)?,
            MoveGoal::Entity(entity) => write!(f, "entity {:?}", entity)?,
        }
        write!(
            f,
            " (radius {:.2}, partial: {}, pathfinding: {}, project: {})",
            self.acceptance_radius, self.allow_partial_path, self.use_pathfinding, self.project_goal_on_navigation
        )
    }
}

/// Goal, пересчитанный на момент query
///
/// Для entity goal: якорь цели + offset в её фрейме, радиус капсулы цели.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedGoal {
    pub location: Vec3,
    pub entity: Option<Entity>,
    /// Радиус goal entity (0 для точки)
    pub radius: f32,
}

impl ResolvedGoal {
    pub fn point(location: Vec3) -> Self {
        Self {
            location,
            entity: None,
            radius: 0.0,
        }
    }
}

/// Параметры MoveTo в "blueprint" форме
///
/// `goal_entity` побеждает `goal_location`, если задан.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveToParams {
    pub goal_location: Vec3,
    pub goal_entity: Option<Entity>,
    /// < 0 → default из config
    pub acceptance_radius: f32,
    pub stop_on_overlap: AiOptionFlag,
    pub accept_partial_path: AiOptionFlag,
    pub use_pathfinding: bool,
    pub use_continuous_goal_tracking: bool,
    pub project_goal_on_navigation: AiOptionFlag,
    pub navigation_filter: Option<NavFilterId>,
}

impl Default for MoveToParams {
    fn default() -> Self {
        Self {
            goal_location: Vec3::ZERO,
            goal_entity: None,
            acceptance_radius: -1.0,
            stop_on_overlap: AiOptionFlag::Default,
            accept_partial_path: AiOptionFlag::Default,
            use_pathfinding: true,
            use_continuous_goal_tracking: false,
            project_goal_on_navigation: AiOptionFlag::Default,
            navigation_filter: None,
        }
    }
}

impl MoveToParams {
    pub fn to_location(location: Vec3) -> Self {
        Self {
            goal_location: location,
            ..Default::default()
        }
    }

    pub fn to_entity(entity: Entity) -> Self {
        Self {
            goal_entity: Some(entity),
            ..Default::default()
        }
    }

    pub fn into_request(self, config: &MoveToConfig) -> MoveRequest {
        let goal = match self.goal_entity {
            Some(entity) => MoveGoal::Entity(entity),
            None => MoveGoal::Location(self.goal_location),
        };

        MoveRequest::new(goal, config)
            .with_acceptance_radius(self.acceptance_radius)
            .with_reach_test_includes_agent_radius(self.stop_on_overlap.pick(config.finish_move_on_goal_overlap))
            .with_allow_partial_path(self.accept_partial_path.pick(config.accept_partial_paths))
            .with_use_pathfinding(self.use_pathfinding)
            .with_project_goal(self.project_goal_on_navigation.pick(config.project_goal_on_navigation))
            .with_navigation_filter(self.navigation_filter)
    }
}

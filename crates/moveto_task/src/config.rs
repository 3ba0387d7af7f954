//! MoveToConfig: defaults для move requests и retry policy.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Интервал retry по умолчанию (readiness и repath), секунды
pub const DEFAULT_RETRY_INTERVAL: f32 = 0.2;

/// Параметры move tasks
///
/// Все поля опциональны в TOML (`#[serde(default)]`).
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoveToConfig {
    /// Acceptance radius для requests с отрицательным/дефолтным радиусом (метры)
    pub default_acceptance_radius: f32,
    /// Reach test учитывает радиус агента (stop on overlap)
    pub finish_move_on_goal_overlap: bool,
    /// Разрешать partial paths по умолчанию
    pub accept_partial_paths: bool,
    /// Проецировать goal location на navigation по умолчанию
    pub project_goal_on_navigation: bool,
    /// Интервал retry пока environment не готов к planning (секунды)
    pub retry_interval_secs: f32,
    /// Лимит readiness retries (None: ждём бесконечно)
    pub max_readiness_retries: Option<u32>,
    /// Лимит repath retries (None: ждём бесконечно)
    pub max_repath_retries: Option<u32>,
    /// Насколько goal entity может сместиться до перепланирования (метры)
    pub goal_tether_distance: f32,
}

impl Default for MoveToConfig {
    fn default() -> Self {
        Self {
            default_acceptance_radius: 0.5,
            finish_move_on_goal_overlap: true,
            accept_partial_paths: true,
            project_goal_on_navigation: true,
            retry_interval_secs: DEFAULT_RETRY_INTERVAL,
            max_readiness_retries: None,
            max_repath_retries: None,
            goal_tether_distance: 1.0,
        }
    }
}

impl MoveToConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: MoveToConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.default_acceptance_radius.is_finite() || self.default_acceptance_radius < 0.0 {
            return Err(ConfigError::Invalid {
                field: "default_acceptance_radius",
                message: format!("must be >= 0, got {}", self.default_acceptance_radius),
            });
        }
        if !self.retry_interval_secs.is_finite() || self.retry_interval_secs <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "retry_interval_secs",
                message: format!("must be > 0, got {}", self.retry_interval_secs),
            });
        }
        if !self.goal_tether_distance.is_finite() || self.goal_tether_distance <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "goal_tether_distance",
                message: format!("must be > 0, got {}", self.goal_tether_distance),
            });
        }
        Ok(())
    }
}

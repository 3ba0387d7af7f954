//! Навигационные компоненты: NavAgent, MoveGoalOffset

use bevy::prelude::*;

/// Навигационный якорь актора (позиция + ориентация + габариты)
///
/// Используется и для агента, которого двигаем, и для goal entity:
/// goal location пересчитывается из NavAgent цели на каждом query.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct NavAgent {
    /// Позиция на navigation (world coordinates)
    pub location: Vec3,
    /// Ориентация (для goal offset)
    pub rotation: Quat,
    /// Радиус капсулы (метры)
    pub radius: f32,
    /// Высота капсулы (метры)
    pub height: f32,
}

impl Default for NavAgent {
    fn default() -> Self {
        Self {
            location: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            radius: 0.4,
            height: 1.8,
        }
    }
}

impl NavAgent {
    pub fn at(location: Vec3) -> Self {
        Self {
            location,
            ..Default::default()
        }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    /// Дистанция в XZ плоскости (navigation работает в XZ, Y: высота)
    pub fn horizontal_distance(&self, point: Vec3) -> f32 {
        Vec2::new(point.x - self.location.x, point.z - self.location.z).length()
    }

    /// Точка в локальном фрейме актора → world
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.location + self.rotation * local
    }
}

/// Offset цели для подходящих агентов (в локальном фрейме цели)
///
/// Например: подходить к NPC спереди, а не в центр капсулы.
#[derive(Component, Debug, Clone, Copy, PartialEq, Default, Reflect)]
#[reflect(Component)]
pub struct MoveGoalOffset(pub Vec3);

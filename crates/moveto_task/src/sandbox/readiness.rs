use bevy::prelude::*;
use rand::Rng;

use crate::environment::ReadinessProbe;
use crate::DeterministicRng;

/// Readiness sandbox'а: раз в тик бросается seeded монетка
#[derive(Resource, Debug, Clone, Default)]
pub struct SandboxReadiness {
    /// Вероятность "world busy" в тике [0, 1]
    pub postpone_chance: f32,
    /// Перекрывает монетку (тесты, демо)
    pub forced: Option<bool>,
    postponed_this_tick: bool,
}

impl SandboxReadiness {
    pub fn with_chance(postpone_chance: f32) -> Self {
        Self {
            postpone_chance: sanitize_chance(postpone_chance),
            ..default()
        }
    }

    pub fn roll(&mut self, rng: &mut impl Rng) {
        let chance = sanitize_chance(self.postpone_chance) as f64;
        self.postponed_this_tick = rng.gen_bool(chance);
    }
}

/// NaN / inf → 0.0, иначе clamp в [0, 1] (`gen_bool` паникует вне диапазона)
fn sanitize_chance(chance: f32) -> f32 {
    if chance.is_finite() {
        chance.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

impl ReadinessProbe for SandboxReadiness {
    fn should_postpone_path_updates(&self, _agent: Entity) -> bool {
        self.forced.unwrap_or(self.postponed_this_tick)
    }
}

/// System: монетка на текущий тик
pub fn roll_sandbox_readiness(mut readiness: ResMut<SandboxReadiness>, mut rng: ResMut<DeterministicRng>) {
    readiness.roll(&mut rng.rng);
}

//! Deferred callbacks для move tasks.
//!
//! Orchestrator не держит колбэков: он армит таймер и запоминает handle.
//! `advance_move_timers` (FixedUpdate, первым) двигает время; сработавшие
//! таймеры забирает `drive_move_tasks` и передаёт владельцу (`on_timer`).
//!
//! # Почему handle, а не "clear all timers for object"?
//!
//! У orchestrator'а несколько независимых слотов (move retry, path retry,
//! restart next tick). Каждый отменяется отдельно; teardown отменяет набор.

use bevy::prelude::*;

pub mod timer_systems;


pub use timer_systems::advance_move_timers;

/// Handle одного таймера (уникален в рамках `MoveTimers`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(pub u64);

/// Fire-once таймеры и next-tick deferral
pub trait DeferredScheduler {
    /// Сработает через `delay_secs` (не раньше следующего тика)
    fn set_timer(&mut self, owner: Entity, delay_secs: f32) -> TimerHandle;

    /// Сработает на следующем тике
    fn set_timer_for_next_tick(&mut self, owner: Entity) -> TimerHandle;

    /// false: таймер уже сработал или отменён
    fn clear_timer(&mut self, handle: TimerHandle) -> bool;

    fn is_timer_active(&self, handle: TimerHandle) -> bool;
}

/// Сработавший таймер, ждущий доставки владельцу
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiredTimer {
    pub owner: Entity,
    pub handle: TimerHandle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TimerFire {
    /// Осталось секунд
    After(f32),
    /// Тик, на котором таймер взведён
    NextTick(u64),
}

#[derive(Debug, Clone)]
struct PendingTimer {
    handle: TimerHandle,
    owner: Entity,
    fire: TimerFire,
}

/// Resource: все move таймеры (детерминистичный порядок срабатывания: по handle)
#[derive(Resource, Debug, Default)]
pub struct MoveTimers {
    tick: u64,
    next_handle: u64,
    pending: Vec<PendingTimer>,
    fired: Vec<FiredTimer>,
}

impl MoveTimers {
    fn arm(&mut self, owner: Entity, fire: TimerFire) -> TimerHandle {
        self.next_handle += 1;
        let handle = TimerHandle(self.next_handle);
        self.pending.push(PendingTimer { handle, owner, fire });
        handle
    }

    /// Продвинуть время на один тик
    pub fn advance(&mut self, delta_secs: f32) {
        self.tick = self.tick.wrapping_add(1);
        let tick = self.tick;

        let mut still_pending = Vec::with_capacity(self.pending.len());
        for mut timer in self.pending.drain(..) {
            let due = match &mut timer.fire {
                TimerFire::After(remaining) => {
                    *remaining -= delta_secs;
                    *remaining <= 0.0
                }
                TimerFire::NextTick(armed_on) => *armed_on != tick,
            };

            if due {
                self.fired.push(FiredTimer {
                    owner: timer.owner,
                    handle: timer.handle,
                });
            } else {
                still_pending.push(timer);
            }
        }
        self.pending = still_pending;
    }

    /// Забрать сработавшие таймеры (в порядке handle)
    pub fn take_fired(&mut self) -> Vec<FiredTimer> {
        let mut fired = std::mem::take(&mut self.fired);
        fired.sort_by_key(|timer| timer.handle);
        fired
    }

    /// Сколько таймеров владельца ещё не доставлено (pending + fired)
    pub fn outstanding_for(&self, owner: Entity) -> usize {
        self.pending.iter().filter(|timer| timer.owner == owner).count()
            + self.fired.iter().filter(|timer| timer.owner == owner).count()
    }

    /// Убрать всё, что принадлежит владельцу (entity despawn)
    pub fn clear_all_for(&mut self, owner: Entity) -> usize {
        let before = self.pending.len() + self.fired.len();
        self.pending.retain(|timer| timer.owner != owner);
        self.fired.retain(|timer| timer.owner != owner);
        before - self.pending.len() - self.fired.len()
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }
}

impl DeferredScheduler for MoveTimers {
    fn set_timer(&mut self, owner: Entity, delay_secs: f32) -> TimerHandle {
        self.arm(owner, TimerFire::After(delay_secs.max(0.0)))
    }

    fn set_timer_for_next_tick(&mut self, owner: Entity) -> TimerHandle {
        let tick = self.tick;
        self.arm(owner, TimerFire::NextTick(tick))
    }

    fn clear_timer(&mut self, handle: TimerHandle) -> bool {
        let before = self.pending.len() + self.fired.len();
        self.pending.retain(|timer| timer.handle != handle);
        self.fired.retain(|timer| timer.handle != handle);
        self.pending.len() + self.fired.len() != before
    }

    fn is_timer_active(&self, handle: TimerHandle) -> bool {
        self.pending.iter().any(|timer| timer.handle == handle) || self.fired.iter().any(|timer| timer.handle == handle)
    }
}

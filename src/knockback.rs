//! Timed knockback override.
//!
//! A damage hit moves the state from `Idle` to `Active`, which owns the body's velocity until the
//! timer runs out. The countdown is polled from the physics tick instead of suspending anything,
//! so the simulation stays single-pass.

use std::time::Duration;

use bevy::math::Vec2;
use bevy::time::{Timer, TimerMode};

#[derive(Debug, Clone, Default)]
pub enum KnockbackState {
    #[default]
    Idle,
    Active { timer: Timer },
}

/// Result of advancing the countdown by one physics step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnockbackTick {
    Idle,
    Active,
    /// The timer ran out during this step; the state is `Idle` again.
    Expired,
}

impl KnockbackState {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    #[cfg(test)]
    pub fn remaining(&self) -> Duration {
        match self {
            Self::Idle => Duration::ZERO,
            Self::Active { timer } => timer.remaining(),
        }
    }

    /// Enters `Active` for `duration`. Returns `false` without touching anything if already
    /// active; a running knockback is never extended or restarted.
    pub fn try_begin(&mut self, duration: Duration) -> bool {
        if self.is_active() {
            return false;
        }

        *self = Self::Active {
            timer: Timer::new(duration, TimerMode::Once),
        };
        true
    }

    pub fn tick(&mut self, delta: Duration) -> KnockbackTick {
        let Self::Active { timer } = self else {
            return KnockbackTick::Idle;
        };

        if timer.tick(delta).finished() {
            *self = Self::Idle;
            KnockbackTick::Expired
        } else {
            KnockbackTick::Active
        }
    }
}

/// Impulse applied on entering knockback. `direction` is expected to be normalized already.
pub fn knockback_impulse(direction: Vec2, thrust: f32, mass: f32) -> Vec2 {
    direction * thrust * mass
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP: Duration = Duration::from_millis(50);

    #[test]
    fn stays_active_until_duration_elapses() {
        let mut state = KnockbackState::default();
        assert!(state.try_begin(Duration::from_millis(200)));

        for _ in 0..3 {
            assert_eq!(state.tick(STEP), KnockbackTick::Active);
            assert!(state.is_active());
        }

        assert_eq!(state.tick(STEP), KnockbackTick::Expired);
        assert!(!state.is_active());
        assert_eq!(state.tick(STEP), KnockbackTick::Idle);
    }

    #[test]
    fn second_begin_does_not_restart_timer() {
        let mut state = KnockbackState::default();
        state.try_begin(Duration::from_millis(200));
        state.tick(Duration::from_millis(150));

        assert!(!state.try_begin(Duration::from_millis(200)));
        assert_eq!(state.remaining(), Duration::from_millis(50));
    }

    #[test]
    fn idle_reports_no_remaining_time() {
        assert_eq!(KnockbackState::Idle.remaining(), Duration::ZERO);
    }

    #[test]
    fn impulse_scales_with_thrust_and_mass() {
        let impulse = knockback_impulse(Vec2::new(-1.0, 0.0), 10.0, 2.0);
        assert_eq!(impulse, Vec2::new(-20.0, 0.0));
    }
}

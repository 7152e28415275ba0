//! Ground contact and jump gating.

use bevy::math::Vec2;

use crate::capabilities::{BoxCast, LayerMask, PhysicsBody, ShapeCaster};

/// Vertical speed below which a grounded body counts as settled after a jump.
pub const SETTLE_SPEED: f32 = 0.01;

/// Downward box cast from the body's collision bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundProbe {
    pub distance: f32,
    pub layers: LayerMask,
}

impl GroundProbe {
    pub fn new(distance: f32, layers: LayerMask) -> Self {
        Self { distance, layers }
    }

    /// Read-only; safe to call any number of times per tick.
    pub fn is_grounded(&self, body: &dyn PhysicsBody, caster: &dyn ShapeCaster) -> bool {
        caster.box_cast(&BoxCast {
            origin: body.position(),
            half_extents: body.half_extents(),
            direction: Vec2::NEG_Y,
            max_distance: self.distance,
            layers: self.layers,
        })
    }
}

impl Default for GroundProbe {
    fn default() -> Self {
        Self::new(0.1, LayerMask::GROUND)
    }
}

/// Tracks whether the current airtime was started by a jump.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JumpState {
    jumping: bool,
}

impl JumpState {
    #[cfg(test)]
    pub fn is_jumping(&self) -> bool {
        self.jumping
    }

    /// Sets the vertical velocity to `jump_force` if the body stands on ground and no jump is
    /// already in flight. Airborne requests are dropped, not buffered.
    pub fn try_jump(
        &mut self,
        probe: &GroundProbe,
        jump_force: f32,
        body: &mut dyn PhysicsBody,
        caster: &dyn ShapeCaster,
    ) -> bool {
        if self.jumping || !probe.is_grounded(body, caster) {
            return false;
        }

        let velocity = body.velocity();
        body.set_velocity(Vec2::new(velocity.x, jump_force));
        self.jumping = true;
        true
    }

    /// Clears the jump once the body is back on the ground and no longer moving vertically.
    /// Must run after the tick's velocity has been committed.
    pub fn settle(&mut self, grounded: bool, vertical_velocity: f32) {
        if grounded && vertical_velocity.abs() < SETTLE_SPEED {
            self.jumping = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeBody, FakeGround};

    #[test]
    fn grounded_jump_sets_exact_vertical_velocity() {
        let probe = GroundProbe::default();
        let mut jump = JumpState::default();
        let mut body = FakeBody::at(Vec2::ZERO).with_velocity(Vec2::new(3.0, 0.0));

        assert!(jump.try_jump(&probe, 10.0, &mut body, &FakeGround::solid()));
        assert_eq!(body.velocity, Vec2::new(3.0, 10.0));
        assert!(jump.is_jumping());
    }

    #[test]
    fn airborne_jump_is_dropped() {
        let probe = GroundProbe::default();
        let mut jump = JumpState::default();
        let mut body = FakeBody::at(Vec2::ZERO).with_velocity(Vec2::new(1.0, -4.0));

        assert!(!jump.try_jump(&probe, 10.0, &mut body, &FakeGround::air()));
        assert_eq!(body.velocity, Vec2::new(1.0, -4.0));
        assert!(!jump.is_jumping());
    }

    #[test]
    fn repeated_trigger_on_same_contact_is_suppressed() {
        let probe = GroundProbe::default();
        let mut jump = JumpState::default();
        let mut body = FakeBody::at(Vec2::ZERO);
        let ground = FakeGround::solid();

        assert!(jump.try_jump(&probe, 10.0, &mut body, &ground));
        body.velocity.y = 7.0;
        assert!(!jump.try_jump(&probe, 10.0, &mut body, &ground));
        assert_eq!(body.velocity.y, 7.0);
    }

    #[test]
    fn settle_requires_ground_and_rest() {
        let mut jump = JumpState { jumping: true };

        jump.settle(true, 2.0);
        assert!(jump.is_jumping());
        jump.settle(false, 0.0);
        assert!(jump.is_jumping());
        jump.settle(true, 0.005);
        assert!(!jump.is_jumping());
    }

    #[test]
    fn probe_casts_down_from_body_bounds() {
        let probe = GroundProbe::new(0.25, LayerMask::GROUND);
        let body = FakeBody::at(Vec2::new(4.0, 2.0));
        let ground = FakeGround::solid();

        assert!(probe.is_grounded(&body, &ground));
        let cast = ground.last_cast().expect("cast recorded");
        assert_eq!(cast.origin, Vec2::new(4.0, 2.0));
        assert_eq!(cast.half_extents, body.half_extents);
        assert_eq!(cast.direction, Vec2::NEG_Y);
        assert_eq!(cast.max_distance, 0.25);
        assert_eq!(cast.layers, LayerMask::GROUND);
    }
}

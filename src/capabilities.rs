//! Narrow capability interfaces the player controller talks to.
//!
//! The controller never touches Bevy components directly. Each tick the host systems wrap the
//! relevant components in short-lived adapters implementing these traits and hand them over as
//! `&mut dyn` references. Tests substitute fakes from `crate::testing`.

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

use crate::animation::VisualState;

/// The simulated body the controller steers.
pub trait PhysicsBody {
    fn position(&self) -> Vec2;
    fn set_position(&mut self, position: Vec2);
    fn velocity(&self) -> Vec2;
    fn set_velocity(&mut self, velocity: Vec2);
    /// Instantaneous change of momentum; the body divides by its own mass.
    fn apply_impulse(&mut self, impulse: Vec2);
    fn mass(&self) -> f32;
    /// Half size of the body's collision bounds, centred on `position`.
    fn half_extents(&self) -> Vec2;
}

/// Bitmask of tile classifications. Bit `n` selects IntGrid value `n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

impl LayerMask {
    #[cfg(test)]
    pub const NONE: Self = Self(0);
    pub const GROUND: Self = Self(1 << 1);
    pub const WALL: Self = Self(1 << 2);

    #[cfg(test)]
    pub fn from_values(values: &[i32]) -> Self {
        values
            .iter()
            .filter(|value| (0..32).contains(*value))
            .fold(Self::NONE, |mask, value| Self(mask.0 | (1 << value)))
    }

    pub fn contains(self, value: i32) -> bool {
        (0..32).contains(&value) && self.0 & (1 << value) != 0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::GROUND
    }
}

/// An axis-aligned box swept along `direction` for at most `max_distance`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxCast {
    pub origin: Vec2,
    pub half_extents: Vec2,
    pub direction: Vec2,
    pub max_distance: f32,
    pub layers: LayerMask,
}

pub trait ShapeCaster {
    /// Returns `true` when the swept box touches anything in `cast.layers`.
    fn box_cast(&self, cast: &BoxCast) -> bool;
}

pub trait VisualSink {
    fn set_visual_state(&mut self, state: VisualState);
    fn set_facing_left(&mut self, facing_left: bool);
}

pub trait DisplaySink {
    fn display(&mut self, text: &str);
}

/// The three HUD lines. A `None` line is simply not updated.
#[derive(Default)]
pub struct Displays<'a> {
    pub health: Option<&'a mut dyn DisplaySink>,
    pub lives: Option<&'a mut dyn DisplaySink>,
    pub keys: Option<&'a mut dyn DisplaySink>,
}

impl<'a> Displays<'a> {
    #[cfg(test)]
    pub fn none() -> Self {
        Self::default()
    }

    pub(crate) fn show_health(&mut self, text: &str) {
        if let Some(sink) = self.health.as_deref_mut() {
            sink.display(text);
        }
    }

    pub(crate) fn show_lives(&mut self, text: &str) {
        if let Some(sink) = self.lives.as_deref_mut() {
            sink.display(text);
        }
    }

    pub(crate) fn show_keys(&mut self, text: &str) {
        if let Some(sink) = self.keys.as_deref_mut() {
            sink.display(text);
        }
    }
}

/// Polled once per frame tick.
pub trait InputSource {
    /// Horizontal component is already combined with the on-screen axis and lies in `[-1, 1]`.
    fn sample_move(&mut self) -> Vec2;
    /// Consumes a pending jump trigger, if any.
    fn poll_jump_triggered(&mut self) -> bool;
    fn run_held(&self) -> bool {
        false
    }
    /// Horizontal input for facing and animation when it differs from the movement axis.
    /// `None` means the sampled move vector is used.
    fn facing_axis(&self) -> Option<f32> {
        None
    }
}

pub trait SceneHost {
    fn current_scene(&self) -> &str;
    /// Fire-and-forget; the host decides when and how the scene changes.
    fn request_scene_transition(&mut self, scene_id: &str);
}

/// A world item that can be removed once picked up.
pub trait Collectible {
    fn destroy(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_mask_from_values_sets_matching_bits() {
        let mask = LayerMask::from_values(&[1, 2]);
        assert!(mask.contains(1));
        assert!(mask.contains(2));
        assert!(!mask.contains(0));
        assert!(!mask.contains(3));
        assert_eq!(mask, LayerMask(LayerMask::GROUND.0 | LayerMask::WALL.0));
    }

    #[test]
    fn layer_mask_ignores_out_of_range_values() {
        let mask = LayerMask::from_values(&[-1, 40]);
        assert_eq!(mask, LayerMask::NONE);
        assert!(!mask.contains(-1));
        assert!(!LayerMask::GROUND.contains(99));
    }
}

//! Horizontal movement resolution and the kinematic tile integrator.
//!
//! The integrator is the game's physics world: it applies gravity, clamps to terminal velocity
//! and resolves the body against the `CollisionMap` one axis at a time. `BodyAccess` exposes an
//! entity's transform and velocity to the controller through the `PhysicsBody` trait.

use bevy::prelude::*;

use crate::capabilities::PhysicsBody;
use crate::collision::{CollisionMap, SKIN};
use crate::config::{PhysicsSettings, PlayerConfig};
use crate::player::Deactivated;
use crate::state::PhysicsSet;

pub struct MovementPlugin;

impl Plugin for MovementPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            integrate_bodies.in_set(PhysicsSet::Integrate),
        );
    }
}

/// Target velocity for a controlled tick: input drives x, y is left to gravity and jumps.
pub fn resolve_velocity(input_x: f32, speed: f32, current: Vec2) -> Vec2 {
    Vec2::new(input_x * speed, current.y)
}

#[derive(Component, Debug, Default, Clone, Copy, Deref, DerefMut)]
pub struct Velocity(pub Vec2);

#[derive(Component, Debug, Clone, Copy)]
pub struct Mass(pub f32);

impl Default for Mass {
    fn default() -> Self {
        Self(1.0)
    }
}

#[derive(Component, Copy, Clone)]
pub struct Collider {
    pub half_extents: Vec2,
}

impl Collider {
    pub fn from_size(size: Vec2) -> Self {
        Self {
            half_extents: size * 0.5,
        }
    }
}

/// Borrowed view of a kinematic entity for the duration of one system call.
pub struct BodyAccess<'a> {
    pub transform: &'a mut Transform,
    pub velocity: &'a mut Velocity,
    pub mass: f32,
    pub half_extents: Vec2,
}

impl PhysicsBody for BodyAccess<'_> {
    fn position(&self) -> Vec2 {
        self.transform.translation.truncate()
    }

    fn set_position(&mut self, position: Vec2) {
        self.transform.translation.x = position.x;
        self.transform.translation.y = position.y;
    }

    fn velocity(&self) -> Vec2 {
        self.velocity.0
    }

    fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity.0 = velocity;
    }

    fn apply_impulse(&mut self, impulse: Vec2) {
        if self.mass > 0.0 {
            self.velocity.0 += impulse / self.mass;
        }
    }

    fn mass(&self) -> f32 {
        self.mass
    }

    fn half_extents(&self) -> Vec2 {
        self.half_extents
    }
}

fn integrate_bodies(
    time: Res<Time>,
    config: Res<PlayerConfig>,
    collision_map: Res<CollisionMap>,
    mut query: Query<(&mut Transform, &mut Velocity, &Collider), Without<Deactivated>>,
) {
    let dt = time.delta_seconds();

    for (mut transform, mut velocity, collider) in &mut query {
        let mut position = transform.translation.truncate();
        step_body(
            &mut position,
            &mut velocity.0,
            collider.half_extents,
            dt,
            &config.physics,
            &collision_map,
        );

        transform.translation.x = position.x;
        transform.translation.y = position.y;
    }
}

/// Advances one body by `dt`. Returns `true` if it landed on a solid tile this step.
pub fn step_body(
    position: &mut Vec2,
    velocity: &mut Vec2,
    half: Vec2,
    dt: f32,
    settings: &PhysicsSettings,
    map: &CollisionMap,
) -> bool {
    velocity.y = (velocity.y - settings.gravity * dt).max(settings.terminal_velocity);

    if map.tile_size.x <= 0.0 || map.tile_size.y <= 0.0 {
        *position += *velocity * dt;
        return false;
    }

    resolve_horizontal(position, &mut velocity.x, half, dt, map);
    resolve_vertical(position, &mut velocity.y, half, dt, map)
}

fn resolve_horizontal(
    position: &mut Vec2,
    velocity: &mut f32,
    half: Vec2,
    dt: f32,
    map: &CollisionMap,
) {
    if velocity.abs() < f32::EPSILON {
        return;
    }

    let new_x = position.x + *velocity * dt;
    let edge = new_x + half.x * velocity.signum();
    let tile_x = ((edge - map.origin.x) / map.tile_size.x).floor() as i32;
    let min_tile_y = map.tile_at(Vec2::new(edge, position.y - half.y + SKIN)).y;
    let max_tile_y = map.tile_at(Vec2::new(edge, position.y + half.y - SKIN)).y;

    if (min_tile_y..=max_tile_y).any(|ty| map.is_solid(IVec2::new(tile_x, ty))) {
        position.x = if *velocity > 0.0 {
            map.origin.x + tile_x as f32 * map.tile_size.x - half.x - SKIN
        } else {
            map.origin.x + (tile_x + 1) as f32 * map.tile_size.x + half.x + SKIN
        };
        *velocity = 0.0;
        return;
    }

    position.x = new_x;
}

fn resolve_vertical(
    position: &mut Vec2,
    velocity: &mut f32,
    half: Vec2,
    dt: f32,
    map: &CollisionMap,
) -> bool {
    let new_y = position.y + *velocity * dt;
    if velocity.abs() < f32::EPSILON {
        position.y = new_y;
        return false;
    }

    let edge = new_y + half.y * velocity.signum();
    let tile_y = ((edge - map.origin.y) / map.tile_size.y).floor() as i32;
    let min_tile_x = map.tile_at(Vec2::new(position.x - half.x + SKIN, edge)).x;
    let max_tile_x = map.tile_at(Vec2::new(position.x + half.x - SKIN, edge)).x;

    if (min_tile_x..=max_tile_x).any(|tx| map.is_solid(IVec2::new(tx, tile_y))) {
        let landed = *velocity < 0.0;
        position.y = if landed {
            map.origin.y + (tile_y + 1) as f32 * map.tile_size.y + half.y + SKIN
        } else {
            map.origin.y + tile_y as f32 * map.tile_size.y - half.y - SKIN
        };
        *velocity = 0.0;
        return landed;
    }

    position.y = new_y;
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor_map() -> CollisionMap {
        let mut map = CollisionMap {
            tile_size: Vec2::splat(16.0),
            origin: Vec2::ZERO,
            ..default()
        };
        for x in -4..4 {
            map.insert(IVec2::new(x, 0), 1);
        }
        map.insert(IVec2::new(2, 1), 2);
        map
    }

    #[test]
    fn resolver_keeps_vertical_velocity() {
        assert_eq!(resolve_velocity(-1.0, 5.0, Vec2::new(9.0, -3.0)), Vec2::new(-5.0, -3.0));
        assert_eq!(resolve_velocity(0.0, 5.0, Vec2::new(9.0, 4.0)), Vec2::new(0.0, 4.0));
    }

    #[test]
    fn resting_body_stays_on_floor_with_zero_vertical_velocity() {
        let map = floor_map();
        let settings = PhysicsSettings::default();
        let mut position = Vec2::new(-8.0, 16.0 + 8.0 + SKIN);
        let mut velocity = Vec2::ZERO;

        let landed = step_body(
            &mut position,
            &mut velocity,
            Vec2::splat(8.0),
            1.0 / 64.0,
            &settings,
            &map,
        );

        assert!(landed);
        assert_eq!(velocity.y, 0.0);
        assert!((position.y - (24.0 + SKIN)).abs() < 1e-4);
    }

    #[test]
    fn wall_stops_horizontal_motion() {
        let map = floor_map();
        let settings = PhysicsSettings::default();
        let mut position = Vec2::new(23.0, 24.0 + SKIN);
        let mut velocity = Vec2::new(200.0, 0.0);

        step_body(
            &mut position,
            &mut velocity,
            Vec2::splat(8.0),
            1.0 / 64.0,
            &settings,
            &map,
        );

        assert_eq!(velocity.x, 0.0);
        assert!(position.x <= 32.0 - 8.0);
    }

    #[test]
    fn falling_speed_is_clamped_to_terminal_velocity() {
        let map = CollisionMap::default();
        let settings = PhysicsSettings {
            gravity: 1000.0,
            terminal_velocity: -50.0,
        };
        let mut position = Vec2::ZERO;
        let mut velocity = Vec2::new(0.0, -49.0);

        step_body(&mut position, &mut velocity, Vec2::splat(8.0), 0.1, &settings, &map);

        assert_eq!(velocity.y, -50.0);
        assert!((position.y + 5.0).abs() < 1e-4);
    }

    #[test]
    fn impulse_divides_by_mass() {
        let mut transform = Transform::default();
        let mut velocity = Velocity(Vec2::new(1.0, 0.0));
        let mut body = BodyAccess {
            transform: &mut transform,
            velocity: &mut velocity,
            mass: 2.0,
            half_extents: Vec2::splat(8.0),
        };

        body.apply_impulse(Vec2::new(4.0, 6.0));
        assert_eq!(body.velocity(), Vec2::new(3.0, 3.0));

        body.set_position(Vec2::new(5.0, -2.0));
        assert_eq!(transform.translation, Vec3::new(5.0, -2.0, 0.0));
    }
}

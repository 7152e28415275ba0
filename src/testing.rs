//! Fakes for the capability traits, shared by the unit tests.

use std::cell::Cell;
use std::collections::VecDeque;

use bevy::math::Vec2;

use crate::animation::VisualState;
use crate::capabilities::{
    BoxCast, Collectible, DisplaySink, InputSource, PhysicsBody, SceneHost, ShapeCaster,
    VisualSink,
};

#[derive(Debug, Clone)]
pub struct FakeBody {
    pub position: Vec2,
    pub velocity: Vec2,
    pub mass: f32,
    pub half_extents: Vec2,
    pub impulses: Vec<Vec2>,
    pub velocity_writes: usize,
}

impl FakeBody {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            mass: 1.0,
            half_extents: Vec2::splat(0.5),
            impulses: Vec::new(),
            velocity_writes: 0,
        }
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }
}

impl PhysicsBody for FakeBody {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    fn velocity(&self) -> Vec2 {
        self.velocity
    }

    fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
        self.velocity_writes += 1;
    }

    fn apply_impulse(&mut self, impulse: Vec2) {
        self.impulses.push(impulse);
        self.velocity += impulse / self.mass;
    }

    fn mass(&self) -> f32 {
        self.mass
    }

    fn half_extents(&self) -> Vec2 {
        self.half_extents
    }
}

/// Answers every cast with a fixed result and remembers the last query.
#[derive(Debug, Default)]
pub struct FakeGround {
    pub hit: bool,
    last: Cell<Option<BoxCast>>,
}

impl FakeGround {
    pub fn solid() -> Self {
        Self {
            hit: true,
            last: Cell::new(None),
        }
    }

    pub fn air() -> Self {
        Self::default()
    }

    pub fn last_cast(&self) -> Option<BoxCast> {
        self.last.get()
    }
}

impl ShapeCaster for FakeGround {
    fn box_cast(&self, cast: &BoxCast) -> bool {
        self.last.set(Some(*cast));
        self.hit
    }
}

#[derive(Debug, Default)]
pub struct RecordingVisual {
    pub states: Vec<VisualState>,
    pub facing_left: Option<bool>,
}

impl RecordingVisual {
    pub fn last(&self) -> Option<VisualState> {
        self.states.last().copied()
    }
}

impl VisualSink for RecordingVisual {
    fn set_visual_state(&mut self, state: VisualState) {
        self.states.push(state);
    }

    fn set_facing_left(&mut self, facing_left: bool) {
        self.facing_left = Some(facing_left);
    }
}

#[derive(Debug, Default)]
pub struct RecordingDisplay {
    pub lines: Vec<String>,
}

impl RecordingDisplay {
    pub fn last(&self) -> Option<&str> {
        self.lines.last().map(String::as_str)
    }
}

impl DisplaySink for RecordingDisplay {
    fn display(&mut self, text: &str) {
        self.lines.push(text.to_owned());
    }
}

/// Replays queued move vectors and jump triggers, one per poll.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    pub moves: VecDeque<Vec2>,
    pub jumps: VecDeque<bool>,
    pub running: bool,
    pub facing: Option<f32>,
}

impl ScriptedInput {
    pub fn moving(x: f32) -> Self {
        Self {
            moves: VecDeque::from([Vec2::new(x, 0.0)]),
            ..Self::default()
        }
    }

    pub fn jump() -> Self {
        Self {
            jumps: VecDeque::from([true]),
            ..Self::default()
        }
    }
}

impl InputSource for ScriptedInput {
    fn sample_move(&mut self) -> Vec2 {
        self.moves.pop_front().unwrap_or(Vec2::ZERO)
    }

    fn poll_jump_triggered(&mut self) -> bool {
        self.jumps.pop_front().unwrap_or(false)
    }

    fn run_held(&self) -> bool {
        self.running
    }

    fn facing_axis(&self) -> Option<f32> {
        self.facing
    }
}

#[derive(Debug)]
pub struct RecordingScene {
    pub current: String,
    pub requests: Vec<String>,
}

impl RecordingScene {
    pub fn new(current: &str) -> Self {
        Self {
            current: current.to_owned(),
            requests: Vec::new(),
        }
    }
}

impl SceneHost for RecordingScene {
    fn current_scene(&self) -> &str {
        &self.current
    }

    fn request_scene_transition(&mut self, scene_id: &str) {
        self.requests.push(scene_id.to_owned());
    }
}

#[derive(Debug, Default)]
pub struct FakeItem {
    pub destroyed: bool,
}

impl Collectible for FakeItem {
    fn destroy(&mut self) {
        self.destroyed = true;
    }
}

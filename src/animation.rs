//! Visual-state classification for the player sprite.
//!
//! The controller derives one of five tags every physics tick and pushes it into a `VisualSink`.
//! In the running game that sink is the `PlayerVisual` component; a separate `Update` system maps
//! the stored tag onto the sprite sheet frame and the horizontal flip.

use bevy::prelude::*;

use crate::capabilities::VisualSink;
use crate::player::Player;

/// Vertical speed above which the body reads as rising, below the negation as falling.
pub const VERTICAL_EPSILON: f32 = 0.1;

pub struct AnimationPlugin;

impl Plugin for AnimationPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, apply_player_visual);
    }
}

/// Animation classification tags. The discriminant doubles as the sprite sheet column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum VisualState {
    #[default]
    Idle = 0,
    Walk = 1,
    Jump = 2,
    Fall = 3,
    Run = 4,
}

impl VisualState {
    pub const COUNT: u32 = 5;

    pub fn frame_index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Left,
    Right,
}

/// Classifies the current motion. Horizontal input is evaluated first and vertical velocity
/// overrides it, so a rising body always reads as `Jump` even while walking.
///
/// The returned facing is `None` when there is no horizontal input; callers keep whatever
/// facing they had.
pub fn derive_visual_state(
    horizontal: f32,
    running: bool,
    vertical_velocity: f32,
) -> (VisualState, Option<Facing>) {
    let (mut state, facing) = if horizontal > 0.0 {
        (ground_state(running), Some(Facing::Right))
    } else if horizontal < 0.0 {
        (ground_state(running), Some(Facing::Left))
    } else {
        (VisualState::Idle, None)
    };

    if vertical_velocity > VERTICAL_EPSILON {
        state = VisualState::Jump;
    } else if vertical_velocity < -VERTICAL_EPSILON {
        state = VisualState::Fall;
    }

    (state, facing)
}

fn ground_state(running: bool) -> VisualState {
    if running {
        VisualState::Run
    } else {
        VisualState::Walk
    }
}

/// Last visual state pushed by the controller. Lives on the player entity.
#[derive(Component, Debug, Default)]
pub struct PlayerVisual {
    pub state: VisualState,
    pub facing_left: bool,
}

impl VisualSink for PlayerVisual {
    fn set_visual_state(&mut self, state: VisualState) {
        self.state = state;
    }

    fn set_facing_left(&mut self, facing_left: bool) {
        self.facing_left = facing_left;
    }
}

fn apply_player_visual(
    mut query: Query<(&PlayerVisual, &mut Sprite, Option<&mut TextureAtlas>), With<Player>>,
) {
    for (visual, mut sprite, atlas) in &mut query {
        if sprite.flip_x != visual.facing_left {
            sprite.flip_x = visual.facing_left;
        }

        if let Some(mut atlas) = atlas {
            let index = visual.state.frame_index();
            if atlas.index != index {
                atlas.index = index;
            }
        }
    }
}

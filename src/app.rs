//! Plugin composition and schedule ordering.
//!
//! Frame-tick work runs on `Update` in the `GameSet` stages; the player's physics runs on
//! `FixedUpdate` in the `PhysicsSet` stages. Both only run while the game is `Playing`.

use bevy::prelude::*;

use crate::animation::AnimationPlugin;
use crate::audio::GameAudioPlugin;
use crate::collision::CollisionPlugin;
use crate::config::ConfigPlugin;
use crate::hud::HudPlugin;
use crate::input::InputPlugin;
use crate::level::LevelPlugin;
use crate::movement::MovementPlugin;
use crate::pickups::PickupPlugin;
use crate::player::PlayerPlugin;
use crate::state::{toggle_pause, GameSet, GameState, PhysicsSet};
use crate::transition::TransitionPlugin;
use crate::ui::UiPlugin;

pub struct KeyRunnerPlugin;

impl Plugin for KeyRunnerPlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<GameState>()
            .add_plugins((
                ConfigPlugin,
                LevelPlugin,
                CollisionPlugin,
                InputPlugin,
                MovementPlugin,
                AnimationPlugin,
                PlayerPlugin,
                PickupPlugin,
                HudPlugin,
                UiPlugin,
                TransitionPlugin,
                GameAudioPlugin,
            ))
            .configure_sets(
                Update,
                (GameSet::Input, GameSet::Triggers, GameSet::Effects)
                    .chain()
                    .run_if(in_state(GameState::Playing)),
            )
            .configure_sets(
                FixedUpdate,
                (PhysicsSet::Control, PhysicsSet::Integrate, PhysicsSet::Detect)
                    .chain()
                    .run_if(in_state(GameState::Playing)),
            )
            .add_systems(Startup, setup_camera)
            .add_systems(Update, toggle_pause);
    }
}

fn setup_camera(mut commands: Commands) {
    commands.spawn((Name::new("MainCamera"), Camera2dBundle::default()));
}

//! Global game state definitions. States are stored by Bevy in a stack; switching states simply
//! updates an enum value and triggers on-enter/on-exit schedules.

use bevy::input::keyboard::KeyCode;
use bevy::prelude::*;

/// High-level state machine for the game loop.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, States)]
pub enum GameState {
    #[default]
    Loading,
    Playing,
    Paused,
    /// Reached from the last level's proceed prompt or after a game over.
    Title,
    GameOver,
}

/// Frame-tick stages on the `Update` schedule.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum GameSet {
    /// Device sampling and the controller's input latch.
    Input,
    /// Overlap detection producing pickup and damage events.
    Triggers,
    /// Controller reactions to triggers, fall checks and outbox forwarding.
    Effects,
}

/// Physics-tick stages on the `FixedUpdate` schedule. Control writes velocity, Integrate moves
/// bodies, Detect reads the committed result.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum PhysicsSet {
    Control,
    Integrate,
    Detect,
}

/// Toggles between Playing and Paused when `ESC` is pressed.
pub fn toggle_pause(
    keyboard: Res<ButtonInput<KeyCode>>,
    state: Res<State<GameState>>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if !keyboard.just_pressed(KeyCode::Escape) {
        return;
    }

    match state.get() {
        GameState::Playing => next_state.set(GameState::Paused),
        GameState::Paused => next_state.set(GameState::Playing),
        GameState::Loading | GameState::Title | GameState::GameOver => {}
    }
}

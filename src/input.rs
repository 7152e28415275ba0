//! Player input latch.
//!
//! Keyboard and gamepad are sampled into `PlayerInput` every frame. The on-screen buttons feed a
//! separate auxiliary axis through `move_left`/`move_right`, which is summed with the device axis
//! when the controller polls.

use bevy::input::gamepad::{GamepadAxisType, GamepadButtonType};
use bevy::input::keyboard::KeyCode;
use bevy::prelude::*;

use crate::capabilities::InputSource;
use crate::state::{GameSet, GameState};

/// Stick values inside this radius read as zero.
const STICK_DEADZONE: f32 = 0.2;

pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PlayerInput>()
            .add_systems(OnEnter(GameState::Loading), reset_player_input)
            .add_systems(
                Update,
                read_device_input
                    .in_set(GameSet::Input)
                    .run_if(in_state(GameState::Playing)),
            );
    }
}

#[derive(Resource, Debug, Default)]
pub struct PlayerInput {
    device_axis: Vec2,
    screen_axis: f32,
    run_held: bool,
    jump_queued: bool,
}

impl PlayerInput {
    pub fn set_device_axis(&mut self, axis: Vec2) {
        self.device_axis = axis;
    }

    pub fn set_run_held(&mut self, held: bool) {
        self.run_held = held;
    }

    pub fn queue_jump(&mut self) {
        self.jump_queued = true;
    }

    /// On-screen "hold right". Releasing only clears the axis if it still holds `1.0`, so
    /// releasing one button while the other was pressed later leaves the later press in place.
    pub fn move_right(&mut self, pressed: bool) {
        if pressed {
            self.screen_axis = 1.0;
        } else if self.screen_axis == 1.0 {
            self.screen_axis = 0.0;
        }
    }

    pub fn move_left(&mut self, pressed: bool) {
        if pressed {
            self.screen_axis = -1.0;
        } else if self.screen_axis == -1.0 {
            self.screen_axis = 0.0;
        }
    }

    /// On-screen jump button.
    pub fn trigger_jump(&mut self) {
        self.queue_jump();
    }

    #[cfg(test)]
    pub fn screen_axis(&self) -> f32 {
        self.screen_axis
    }
}

impl InputSource for PlayerInput {
    fn sample_move(&mut self) -> Vec2 {
        Vec2::new(
            (self.device_axis.x + self.screen_axis).clamp(-1.0, 1.0),
            self.device_axis.y,
        )
    }

    fn poll_jump_triggered(&mut self) -> bool {
        std::mem::take(&mut self.jump_queued)
    }

    fn run_held(&self) -> bool {
        self.run_held
    }

    /// The device axis wins; the on-screen axis only shows when the device is neutral.
    fn facing_axis(&self) -> Option<f32> {
        let device = self.device_axis.x.clamp(-1.0, 1.0);
        Some(if device != 0.0 { device } else { self.screen_axis })
    }
}

/// A new level starts with no held on-screen direction and no queued jump.
fn reset_player_input(mut input: ResMut<PlayerInput>) {
    *input = PlayerInput::default();
}

pub fn read_device_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    gamepads: Res<Gamepads>,
    axes: Res<Axis<GamepadAxis>>,
    buttons: Res<ButtonInput<GamepadButton>>,
    mut input: ResMut<PlayerInput>,
) {
    let mut axis = Vec2::ZERO;
    if keyboard.any_pressed([KeyCode::KeyA, KeyCode::ArrowLeft]) {
        axis.x -= 1.0;
    }
    if keyboard.any_pressed([KeyCode::KeyD, KeyCode::ArrowRight]) {
        axis.x += 1.0;
    }
    if keyboard.any_pressed([KeyCode::KeyW, KeyCode::ArrowUp]) {
        axis.y += 1.0;
    }
    if keyboard.any_pressed([KeyCode::KeyS, KeyCode::ArrowDown]) {
        axis.y -= 1.0;
    }

    let mut run = keyboard.any_pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight]);
    let mut jump = keyboard.any_just_pressed([KeyCode::Space, KeyCode::ArrowUp]);

    for gamepad in gamepads.iter() {
        let stick = Vec2::new(
            axes.get(GamepadAxis::new(gamepad, GamepadAxisType::LeftStickX))
                .unwrap_or(0.0),
            axes.get(GamepadAxis::new(gamepad, GamepadAxisType::LeftStickY))
                .unwrap_or(0.0),
        );
        if stick.length() > STICK_DEADZONE {
            axis += stick;
        }

        run |= buttons.pressed(GamepadButton::new(gamepad, GamepadButtonType::West));
        jump |= buttons.just_pressed(GamepadButton::new(gamepad, GamepadButtonType::South));
    }

    input.set_device_axis(axis.clamp(Vec2::NEG_ONE, Vec2::ONE));
    input.set_run_held(run);
    if jump {
        input.queue_jump();
    }
}

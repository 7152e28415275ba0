//! Key Runner: a side-scrolling platformer where each level opens once enough keys are collected.
//!
//! Levels come from an LDtk project under `assets/levels/`; player tuning and the level
//! progression table come from `assets/config/player.ron`.

mod animation;
mod app;
mod audio;
mod capabilities;
mod collision;
mod config;
mod controller;
mod ground;
mod hud;
mod input;
mod knockback;
mod level;
mod movement;
mod pickups;
mod player;
mod progression;
mod state;
mod transition;
mod ui;

#[cfg(test)]
mod testing;

use app::KeyRunnerPlugin;
use bevy::asset::AssetPlugin;
use bevy::prelude::*;
use bevy::render::texture::ImagePlugin;
use bevy::window::{Window, WindowResizeConstraints, WindowResolution};

fn main() {
    let primary_window = Window {
        title: "Key Runner".to_string(),
        resolution: WindowResolution::new(1280.0, 720.0),
        resizable: true,
        resize_constraints: WindowResizeConstraints {
            min_width: 640.0,
            min_height: 360.0,
            max_width: f32::INFINITY,
            max_height: f32::INFINITY,
        },
        ..default()
    };

    // Nearest sampling keeps the 16px tiles crisp.
    let default_plugins = DefaultPlugins
        .set(WindowPlugin {
            primary_window: Some(primary_window),
            ..default()
        })
        .set(ImagePlugin::default_nearest())
        .set(AssetPlugin {
            file_path: "assets".to_owned(),
            watch_for_changes_override: Some(true),
            ..default()
        });

    App::new()
        .insert_resource(ClearColor(Color::srgb(0.02, 0.02, 0.04)))
        .add_plugins(default_plugins)
        .add_plugins(KeyRunnerPlugin)
        .run();
}

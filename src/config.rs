//! Tunable values for the player and the kinematic world, loaded from RON at startup.
//!
//! The file is optional. When it is missing or malformed the game logs a warning and falls back
//! to `PlayerConfig::default()`, which is tuned for the 16px tile grid.

use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use bevy::prelude::*;
use ron::Options;
use serde::{Deserialize, Serialize};

use crate::capabilities::LayerMask;
use crate::progression::ProgressionTable;

pub const CONFIG_PATH: &str = "assets/config/player.ron";

pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        let config = match load_player_config(Path::new(CONFIG_PATH)) {
            Ok(config) => {
                info!("Loaded player config from '{}'.", CONFIG_PATH);
                config
            }
            Err(err) => {
                warn!("{}; using built-in defaults.", err);
                PlayerConfig::default()
            }
        };

        app.insert_resource(config);
    }
}

/// Controller tuning. `Default` holds the reference values in world units where one unit is
/// roughly one tile; the game itself runs on `PlayerConfig::default()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerSettings {
    pub move_speed: f32,
    pub run_speed: f32,
    pub jump_force: f32,
    /// Seconds.
    pub knock_back_time: f32,
    pub knock_back_thrust: f32,
    pub max_health: u32,
    pub max_lives: u32,
    pub fall_threshold: f32,
    pub recovery_point: [f32; 2],
    pub ground_probe_distance: f32,
    pub ground_layers: LayerMask,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            run_speed: 8.0,
            jump_force: 10.0,
            knock_back_time: 0.2,
            knock_back_thrust: 10.0,
            max_health: 100,
            max_lives: 5,
            fall_threshold: -10.0,
            recovery_point: [0.0, 2.0],
            ground_probe_distance: 0.1,
            ground_layers: LayerMask::GROUND,
        }
    }
}

impl ControllerSettings {
    /// Whole microseconds, so a tick sum that matches the configured seconds ends the timer.
    pub fn knock_back_duration(&self) -> Duration {
        Duration::from_micros((self.knock_back_time.max(0.0) * 1e6).round() as u64)
    }

    pub fn recovery_point(&self) -> Vec2 {
        Vec2::from_array(self.recovery_point)
    }

    /// Shifts the level-relative fall threshold and recovery point into world space.
    pub fn relative_to(mut self, level_origin: Vec2) -> Self {
        self.fall_threshold += level_origin.y;
        self.recovery_point = (self.recovery_point() + level_origin).to_array();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    pub gravity: f32,
    pub terminal_velocity: f32,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            gravity: 1150.0,
            terminal_velocity: -1800.0,
        }
    }
}

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub controller: ControllerSettings,
    pub physics: PhysicsSettings,
    pub levels: ProgressionTable,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            controller: ControllerSettings {
                move_speed: 150.0,
                run_speed: 240.0,
                jump_force: 480.0,
                knock_back_thrust: 320.0,
                fall_threshold: -160.0,
                recovery_point: [30.0, 60.0],
                ground_probe_distance: 0.1,
                ..ControllerSettings::default()
            },
            physics: PhysicsSettings::default(),
            levels: ProgressionTable::default(),
        }
    }
}

#[derive(Debug)]
pub struct ConfigLoadError {
    pub file: String,
    pub message: String,
}

impl fmt::Display for ConfigLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to load {}: {}", self.file, self.message)
    }
}

impl std::error::Error for ConfigLoadError {}

fn ron_options() -> Options {
    Options::default().with_default_extension(ron::extensions::Extensions::IMPLICIT_SOME)
}

pub fn parse_player_config(file: &str, contents: &str) -> Result<PlayerConfig, ConfigLoadError> {
    ron_options()
        .from_str(contents)
        .map_err(|e| ConfigLoadError {
            file: file.to_owned(),
            message: format!("Parse error: {}", e),
        })
}

pub fn load_player_config(path: &Path) -> Result<PlayerConfig, ConfigLoadError> {
    let file_name = path.display().to_string();
    let contents = fs::read_to_string(path).map_err(|e| ConfigLoadError {
        file: file_name.clone(),
        message: format!("IO error: {}", e),
    })?;

    parse_player_config(&file_name, &contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let config = parse_player_config(
            "inline",
            "(controller: (move_speed: 90.0, max_lives: 2), physics: (gravity: 900.0))",
        )
        .expect("valid config");

        assert_eq!(config.controller.move_speed, 90.0);
        assert_eq!(config.controller.max_lives, 2);
        assert_eq!(config.controller.jump_force, 10.0);
        assert_eq!(config.physics.gravity, 900.0);
        assert_eq!(config.physics.terminal_velocity, -1800.0);
        assert_eq!(config.levels, ProgressionTable::default());
    }

    #[test]
    fn level_table_is_read_as_a_list() {
        let config = parse_player_config(
            "inline",
            r#"(levels: [(scene: "intro", required_keys: 1, next_scene: "level1")])"#,
        )
        .expect("valid config");

        let intro = config.levels.lookup("intro").expect("intro listed");
        assert_eq!(intro.required_keys, 1);
        assert!(config.levels.lookup("level1").is_none());
    }

    #[test]
    fn malformed_file_reports_its_name() {
        let err = parse_player_config("broken.ron", "(controller: [").unwrap_err();
        assert_eq!(err.file, "broken.ron");
        assert!(err.to_string().starts_with("Failed to load broken.ron"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_player_config(Path::new("does/not/exist.ron")).unwrap_err();
        assert!(err.message.starts_with("IO error"));
    }

    #[test]
    fn level_relative_values_shift_by_origin() {
        let settings = ControllerSettings::default().relative_to(Vec2::new(100.0, -400.0));
        assert_eq!(settings.fall_threshold, -410.0);
        assert_eq!(settings.recovery_point(), Vec2::new(100.0, -398.0));
    }

    #[test]
    fn knock_back_duration_converts_seconds() {
        let settings = ControllerSettings {
            knock_back_time: 0.25,
            ..ControllerSettings::default()
        };
        assert_eq!(settings.knock_back_duration(), Duration::from_millis(250));
        assert_eq!(
            ControllerSettings::default().knock_back_duration(),
            Duration::from_millis(200)
        );
    }
}

//! LDtk level orchestration: loads the project, resolves the active level's identifier and
//! bounds, and frames the camera on it.
//!
//! The level identifier is the scene identifier the player controller uses to look up its key
//! threshold, so every level in the LDtk project should have a matching entry in the progression
//! table of `assets/config/player.ron`.

use bevy::asset::LoadState;
use bevy::math::IVec2;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_ecs_ldtk::prelude::*;
use bevy_ecs_ldtk::utils::ldtk_pixel_coords_to_translation;
use bevy_ecs_ldtk::LevelIid;

use crate::state::GameState;

pub struct LevelPlugin;

impl Plugin for LevelPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(LevelConfig::default())
            .init_resource::<LevelAssets>()
            .insert_resource(LevelSelection::index(0))
            .insert_resource(LdtkSettings {
                level_spawn_behavior: LevelSpawnBehavior::UseWorldTranslation {
                    load_level_neighbors: false,
                },
                set_clear_color: SetClearColor::FromLevelBackground,
                ..default()
            })
            .add_plugins(LdtkPlugin)
            .add_systems(OnEnter(GameState::Loading), spawn_world)
            .add_systems(OnEnter(GameState::Title), despawn_world)
            .add_systems(
                Update,
                monitor_level_loading.run_if(in_state(GameState::Loading)),
            )
            .add_systems(
                PostUpdate,
                (
                    cache_level_transform,
                    sync_level_spatial.after(cache_level_transform),
                ),
            );
    }
}

/// Which LDtk project and level to load next. Scene transitions rewrite `start_level`.
#[derive(Resource, Clone)]
pub struct LevelConfig {
    pub project_path: String,
    pub start_level: Option<String>,
    pub tile_size: f32,
    pub camera_zoom: f32,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            project_path: "levels/key_runner.ldtk".to_owned(),
            start_level: Some("level1".to_owned()),
            tile_size: 16.0,
            camera_zoom: 1.0,
        }
    }
}

/// Metadata of the level currently on screen. Fields become `Some` once the project is loaded.
#[derive(Resource, Default)]
pub struct LevelAssets {
    pub project: Option<Handle<LdtkProject>>,
    pub level_identifier: Option<String>,
    pub level_iid: Option<String>,
    pub level_origin: Option<Vec2>,
    pub level_size: Option<Vec2>,
}

impl LevelAssets {
    /// Scene identifier for the progression table; falls back to the requested level while the
    /// project metadata is unavailable.
    pub fn scene_id<'a>(&'a self, config: &'a LevelConfig) -> &'a str {
        self.level_identifier
            .as_deref()
            .or(config.start_level.as_deref())
            .unwrap_or_default()
    }

    pub fn level_center(&self) -> Option<Vec2> {
        Some(self.level_origin? + self.level_size? * 0.5)
    }
}

#[derive(Component)]
pub struct LevelRoot;

fn despawn_world(mut commands: Commands, world: Query<Entity, With<LevelRoot>>) {
    for entity in &world {
        commands.entity(entity).despawn_recursive();
    }
}

fn spawn_world(
    mut commands: Commands,
    world: Query<Entity, With<LevelRoot>>,
    asset_server: Res<AssetServer>,
    config: Res<LevelConfig>,
    mut level_assets: ResMut<LevelAssets>,
    mut selection: ResMut<LevelSelection>,
) {
    for entity in &world {
        commands.entity(entity).despawn_recursive();
    }

    let project_handle: Handle<LdtkProject> = asset_server.load(config.project_path.clone());
    *level_assets = LevelAssets {
        project: Some(project_handle.clone()),
        ..default()
    };

    *selection = config
        .start_level
        .as_ref()
        .map(|label| LevelSelection::Identifier(label.clone()))
        .unwrap_or_else(|| LevelSelection::index(0));

    info!(
        "Loading level {:?} from '{}'.",
        config.start_level, config.project_path
    );

    commands.spawn((
        LevelRoot,
        Name::new("LevelRoot"),
        LdtkWorldBundle {
            ldtk_handle: project_handle,
            ..default()
        },
    ));
}

fn monitor_level_loading(
    asset_server: Res<AssetServer>,
    mut level_assets: ResMut<LevelAssets>,
    projects: Res<Assets<LdtkProject>>,
    config: Res<LevelConfig>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    let Some(project_handle) = level_assets.project.clone() else {
        return;
    };

    match asset_server.get_load_state(project_handle.id()) {
        Some(LoadState::Loaded) => {
            let Some(project) = projects.get(&project_handle) else {
                return;
            };

            let levels = &project.json_data().levels;
            let requested = config.start_level.as_ref().and_then(|identifier| {
                levels.iter().find(|level| &level.identifier == identifier)
            });
            if requested.is_none() {
                warn!(
                    "Level {:?} not found in '{}'; falling back to the first level.",
                    config.start_level, config.project_path
                );
            }

            if let Some(level) = requested.or_else(|| levels.first()) {
                level_assets.level_identifier = Some(level.identifier.clone());
                level_assets.level_iid = Some(level.iid.clone());
                level_assets.level_origin = Some(ldtk_pixel_coords_to_translation(
                    IVec2::new(level.world_x, level.world_y + level.px_hei),
                    0,
                ));
                level_assets.level_size = Some(Vec2::new(level.px_wid as f32, level.px_hei as f32));
            }

            next_state.set(GameState::Playing);
        }
        Some(LoadState::Failed(_)) => {
            warn!(
                "Unable to load LDtk project at '{}'; continuing with an empty level.",
                config.project_path
            );
            next_state.set(GameState::Playing);
        }
        _ => {}
    }
}

/// Replaces the origin computed from project JSON with the level entity's actual transform once
/// LDtk has spawned it.
fn cache_level_transform(
    mut level_assets: ResMut<LevelAssets>,
    level_query: Query<(&GlobalTransform, &LevelIid), Added<LevelIid>>,
) {
    for (transform, iid) in &level_query {
        let is_current = level_assets
            .level_iid
            .as_ref()
            .map_or(true, |target| target == iid.get());

        if is_current {
            level_assets.level_origin = Some(transform.translation().truncate());
        }
    }
}

/// Centres the camera on the level and scales it so the whole level fits the window.
pub fn sync_level_spatial(
    level_assets: Res<LevelAssets>,
    config: Res<LevelConfig>,
    mut camera_query: Query<(&mut Transform, &mut OrthographicProjection), With<Camera2d>>,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    if !level_assets.is_changed() {
        return;
    }

    let (Some(center), Some(size)) = (level_assets.level_center(), level_assets.level_size) else {
        return;
    };

    let Ok((mut camera_transform, mut projection)) = camera_query.get_single_mut() else {
        return;
    };

    if let Ok(window) = windows.get_single() {
        let window_size = window.resolution.size();
        if window_size.x > 0.0 && window_size.y > 0.0 {
            let fit = (size / window_size).max_element().max(0.0001);
            projection.scale = (fit * config.camera_zoom).max(0.0001);
        }
    }

    camera_transform.translation.x = center.x;
    camera_transform.translation.y = center.y;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_id_prefers_loaded_identifier() {
        let config = LevelConfig::default();
        let mut assets = LevelAssets::default();
        assert_eq!(assets.scene_id(&config), "level1");

        assets.level_identifier = Some("level2".to_owned());
        assert_eq!(assets.scene_id(&config), "level2");
    }

    #[test]
    fn level_center_needs_origin_and_size() {
        let mut assets = LevelAssets {
            level_origin: Some(Vec2::new(0.0, -256.0)),
            ..default()
        };
        assert_eq!(assets.level_center(), None);

        assets.level_size = Some(Vec2::new(512.0, 256.0));
        assert_eq!(assets.level_center(), Some(Vec2::new(256.0, -128.0)));
    }
}

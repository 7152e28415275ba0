//! Player entity lifecycle and the systems that drive `PlayerController` from the Bevy
//! schedules.
//!
//! Each system borrows the player's components, wraps them in the capability adapters
//! (`BodyAccess`, `CollisionMap`, `PlayerVisual`, `HudText`, `PlayerInput`, `LevelHost`) and
//! calls one controller operation. Controller events are forwarded as Bevy `PlayerEvent`s at the
//! end of the frame tick.

use bevy::prelude::*;

use crate::animation::{PlayerVisual, VisualState};
use crate::capabilities::Collectible;
use crate::collision::CollisionMap;
use crate::config::PlayerConfig;
use crate::controller::{PlayerController, PlayerEvent};
use crate::hud::HudText;
use crate::input::{read_device_input, PlayerInput};
use crate::level::{LevelAssets, LevelConfig};
use crate::movement::{BodyAccess, Collider, Mass, Velocity};
use crate::pickups::{DamageApplied, HealEntered, KeyEntered};
use crate::state::{GameSet, GameState, PhysicsSet};
use crate::transition::{LevelHost, SceneTransitionRequest};

const PLAYER_SIZE: Vec2 = Vec2::splat(16.0);

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<PlayerEvent>()
            .add_systems(OnEnter(GameState::Playing), spawn_player)
            .add_systems(OnEnter(GameState::Loading), despawn_player)
            .add_systems(OnEnter(GameState::Title), despawn_player)
            .add_systems(
                Update,
                (
                    refresh_spawned_player_hud,
                    sample_controller_input
                        .in_set(GameSet::Input)
                        .after(read_device_input),
                    (
                        handle_damage,
                        handle_heal,
                        handle_key_pickups,
                        check_fall_threshold,
                        forward_player_events,
                    )
                        .chain()
                        .in_set(GameSet::Effects),
                ),
            )
            .add_systems(
                FixedUpdate,
                (
                    control_step.in_set(PhysicsSet::Control),
                    settle_step.in_set(PhysicsSet::Detect),
                ),
            );
    }
}

#[derive(Component)]
pub struct Player;

/// Set on game over. Deactivated entities are hidden and skipped by physics and control.
#[derive(Component)]
pub struct Deactivated;

type ControlledBody<'a> = (
    &'a mut PlayerController,
    &'a mut Transform,
    &'a mut Velocity,
    &'a Mass,
    &'a Collider,
);

type ActivePlayer = (With<Player>, Without<Deactivated>);

/// Despawns a picked-up item through `Commands`.
struct DespawnOnCollect<'a, 'w, 's> {
    commands: &'a mut Commands<'w, 's>,
    entity: Entity,
}

impl Collectible for DespawnOnCollect<'_, '_, '_> {
    fn destroy(&mut self) {
        if let Some(entity) = self.commands.get_entity(self.entity) {
            entity.despawn_recursive();
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn spawn_player(
    mut commands: Commands,
    existing: Query<(), With<Player>>,
    config: Res<PlayerConfig>,
    level_config: Res<LevelConfig>,
    level_assets: Res<LevelAssets>,
    asset_server: Res<AssetServer>,
    mut layouts: ResMut<Assets<TextureAtlasLayout>>,
    mut scene_requests: EventWriter<SceneTransitionRequest>,
) {
    // Resuming from pause re-enters Playing with the player still alive.
    if !existing.is_empty() {
        return;
    }

    let origin = level_assets.level_origin.unwrap_or(Vec2::ZERO);
    let settings = config.controller.clone().relative_to(origin);
    let spawn_position = settings.recovery_point().extend(1.0);

    let host = LevelHost {
        current: level_assets.scene_id(&level_config),
        requests: &mut scene_requests,
    };
    let controller = PlayerController::for_scene(settings, &config.levels, &host);
    info!(
        "Spawning player in '{}' ({} keys required).",
        host.current,
        controller.required_keys()
    );

    let layout = layouts.add(TextureAtlasLayout::from_grid(
        PLAYER_SIZE.as_uvec2(),
        VisualState::COUNT,
        1,
        None,
        None,
    ));

    commands.spawn((
        Name::new("Player"),
        Player,
        SpriteBundle {
            texture: asset_server.load("textures/player_sheet.png"),
            sprite: Sprite {
                custom_size: Some(PLAYER_SIZE),
                ..default()
            },
            transform: Transform::from_translation(spawn_position),
            ..default()
        },
        TextureAtlas { layout, index: 0 },
        PlayerVisual::default(),
        Velocity::default(),
        Mass::default(),
        Collider::from_size(PLAYER_SIZE),
        controller,
    ));
}

fn despawn_player(mut commands: Commands, query: Query<Entity, With<Player>>) {
    for entity in &query {
        commands.entity(entity).despawn_recursive();
    }
}

fn refresh_spawned_player_hud(
    players: Query<&PlayerController, Added<PlayerController>>,
    mut hud: ResMut<HudText>,
) {
    for controller in &players {
        controller.refresh_displays(&mut hud.displays());
    }
}

fn sample_controller_input(
    mut input: ResMut<PlayerInput>,
    collision_map: Res<CollisionMap>,
    mut query: Query<ControlledBody, ActivePlayer>,
) {
    for (mut controller, mut transform, mut velocity, mass, collider) in &mut query {
        let mut body = BodyAccess {
            transform: &mut transform,
            velocity: &mut velocity,
            mass: mass.0,
            half_extents: collider.half_extents,
        };
        controller.sample_input(&mut *input, &mut body, &*collision_map);
    }
}

fn control_step(
    time: Res<Time>,
    mut query: Query<(ControlledBody, &mut PlayerVisual), ActivePlayer>,
) {
    for ((mut controller, mut transform, mut velocity, mass, collider), mut visual) in &mut query {
        let mut body = BodyAccess {
            transform: &mut transform,
            velocity: &mut velocity,
            mass: mass.0,
            half_extents: collider.half_extents,
        };
        controller.physics_tick(time.delta(), &mut body, &mut *visual);
    }
}

fn settle_step(collision_map: Res<CollisionMap>, mut query: Query<ControlledBody, ActivePlayer>) {
    for (mut controller, mut transform, mut velocity, mass, collider) in &mut query {
        let body = BodyAccess {
            transform: &mut transform,
            velocity: &mut velocity,
            mass: mass.0,
            half_extents: collider.half_extents,
        };
        controller.settle_jump(&body, &*collision_map);
    }
}

fn handle_damage(
    mut events: EventReader<DamageApplied>,
    mut hud: ResMut<HudText>,
    mut query: Query<ControlledBody, ActivePlayer>,
) {
    let Ok((mut controller, mut transform, mut velocity, mass, collider)) = query.get_single_mut()
    else {
        events.clear();
        return;
    };

    for hit in events.read() {
        let mut body = BodyAccess {
            transform: &mut transform,
            velocity: &mut velocity,
            mass: mass.0,
            half_extents: collider.half_extents,
        };
        controller.take_damage(hit.amount, hit.direction, &mut body, &mut hud.displays());
    }
}

fn handle_heal(
    mut commands: Commands,
    mut events: EventReader<HealEntered>,
    mut hud: ResMut<HudText>,
    mut query: Query<&mut PlayerController, ActivePlayer>,
) {
    let Ok(mut controller) = query.get_single_mut() else {
        events.clear();
        return;
    };

    for heart in events.read() {
        controller.heal(heart.amount, &mut hud.displays());
        DespawnOnCollect {
            commands: &mut commands,
            entity: heart.item,
        }
        .destroy();
    }
}

fn handle_key_pickups(
    mut commands: Commands,
    mut events: EventReader<KeyEntered>,
    mut hud: ResMut<HudText>,
    mut query: Query<ControlledBody, ActivePlayer>,
) {
    let Ok((mut controller, mut transform, mut velocity, mass, collider)) = query.get_single_mut()
    else {
        events.clear();
        return;
    };

    for key in events.read() {
        let mut body = BodyAccess {
            transform: &mut transform,
            velocity: &mut velocity,
            mass: mass.0,
            half_extents: collider.half_extents,
        };
        let mut item = DespawnOnCollect {
            commands: &mut commands,
            entity: key.item,
        };
        controller.collect_key(&mut item, &mut body, &mut hud.displays());
    }
}

fn check_fall_threshold(mut hud: ResMut<HudText>, mut query: Query<ControlledBody, ActivePlayer>) {
    for (mut controller, mut transform, mut velocity, mass, collider) in &mut query {
        let mut body = BodyAccess {
            transform: &mut transform,
            velocity: &mut velocity,
            mass: mass.0,
            half_extents: collider.half_extents,
        };
        controller.check_fall(&mut body, &mut hud.displays());
    }
}

fn forward_player_events(
    mut commands: Commands,
    mut query: Query<(Entity, &mut PlayerController), ActivePlayer>,
    mut events: EventWriter<PlayerEvent>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    for (entity, mut controller) in &mut query {
        for event in controller.drain_events() {
            if event == PlayerEvent::GameOver {
                commands
                    .entity(entity)
                    .insert((Deactivated, Visibility::Hidden));
                next_state.set(GameState::GameOver);
            }
            events.send(event);
        }
    }
}

//! Overlay screens: pause, the proceed prompt after a level is complete, game over and the title
//! screen.
//!
//! Every overlay is a full-screen node with a text panel and one optional button. `Enter` is the
//! keyboard equivalent of that button.

use bevy::prelude::*;

use crate::config::PlayerConfig;
use crate::controller::{PlayerController, PlayerEvent};
use crate::level::{LevelAssets, LevelConfig};
use crate::player::Player;
use crate::progression::MAIN_MENU_SCENE;
use crate::state::GameState;
use crate::transition::{LevelHost, SceneTransitionRequest};

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(GameState::Paused), spawn_pause_menu)
            .add_systems(OnExit(GameState::Paused), despawn_overlay::<PauseMenu>)
            .add_systems(OnEnter(GameState::Loading), despawn_overlay::<ProceedPanel>)
            .add_systems(OnEnter(GameState::Title), despawn_overlay::<ProceedPanel>)
            .add_systems(OnEnter(GameState::GameOver), spawn_game_over)
            .add_systems(OnExit(GameState::GameOver), despawn_overlay::<GameOverScreen>)
            .add_systems(OnEnter(GameState::Title), spawn_title_screen)
            .add_systems(OnExit(GameState::Title), despawn_overlay::<TitleScreen>)
            .add_systems(
                Update,
                (
                    show_proceed_prompt,
                    handle_proceed.run_if(in_state(GameState::Playing)),
                    leave_game_over.run_if(in_state(GameState::GameOver)),
                    start_from_title.run_if(in_state(GameState::Title)),
                ),
            );
    }
}

#[derive(Component)]
struct PauseMenu;

#[derive(Component)]
struct ProceedPanel;

#[derive(Component)]
struct GameOverScreen;

#[derive(Component)]
struct TitleScreen;

/// The single clickable button of whichever overlay is on screen.
#[derive(Component)]
struct OverlayButton;

fn text_style(font_size: f32) -> TextStyle {
    TextStyle {
        font_size,
        color: Color::srgba(0.9, 0.9, 0.9, 1.0),
        ..default()
    }
}

fn spawn_overlay(
    commands: &mut Commands,
    marker: impl Component,
    name: &'static str,
    message: &str,
    button: Option<&str>,
    backdrop: f32,
) {
    commands
        .spawn((
            marker,
            Name::new(name),
            NodeBundle {
                background_color: BackgroundColor(Color::srgba(0.0, 0.0, 0.0, backdrop)),
                style: Style {
                    position_type: PositionType::Absolute,
                    width: Val::Percent(100.0),
                    height: Val::Percent(100.0),
                    flex_direction: FlexDirection::Column,
                    row_gap: Val::Px(24.0),
                    align_items: AlignItems::Center,
                    justify_content: JustifyContent::Center,
                    ..default()
                },
                z_index: ZIndex::Global(10),
                ..default()
            },
        ))
        .with_children(|parent| {
            parent.spawn(
                TextBundle::from_section(message, text_style(36.0))
                    .with_text_justify(JustifyText::Center),
            );

            if let Some(label) = button {
                parent
                    .spawn((
                        OverlayButton,
                        ButtonBundle {
                            style: Style {
                                padding: UiRect::axes(Val::Px(24.0), Val::Px(12.0)),
                                ..default()
                            },
                            background_color: BackgroundColor(Color::srgb(0.2, 0.2, 0.3)),
                            ..default()
                        },
                    ))
                    .with_children(|button| {
                        button.spawn(TextBundle::from_section(label, text_style(28.0)));
                    });
            }
        });
}

fn despawn_overlay<T: Component>(mut commands: Commands, query: Query<Entity, With<T>>) {
    for entity in &query {
        commands.entity(entity).despawn_recursive();
    }
}

/// True on the frame the overlay button is clicked or `Enter` is pressed.
fn confirm_pressed(
    keyboard: &ButtonInput<KeyCode>,
    buttons: &Query<&Interaction, (Changed<Interaction>, With<OverlayButton>)>,
) -> bool {
    keyboard.just_pressed(KeyCode::Enter)
        || buttons
            .iter()
            .any(|interaction| *interaction == Interaction::Pressed)
}

fn spawn_pause_menu(mut commands: Commands) {
    spawn_overlay(
        &mut commands,
        PauseMenu,
        "PauseMenu",
        "Paused\nPress ESC to resume",
        None,
        0.6,
    );
}

fn show_proceed_prompt(
    mut commands: Commands,
    mut events: EventReader<PlayerEvent>,
    existing: Query<(), With<ProceedPanel>>,
) {
    let completed = events
        .read()
        .any(|event| *event == PlayerEvent::LevelComplete);
    if !completed || !existing.is_empty() {
        return;
    }

    spawn_overlay(
        &mut commands,
        ProceedPanel,
        "ProceedPanel",
        "All keys collected!",
        Some("Next level"),
        0.4,
    );
}

#[allow(clippy::too_many_arguments)]
fn handle_proceed(
    mut commands: Commands,
    keyboard: Res<ButtonInput<KeyCode>>,
    buttons: Query<&Interaction, (Changed<Interaction>, With<OverlayButton>)>,
    panels: Query<Entity, With<ProceedPanel>>,
    mut players: Query<&mut PlayerController, With<Player>>,
    level_config: Res<LevelConfig>,
    level_assets: Res<LevelAssets>,
    mut scene_requests: EventWriter<SceneTransitionRequest>,
) {
    if panels.is_empty() || !confirm_pressed(&keyboard, &buttons) {
        return;
    }

    let mut host = LevelHost {
        current: level_assets.scene_id(&level_config),
        requests: &mut scene_requests,
    };
    let requested = players
        .iter_mut()
        .any(|mut controller| controller.request_next_level(&mut host));
    if !requested {
        warn!("No next scene configured for '{}'.", host.current);
        return;
    }

    for entity in &panels {
        commands.entity(entity).despawn_recursive();
    }
}

fn spawn_game_over(mut commands: Commands) {
    spawn_overlay(
        &mut commands,
        GameOverScreen,
        "GameOverScreen",
        "Game Over",
        Some("Main menu"),
        0.7,
    );
}

fn leave_game_over(
    keyboard: Res<ButtonInput<KeyCode>>,
    buttons: Query<&Interaction, (Changed<Interaction>, With<OverlayButton>)>,
    mut scene_requests: EventWriter<SceneTransitionRequest>,
) {
    if confirm_pressed(&keyboard, &buttons) {
        scene_requests.send(SceneTransitionRequest(MAIN_MENU_SCENE.to_owned()));
    }
}

fn spawn_title_screen(mut commands: Commands) {
    spawn_overlay(
        &mut commands,
        TitleScreen,
        "TitleScreen",
        "Key Runner",
        Some("Start"),
        1.0,
    );
}

fn start_from_title(
    keyboard: Res<ButtonInput<KeyCode>>,
    buttons: Query<&Interaction, (Changed<Interaction>, With<OverlayButton>)>,
    config: Res<PlayerConfig>,
    mut level_config: ResMut<LevelConfig>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if !confirm_pressed(&keyboard, &buttons) {
        return;
    }

    level_config.start_level = config.levels.first_scene().map(str::to_owned);
    info!("Starting from {:?}.", level_config.start_level);
    next_state.set(GameState::Loading);
}

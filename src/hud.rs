//! In-game HUD: health, lives and key counters, plus the on-screen move/jump buttons.
//!
//! The controller writes into `HudText` through the `DisplaySink` trait; `sync_hud_text` copies
//! pending lines into the UI text entities. A line whose text entity does not exist is detached
//! and the controller skips it.

use bevy::prelude::*;

use crate::capabilities::{DisplaySink, Displays};
use crate::input::PlayerInput;
use crate::state::{GameSet, GameState};

pub struct HudPlugin;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<HudText>()
            .add_systems(OnEnter(GameState::Loading), despawn_hud)
            .add_systems(OnEnter(GameState::Title), despawn_hud)
            .add_systems(OnEnter(GameState::Playing), spawn_hud)
            .add_systems(
                Update,
                (
                    handle_touch_buttons
                        .before(GameSet::Input)
                        .run_if(in_state(GameState::Playing)),
                    sync_hud_text,
                ),
            );
    }
}

#[derive(Debug, Default)]
pub struct HudLine {
    attached: bool,
    pending: Option<String>,
}

impl HudLine {
    pub fn take_pending(&mut self) -> Option<String> {
        self.pending.take()
    }
}

impl DisplaySink for HudLine {
    fn display(&mut self, text: &str) {
        self.pending = Some(text.to_owned());
    }
}

#[derive(Resource, Debug, Default)]
pub struct HudText {
    pub health: HudLine,
    pub lives: HudLine,
    pub keys: HudLine,
}

impl HudText {
    pub fn displays(&mut self) -> Displays<'_> {
        fn attached(line: &mut HudLine) -> Option<&mut dyn DisplaySink> {
            if line.attached {
                Some(line)
            } else {
                None
            }
        }

        Displays {
            health: attached(&mut self.health),
            lives: attached(&mut self.lives),
            keys: attached(&mut self.keys),
        }
    }

    fn line_mut(&mut self, field: HudField) -> &mut HudLine {
        match field {
            HudField::Health => &mut self.health,
            HudField::Lives => &mut self.lives,
            HudField::Keys => &mut self.keys,
        }
    }
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HudField {
    Health,
    Lives,
    Keys,
}

#[derive(Component)]
struct HudRoot;

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
enum TouchButton {
    Left,
    Right,
    Jump,
}

fn spawn_hud(mut commands: Commands, existing: Query<(), With<HudRoot>>, mut hud: ResMut<HudText>) {
    if !existing.is_empty() {
        return;
    }

    let style = TextStyle {
        font_size: 24.0,
        color: Color::srgb(0.95, 0.95, 0.95),
        ..default()
    };

    commands
        .spawn((
            HudRoot,
            Name::new("Hud"),
            NodeBundle {
                style: Style {
                    position_type: PositionType::Absolute,
                    width: Val::Percent(100.0),
                    height: Val::Percent(100.0),
                    flex_direction: FlexDirection::Column,
                    justify_content: JustifyContent::SpaceBetween,
                    padding: UiRect::all(Val::Px(12.0)),
                    ..default()
                },
                ..default()
            },
        ))
        .with_children(|root| {
            root.spawn(NodeBundle {
                style: Style {
                    column_gap: Val::Px(24.0),
                    ..default()
                },
                ..default()
            })
            .with_children(|counters| {
                for field in [HudField::Health, HudField::Lives, HudField::Keys] {
                    counters.spawn((field, TextBundle::from_section("", style.clone())));
                }
            });

            root.spawn(NodeBundle {
                style: Style {
                    column_gap: Val::Px(12.0),
                    ..default()
                },
                ..default()
            })
            .with_children(|buttons| {
                for (button, label) in [
                    (TouchButton::Left, "<"),
                    (TouchButton::Right, ">"),
                    (TouchButton::Jump, "^"),
                ] {
                    buttons
                        .spawn((
                            button,
                            ButtonBundle {
                                style: Style {
                                    width: Val::Px(64.0),
                                    height: Val::Px(64.0),
                                    align_items: AlignItems::Center,
                                    justify_content: JustifyContent::Center,
                                    ..default()
                                },
                                background_color: BackgroundColor(Color::srgba(1.0, 1.0, 1.0, 0.15)),
                                ..default()
                            },
                        ))
                        .with_children(|parent| {
                            parent.spawn(TextBundle::from_section(label, style.clone()));
                        });
                }
            });
        });

    for field in [HudField::Health, HudField::Lives, HudField::Keys] {
        hud.line_mut(field).attached = true;
    }
}

fn despawn_hud(
    mut commands: Commands,
    query: Query<Entity, With<HudRoot>>,
    mut hud: ResMut<HudText>,
) {
    for entity in &query {
        commands.entity(entity).despawn_recursive();
    }
    *hud = HudText::default();
}

fn sync_hud_text(mut hud: ResMut<HudText>, mut texts: Query<(&HudField, &mut Text)>) {
    if !hud.is_changed() {
        return;
    }

    let hud = hud.bypass_change_detection();
    for (field, mut text) in &mut texts {
        if let Some(value) = hud.line_mut(*field).take_pending() {
            if let Some(section) = text.sections.first_mut() {
                section.value = value;
            }
        }
    }
}

/// Maps on-screen button presses to the input latch. Only state changes are seen, so a press
/// sets the hold and any other interaction releases it.
fn handle_touch_buttons(
    buttons: Query<(&Interaction, &TouchButton), Changed<Interaction>>,
    mut input: ResMut<PlayerInput>,
) {
    for (interaction, button) in &buttons {
        let pressed = *interaction == Interaction::Pressed;
        match button {
            TouchButton::Left => input.move_left(pressed),
            TouchButton::Right => input.move_right(pressed),
            TouchButton::Jump => {
                if pressed {
                    input.trigger_jump();
                }
            }
        }
    }
}

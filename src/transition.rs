//! Scene transitions with a fade to black.
//!
//! The player controller asks for a scene through `SceneHost`; `LevelHost` turns that into a
//! `SceneTransitionRequest` event. The fade switches scenes at its midpoint, when the screen is
//! fully black: a level identifier reloads the LDtk world, `mainmenu` goes to the title screen.

use bevy::prelude::*;

use crate::capabilities::SceneHost;
use crate::level::LevelConfig;
use crate::progression::MAIN_MENU_SCENE;
use crate::state::GameState;

pub struct TransitionPlugin;

impl Plugin for TransitionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TransitionState>()
            .add_event::<SceneTransitionRequest>()
            .add_systems(Startup, spawn_fade_overlay)
            .add_systems(
                Update,
                (begin_transition, update_transition, update_fade_overlay).chain(),
            );
    }
}

#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct SceneTransitionRequest(pub String);

/// `SceneHost` backed by the loaded level metadata and the transition event queue.
pub struct LevelHost<'a, 'w> {
    pub current: &'a str,
    pub requests: &'a mut EventWriter<'w, SceneTransitionRequest>,
}

impl SceneHost for LevelHost<'_, '_> {
    fn current_scene(&self) -> &str {
        self.current
    }

    fn request_scene_transition(&mut self, scene_id: &str) {
        self.requests.send(SceneTransitionRequest(scene_id.to_owned()));
    }
}

/// Fade progress. `timer` runs from 0 to `duration`; the scene switches at the halfway point.
#[derive(Resource, Debug)]
pub struct TransitionState {
    pub target: Option<String>,
    pub timer: f32,
    pub duration: f32,
    switched: bool,
}

impl Default for TransitionState {
    fn default() -> Self {
        Self {
            target: None,
            timer: 0.0,
            duration: 1.0,
            switched: false,
        }
    }
}

impl TransitionState {
    pub fn is_active(&self) -> bool {
        self.target.is_some()
    }

    /// Ignored while another transition is running.
    pub fn start(&mut self, scene_id: String) -> bool {
        if self.is_active() {
            return false;
        }

        self.target = Some(scene_id);
        self.timer = 0.0;
        self.switched = false;
        true
    }

    /// Advances the fade and returns the scene to switch to on the tick that crosses the
    /// midpoint.
    pub fn advance(&mut self, delta: f32) -> Option<String> {
        if !self.is_active() {
            return None;
        }

        self.timer += delta;
        let mut switch_to = None;
        if !self.switched && self.timer >= self.duration * 0.5 {
            self.switched = true;
            switch_to = self.target.clone();
        }

        if self.timer >= self.duration {
            self.target = None;
            self.timer = 0.0;
        }

        switch_to
    }

    /// 0.0 is transparent, 1.0 fully black.
    pub fn fade_alpha(&self) -> f32 {
        if !self.is_active() {
            return 0.0;
        }

        let half = self.duration * 0.5;
        let alpha = if self.timer < half {
            self.timer / half
        } else {
            1.0 - (self.timer - half) / half
        };
        alpha.clamp(0.0, 1.0)
    }
}

#[derive(Component)]
pub struct FadeOverlay;

fn spawn_fade_overlay(mut commands: Commands) {
    commands.spawn((
        FadeOverlay,
        Name::new("FadeOverlay"),
        NodeBundle {
            style: Style {
                position_type: PositionType::Absolute,
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                ..default()
            },
            background_color: BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.0)),
            z_index: ZIndex::Global(100),
            ..default()
        },
    ));
}

fn begin_transition(
    mut requests: EventReader<SceneTransitionRequest>,
    mut transition: ResMut<TransitionState>,
) {
    for SceneTransitionRequest(scene_id) in requests.read() {
        if transition.start(scene_id.clone()) {
            info!("Transitioning to scene '{}'.", scene_id);
        } else {
            debug!("Ignoring request for '{}' during a transition.", scene_id);
        }
    }
}

fn update_transition(
    time: Res<Time>,
    mut transition: ResMut<TransitionState>,
    mut next_state: ResMut<NextState<GameState>>,
    mut level_config: ResMut<LevelConfig>,
) {
    let Some(scene_id) = transition.advance(time.delta_seconds()) else {
        return;
    };

    if scene_id == MAIN_MENU_SCENE {
        next_state.set(GameState::Title);
    } else {
        level_config.start_level = Some(scene_id);
        next_state.set(GameState::Loading);
    }
}

fn update_fade_overlay(
    transition: Res<TransitionState>,
    mut overlay_query: Query<&mut BackgroundColor, With<FadeOverlay>>,
) {
    for mut background in &mut overlay_query {
        background.0 = Color::srgba(0.0, 0.0, 0.0, transition.fade_alpha());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switches_once_at_midpoint() {
        let mut transition = TransitionState::default();
        assert!(transition.start("level2".to_owned()));

        assert_eq!(transition.advance(0.25), None);
        assert!((transition.fade_alpha() - 0.5).abs() < 1e-6);
        assert_eq!(transition.advance(0.25), Some("level2".to_owned()));
        assert_eq!(transition.advance(0.25), None);
        assert!(transition.is_active());
        assert_eq!(transition.advance(0.25), None);
        assert!(!transition.is_active());
        assert_eq!(transition.fade_alpha(), 0.0);
    }

    #[test]
    fn second_request_is_ignored_while_fading() {
        let mut transition = TransitionState::default();
        assert!(transition.start("level2".to_owned()));
        assert!(!transition.start("level3".to_owned()));
        assert_eq!(transition.advance(0.6), Some("level2".to_owned()));
    }

    #[test]
    fn large_step_still_switches() {
        let mut transition = TransitionState::default();
        transition.start(MAIN_MENU_SCENE.to_owned());
        assert_eq!(transition.advance(2.0), Some(MAIN_MENU_SCENE.to_owned()));
        assert!(!transition.is_active());
    }
}

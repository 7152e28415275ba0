//! One-shot sound cues for player events.
//!
//! Handles are queued once at startup. Missing files only produce an asset-server warning; the
//! cue entity still despawns when playback ends.

use bevy::audio::{PlaybackSettings, Volume};
use bevy::prelude::*;

use crate::controller::PlayerEvent;

pub struct GameAudioPlugin;

impl Plugin for GameAudioPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AudioHandles>()
            .add_systems(Startup, load_audio_handles)
            .add_systems(Update, play_player_cues);
    }
}

#[derive(Resource, Default)]
pub struct AudioHandles {
    pub jump: Option<Handle<AudioSource>>,
    pub pickup: Option<Handle<AudioSource>>,
    pub hurt: Option<Handle<AudioSource>>,
}

impl AudioHandles {
    /// Clip for an event, if it has one.
    pub fn cue(&self, event: &PlayerEvent) -> Option<&Handle<AudioSource>> {
        match event {
            PlayerEvent::Jumped => self.jump.as_ref(),
            PlayerEvent::KeyCollected { .. } | PlayerEvent::Healed { .. } => self.pickup.as_ref(),
            PlayerEvent::Damaged { .. } => self.hurt.as_ref(),
            _ => None,
        }
    }
}

fn load_audio_handles(asset_server: Res<AssetServer>, mut handles: ResMut<AudioHandles>) {
    handles.jump = Some(asset_server.load("audio/jump.ogg"));
    handles.pickup = Some(asset_server.load("audio/pickup.ogg"));
    handles.hurt = Some(asset_server.load("audio/hurt.ogg"));

    debug!("Queued audio cues from assets/audio/.");
}

fn play_player_cues(
    mut commands: Commands,
    mut events: EventReader<PlayerEvent>,
    handles: Res<AudioHandles>,
) {
    for event in events.read() {
        let Some(source) = handles.cue(event) else {
            continue;
        };

        commands.spawn(AudioBundle {
            source: source.clone(),
            settings: PlaybackSettings::DESPAWN.with_volume(Volume::new(0.6)),
        });
    }
}

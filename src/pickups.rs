//! LDtk trigger entities (keys, hazards, hearts) and overlap detection against the player.
//!
//! Detection only produces events; what a pickup or hit does to the player is up to the
//! controller systems in `player.rs`.

use bevy::prelude::*;
use bevy_ecs_ldtk::prelude::*;

use crate::movement::Collider;
use crate::player::{Deactivated, Player};
use crate::state::{GameSet, GameState};

/// Trigger volume of a one-tile entity.
const TRIGGER_HALF_EXTENTS: Vec2 = Vec2::splat(8.0);
const DEFAULT_HAZARD_DAMAGE: u32 = 20;
const DEFAULT_HEART_HEAL: u32 = 25;

pub struct PickupPlugin;

impl Plugin for PickupPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<KeyEntered>()
            .add_event::<DamageApplied>()
            .add_event::<HealEntered>()
            .register_ldtk_entity::<KeyBundle>("Key")
            .register_ldtk_entity::<HazardBundle>("Hazard")
            .register_ldtk_entity::<HeartBundle>("Heart")
            .add_systems(
                Update,
                detect_player_overlaps
                    .in_set(GameSet::Triggers)
                    .run_if(in_state(GameState::Playing)),
            );
    }
}

#[derive(Component, Default)]
pub struct KeyPickup;

#[derive(Component, Debug, Clone, Copy)]
pub struct Hazard {
    pub damage: u32,
}

impl Default for Hazard {
    fn default() -> Self {
        Self {
            damage: DEFAULT_HAZARD_DAMAGE,
        }
    }
}

impl From<&EntityInstance> for Hazard {
    fn from(instance: &EntityInstance) -> Self {
        let damage = instance
            .get_int_field("damage")
            .ok()
            .and_then(|value| u32::try_from(*value).ok())
            .unwrap_or(DEFAULT_HAZARD_DAMAGE);
        Self { damage }
    }
}

#[derive(Component, Debug, Clone, Copy)]
pub struct HealthPickup {
    pub amount: u32,
}

impl Default for HealthPickup {
    fn default() -> Self {
        Self {
            amount: DEFAULT_HEART_HEAL,
        }
    }
}

impl From<&EntityInstance> for HealthPickup {
    fn from(instance: &EntityInstance) -> Self {
        let amount = instance
            .get_int_field("heal")
            .ok()
            .and_then(|value| u32::try_from(*value).ok())
            .unwrap_or(DEFAULT_HEART_HEAL);
        Self { amount }
    }
}

#[derive(Default, Bundle, LdtkEntity)]
struct KeyBundle {
    key: KeyPickup,
    #[sprite_bundle("textures/key.png")]
    sprite_bundle: SpriteBundle,
}

#[derive(Default, Bundle, LdtkEntity)]
struct HazardBundle {
    #[from_entity_instance]
    hazard: Hazard,
    #[sprite_bundle("textures/spikes.png")]
    sprite_bundle: SpriteBundle,
}

#[derive(Default, Bundle, LdtkEntity)]
struct HeartBundle {
    #[from_entity_instance]
    heart: HealthPickup,
    #[sprite_bundle("textures/heart.png")]
    sprite_bundle: SpriteBundle,
}

/// The player touched a key. `item` is despawned once the key is counted.
#[derive(Event, Debug, Clone, Copy)]
pub struct KeyEntered {
    pub item: Entity,
}

/// A hazard hit the player. `direction` points from the hazard to the player and is not
/// normalized.
#[derive(Event, Debug, Clone, Copy)]
pub struct DamageApplied {
    pub amount: u32,
    pub direction: Vec2,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct HealEntered {
    pub item: Entity,
    pub amount: u32,
}

pub fn overlaps(a_center: Vec2, a_half: Vec2, b_center: Vec2, b_half: Vec2) -> bool {
    let delta = (a_center - b_center).abs();
    delta.x < a_half.x + b_half.x && delta.y < a_half.y + b_half.y
}

fn detect_player_overlaps(
    player: Query<(&Transform, &Collider), (With<Player>, Without<Deactivated>)>,
    keys: Query<(Entity, &GlobalTransform), With<KeyPickup>>,
    hazards: Query<(&GlobalTransform, &Hazard)>,
    hearts: Query<(Entity, &GlobalTransform, &HealthPickup)>,
    mut key_events: EventWriter<KeyEntered>,
    mut damage_events: EventWriter<DamageApplied>,
    mut heal_events: EventWriter<HealEntered>,
) {
    let Ok((transform, collider)) = player.get_single() else {
        return;
    };
    let position = transform.translation.truncate();
    let touches = |other: &GlobalTransform| {
        overlaps(
            position,
            collider.half_extents,
            other.translation().truncate(),
            TRIGGER_HALF_EXTENTS,
        )
    };

    for (item, key_transform) in &keys {
        if touches(key_transform) {
            key_events.send(KeyEntered { item });
        }
    }

    for (hazard_transform, hazard) in &hazards {
        if touches(hazard_transform) {
            damage_events.send(DamageApplied {
                amount: hazard.damage,
                direction: position - hazard_transform.translation().truncate(),
            });
        }
    }

    for (item, heart_transform, heart) in &hearts {
        if touches(heart_transform) {
            heal_events.send(HealEntered {
                item,
                amount: heart.amount,
            });
        }
    }
}

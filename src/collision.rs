//! Tile collision map built from the LDtk IntGrid layer.
//!
//! Every non-zero IntGrid cell is solid for the kinematic integrator. The cell value doubles as
//! its classification (`1` ground, `2` wall) so the ground probe can filter by `LayerMask`.

use std::collections::HashMap;

use bevy::math::IVec2;
use bevy::prelude::*;
use bevy_ecs_ldtk::prelude::*;

use crate::capabilities::{BoxCast, ShapeCaster};
use crate::level::{LevelAssets, LevelConfig};

/// Gap kept between a resting body and the tile it rests against.
pub const SKIN: f32 = 0.001;

pub struct CollisionPlugin;

impl Plugin for CollisionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CollisionMap>().add_systems(
            PostUpdate,
            rebuild_collision_map
                .after(crate::level::sync_level_spatial)
                .in_set(CollisionSystems),
        );
    }
}

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollisionSystems;

#[derive(Resource, Default)]
pub struct CollisionMap {
    pub tile_size: Vec2,
    pub origin: Vec2,
    pub tiles: HashMap<IVec2, i32>,
}

impl CollisionMap {
    pub fn clear(&mut self) {
        self.tiles.clear();
    }

    pub fn insert(&mut self, tile: IVec2, value: i32) {
        if value > 0 {
            self.tiles.insert(tile, value);
        }
    }

    pub fn tile_value(&self, tile: IVec2) -> Option<i32> {
        self.tiles.get(&tile).copied()
    }

    pub fn is_solid(&self, tile: IVec2) -> bool {
        self.tiles.contains_key(&tile)
    }

    pub fn tile_at(&self, point: Vec2) -> IVec2 {
        ((point - self.origin) / self.tile_size).floor().as_ivec2()
    }
}

impl ShapeCaster for CollisionMap {
    fn box_cast(&self, cast: &BoxCast) -> bool {
        if self.tile_size.x <= 0.0 || self.tile_size.y <= 0.0 {
            return false;
        }

        // The swept volume of an axis-aligned box moving in a straight line is covered by the
        // bounds of its start and end boxes; casts here are axis-aligned so this is exact.
        let half = (cast.half_extents - Vec2::splat(SKIN)).max(Vec2::ZERO);
        let end = cast.origin + cast.direction.normalize_or_zero() * cast.max_distance.max(0.0);
        let min = self.tile_at(cast.origin.min(end) - half);
        let max = self.tile_at(cast.origin.max(end) + half);

        for ty in min.y..=max.y {
            for tx in min.x..=max.x {
                if let Some(value) = self.tile_value(IVec2::new(tx, ty)) {
                    if cast.layers.contains(value) {
                        return true;
                    }
                }
            }
        }

        false
    }
}

fn rebuild_collision_map(
    mut events: EventReader<LevelEvent>,
    int_cells: Query<(&GridCoords, &IntGridCell)>,
    config: Res<LevelConfig>,
    level_assets: Res<LevelAssets>,
    mut map: ResMut<CollisionMap>,
) {
    let mut needs_rebuild = false;
    let mut should_clear = false;

    for event in events.read() {
        match event {
            LevelEvent::Spawned(_) => needs_rebuild = true,
            LevelEvent::Despawned(_) => should_clear = true,
            _ => {}
        }
    }

    if should_clear {
        map.clear();
    }

    if !needs_rebuild {
        return;
    }

    map.tile_size = Vec2::splat(config.tile_size);
    map.origin = level_assets.level_origin.unwrap_or(Vec2::ZERO);
    map.clear();

    for (coords, cell) in &int_cells {
        map.insert(IVec2::new(coords.x, coords.y), cell.value);
    }

    let ground = map.tiles.values().filter(|value| **value == 1).count();
    debug!(
        "Collision map rebuilt: {} solid tiles, {} ground.",
        map.tiles.len(),
        ground
    );

    if ground == 0 {
        warn!(
            "Collision map has no ground tiles. Mark walkable tiles with IntGrid value 1 or the player can never jump."
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::LayerMask;

    fn map_with(tiles: &[(IVec2, i32)]) -> CollisionMap {
        let mut map = CollisionMap {
            tile_size: Vec2::splat(16.0),
            origin: Vec2::ZERO,
            ..default()
        };
        for (tile, value) in tiles {
            map.insert(*tile, *value);
        }
        map
    }

    fn down_from(origin: Vec2, layers: LayerMask) -> BoxCast {
        BoxCast {
            origin,
            half_extents: Vec2::splat(8.0),
            direction: Vec2::NEG_Y,
            max_distance: 0.1,
            layers,
        }
    }

    #[test]
    fn resting_body_hits_ground_below() {
        let map = map_with(&[(IVec2::new(0, 0), 1)]);
        let resting = Vec2::new(8.0, 16.0 + 8.0 + SKIN);
        assert!(map.box_cast(&down_from(resting, LayerMask::GROUND)));
    }

    #[test]
    fn body_above_tolerance_misses() {
        let map = map_with(&[(IVec2::new(0, 0), 1)]);
        let hovering = Vec2::new(8.0, 16.0 + 8.0 + 0.5);
        assert!(!map.box_cast(&down_from(hovering, LayerMask::GROUND)));
    }

    #[test]
    fn wall_tiles_are_filtered_out_of_ground_queries() {
        let map = map_with(&[(IVec2::new(0, 0), 2)]);
        let resting = Vec2::new(8.0, 16.0 + 8.0 + SKIN);
        assert!(!map.box_cast(&down_from(resting, LayerMask::GROUND)));
        assert!(map.box_cast(&down_from(resting, LayerMask::WALL)));
    }

    #[test]
    fn neighbouring_column_is_not_touched() {
        let map = map_with(&[(IVec2::new(1, 0), 1)]);
        let resting = Vec2::new(8.0 - SKIN, 16.0 + 8.0 + SKIN);
        assert!(!map.box_cast(&down_from(resting, LayerMask::GROUND)));
    }

    #[test]
    fn empty_cells_are_not_stored() {
        let map = map_with(&[(IVec2::new(3, 3), 0)]);
        assert!(!map.is_solid(IVec2::new(3, 3)));
        assert_eq!(map.tile_value(IVec2::new(3, 3)), None);
    }

    #[test]
    fn unconfigured_map_never_hits() {
        let mut map = CollisionMap::default();
        map.insert(IVec2::ZERO, 1);
        assert!(!map.box_cast(&down_from(Vec2::ZERO, LayerMask::GROUND)));
    }
}

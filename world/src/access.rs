//! Tile traversability for creatures with different movement abilities.

use std::fmt;

use keeper_core::{CreatureAbility, CreatureProfile, TerrainFlag, TerrainType, TileCoord};

use crate::rooms::RoomInstance;

/// Internal obstacle model of room instances, such as furniture blocking tiles.
pub trait RoomObstacles: fmt::Debug {
    /// Reports whether a creature can stand on the room tile.
    fn is_tile_accessible(&self, instance: &RoomInstance, tile: TileCoord) -> bool;
}

/// Obstacle model where every room tile is walkable.
#[derive(Clone, Copy, Debug, Default)]
pub struct OpenRooms;

impl RoomObstacles for OpenRooms {
    fn is_tile_accessible(&self, _instance: &RoomInstance, _tile: TileCoord) -> bool {
        true
    }
}

/// Decides whether `creature` may occupy a tile of `terrain`.
///
/// `room` is the instance covering the tile, when there is one.
pub(crate) fn is_accessible(
    terrain: &TerrainType,
    tile: TileCoord,
    room: Option<&RoomInstance>,
    creature: &CreatureProfile,
    obstacles: &dyn RoomObstacles,
) -> bool {
    if terrain.has(TerrainFlag::Solid) {
        return false;
    }
    if terrain.has(TerrainFlag::Room) {
        if let Some(instance) = room {
            return obstacles.is_tile_accessible(instance, tile);
        }
    }
    if creature.can(CreatureAbility::CanFly) {
        return true;
    }
    if terrain.has(TerrainFlag::Lava) && !creature.can(CreatureAbility::CanWalkOnLava) {
        return false;
    }
    if terrain.has(TerrainFlag::Water) && !creature.can(CreatureAbility::CanWalkOnWater) {
        return false;
    }
    true
}

//! Read-only terrain and room rule catalog.

use std::collections::BTreeMap;

use keeper_core::{LevelRules, RoomDefinition, RoomId, TerrainFlag, TerrainId, TerrainType};
use thiserror::Error;

/// Reasons a rule catalog fails validation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Two terrain records share an identifier.
    #[error("terrain {0:?} is defined more than once")]
    DuplicateTerrain(TerrainId),
    /// Two room records share an identifier.
    #[error("room {0:?} is defined more than once")]
    DuplicateRoom(RoomId),
    /// A record references a terrain that is not defined.
    #[error("{referenced_by} references unknown terrain {terrain:?}")]
    UnknownTerrain {
        /// Description of the referencing record.
        referenced_by: String,
        /// Terrain that could not be resolved.
        terrain: TerrainId,
    },
    /// A room uses a terrain without the room flag.
    #[error("room {room:?} uses terrain {terrain:?} which lacks the ROOM flag")]
    RoomTerrainNotFlagged {
        /// Offending room.
        room: RoomId,
        /// Terrain assigned to the room.
        terrain: TerrainId,
    },
    /// Two rooms claim the same terrain, so tiles cannot be mapped back.
    #[error("rooms {first:?} and {second:?} share terrain {terrain:?}")]
    SharedRoomTerrain {
        /// Terrain both rooms use.
        terrain: TerrainId,
        /// Room that registered the terrain first.
        first: RoomId,
        /// Room that tried to register it again.
        second: RoomId,
    },
}

/// Validated lookup tables over the level's terrain and room records.
#[derive(Clone, Debug)]
pub struct Catalog {
    terrains: BTreeMap<TerrainId, TerrainType>,
    rooms: BTreeMap<RoomId, RoomDefinition>,
    room_by_terrain: BTreeMap<TerrainId, RoomId>,
    rules: LevelRules,
}

impl Catalog {
    /// Builds a catalog, verifying that every cross reference resolves.
    pub fn new(
        terrains: Vec<TerrainType>,
        rooms: Vec<RoomDefinition>,
        rules: LevelRules,
    ) -> Result<Self, CatalogError> {
        let mut terrain_table = BTreeMap::new();
        for terrain in terrains {
            let id = terrain.id;
            if terrain_table.insert(id, terrain).is_some() {
                return Err(CatalogError::DuplicateTerrain(id));
            }
        }

        for terrain in terrain_table.values() {
            let referenced_by = format!("terrain {:?}", terrain.id);
            let references = [Some(terrain.destroyed_terrain), terrain.max_health_terrain];
            for reference in references.into_iter().flatten() {
                if !terrain_table.contains_key(&reference) {
                    return Err(CatalogError::UnknownTerrain {
                        referenced_by,
                        terrain: reference,
                    });
                }
            }
        }

        for (label, terrain) in [("water rule", rules.water), ("lava rule", rules.lava)] {
            if !terrain_table.contains_key(&terrain) {
                return Err(CatalogError::UnknownTerrain {
                    referenced_by: label.to_owned(),
                    terrain,
                });
            }
        }

        let mut room_table = BTreeMap::new();
        let mut room_by_terrain = BTreeMap::new();
        for room in rooms {
            let Some(terrain) = terrain_table.get(&room.terrain) else {
                return Err(CatalogError::UnknownTerrain {
                    referenced_by: format!("room {:?}", room.id),
                    terrain: room.terrain,
                });
            };
            if !terrain.has(TerrainFlag::Room) {
                return Err(CatalogError::RoomTerrainNotFlagged {
                    room: room.id,
                    terrain: room.terrain,
                });
            }
            if let Some(first) = room_by_terrain.insert(room.terrain, room.id) {
                return Err(CatalogError::SharedRoomTerrain {
                    terrain: room.terrain,
                    first,
                    second: room.id,
                });
            }
            let id = room.id;
            if room_table.insert(id, room).is_some() {
                return Err(CatalogError::DuplicateRoom(id));
            }
        }

        Ok(Self {
            terrains: terrain_table,
            rooms: room_table,
            room_by_terrain,
            rules,
        })
    }

    /// Looks up a terrain record.
    #[must_use]
    pub fn terrain(&self, id: TerrainId) -> Option<&TerrainType> {
        self.terrains.get(&id)
    }

    /// Looks up a room record.
    #[must_use]
    pub fn room(&self, id: RoomId) -> Option<&RoomDefinition> {
        self.rooms.get(&id)
    }

    /// Finds the room whose tiles carry the provided terrain.
    #[must_use]
    pub fn room_for_terrain(&self, terrain: TerrainId) -> Option<&RoomDefinition> {
        self.room_by_terrain
            .get(&terrain)
            .and_then(|room| self.rooms.get(room))
    }

    /// Level-wide rules.
    #[must_use]
    pub fn rules(&self) -> &LevelRules {
        &self.rules
    }

    /// Iterates over every room record ordered by identifier.
    pub fn rooms(&self) -> impl Iterator<Item = &RoomDefinition> {
        self.rooms.values()
    }
}

//! Terrain mutation engine.
//!
//! Every operation validates against the terrain flags of the current tile
//! before touching the map, then recomputes room walls, regenerates the room
//! instances around the change and reports dirty tiles. Illegal requests are
//! ignored.

use std::collections::BTreeSet;

use keeper_core::{
    BridgeTerrain, Event, PlayerId, RoomFlag, RoomId, RoomInstanceId, SelectionRect, TerrainFlag,
    TerrainId, TerrainType, TileCoord,
};

use crate::{
    gold::GoldControl,
    grid::{Tile, TileMap},
    rooms::{RoomInstance, RoomKey},
    Catalog, World,
};

/// Gold pulled out of a discarded room instance, waiting to be re-homed.
#[derive(Clone, Copy, Debug)]
struct DisplacedGold {
    owner: PlayerId,
    tile: TileCoord,
    amount: u32,
}

impl World {
    /// Snapshot of a tile together with its terrain record.
    pub(crate) fn inspect(&self, coord: TileCoord) -> Option<(Tile, &TerrainType)> {
        let tile = *self.tiles.tile(coord)?;
        let terrain = self.catalog.terrain(tile.terrain())?;
        Some((tile, terrain))
    }

    fn inspect_owned(&self, coord: TileCoord) -> Option<(Tile, TerrainType)> {
        self.inspect(coord)
            .map(|(tile, terrain)| (tile, terrain.clone()))
    }

    fn terrain_record(&self, id: TerrainId) -> Option<TerrainType> {
        self.catalog.terrain(id).cloned()
    }

    pub(crate) fn select_tiles(
        &mut self,
        area: SelectionRect,
        select: bool,
        player: PlayerId,
        out_events: &mut Vec<Event>,
    ) {
        let mut updated = BTreeSet::new();
        for coord in self.tiles.clip(area) {
            let taggable = self
                .inspect(coord)
                .is_some_and(|(_, terrain)| terrain.has(TerrainFlag::Taggable));
            if !taggable {
                continue;
            }
            self.tiles.set_selected(coord, player, select);
            let _ = updated.insert(coord);
        }

        for coord in &updated {
            self.notify(*coord, out_events);
        }
        self.update_tiles(updated, Vec::new(), out_events);
    }

    pub(crate) fn dig(&mut self, coord: TileCoord, out_events: &mut Vec<Event>) {
        let Some((_, terrain)) = self.inspect_owned(coord) else {
            return;
        };
        if terrain.has(TerrainFlag::Impenetrable) {
            tracing::debug!(?coord, "ignored dig on impenetrable terrain");
            return;
        }
        let Some(destroyed) = self.terrain_record(terrain.destroyed_terrain) else {
            return;
        };

        let recipient = self.catalog.rules().dig_gold_recipient;
        self.credit_player(recipient, terrain.gold_value, out_events);
        self.tiles.set_terrain(coord, &destroyed);

        self.update_room_walls(coord, out_events);
        let footprint = self.tiles.surrounding(coord, true);
        self.update_tiles(footprint, Vec::new(), out_events);
    }

    pub(crate) fn alter_terrain(
        &mut self,
        coord: TileCoord,
        terrain: TerrainId,
        owner: PlayerId,
        out_events: &mut Vec<Event>,
    ) {
        if self.tiles.tile(coord).is_none() {
            return;
        }
        let Some(record) = self.terrain_record(terrain) else {
            tracing::warn!(?coord, ?terrain, "ignored terrain change to unknown terrain");
            return;
        };

        self.tiles.set_terrain(coord, &record);
        if !owner.is_neutral() {
            self.tiles.set_owner(coord, owner);
        }

        self.update_room_walls(coord, out_events);
        let footprint = self.tiles.surrounding(coord, true);
        self.update_tiles(footprint, Vec::new(), out_events);
    }

    /// Reports whether `player` may claim the tile.
    ///
    /// Claims spread from owned territory: at least one edge neighbour must be
    /// owned by the player, ownable and not solid.
    pub(crate) fn is_claimable(&self, coord: TileCoord, player: PlayerId) -> bool {
        let Some((tile, terrain)) = self.inspect(coord) else {
            return false;
        };

        let eligible = if terrain.has(TerrainFlag::Room) || terrain.has(TerrainFlag::Ownable) {
            tile.owner() != player
        } else {
            terrain
                .max_health_terrain
                .is_some_and(|upgrade| upgrade != terrain.id)
        };
        if !eligible {
            return false;
        }

        self.tiles.neighbors(coord).any(|neighbor| {
            self.inspect(neighbor).is_some_and(|(tile, terrain)| {
                tile.owner() == player
                    && terrain.has(TerrainFlag::Ownable)
                    && !terrain.has(TerrainFlag::Solid)
            })
        })
    }

    pub(crate) fn claim_tile(
        &mut self,
        coord: TileCoord,
        player: PlayerId,
        out_events: &mut Vec<Event>,
    ) {
        if !self.is_claimable(coord, player) {
            tracing::debug!(?coord, ?player, "ignored claim on unclaimable tile");
            return;
        }
        let Some((tile, terrain)) = self.inspect_owned(coord) else {
            return;
        };

        if terrain.has(TerrainFlag::Room) {
            tracing::warn!(?coord, ?player, "claiming a whole room is not supported");
            return;
        }

        let next = if terrain.has(TerrainFlag::Ownable) {
            (tile.owner() != player).then_some(terrain.destroyed_terrain)
        } else {
            terrain.max_health_terrain
        };
        if let Some(record) = next.and_then(|id| self.terrain_record(id)) {
            self.tiles.set_terrain(coord, &record);
        }

        let ownable = self
            .inspect(coord)
            .is_some_and(|(_, terrain)| terrain.has(TerrainFlag::Ownable));
        if ownable {
            self.tiles.set_owner(coord, player);
        }

        self.update_room_walls(coord, out_events);
        let footprint = self.tiles.surrounding(coord, true);
        self.update_tiles(footprint, Vec::new(), out_events);
    }

    pub(crate) fn is_buildable(&self, coord: TileCoord, player: PlayerId, room: RoomId) -> bool {
        let Some(room) = self.catalog.room(room) else {
            return false;
        };
        if self.rooms.instance_at(coord).is_some() {
            return false;
        }
        let Some((tile, terrain)) = self.inspect(coord) else {
            return false;
        };

        let on_land = room.has(RoomFlag::PlaceableOnLand)
            && terrain.has(TerrainFlag::Ownable)
            && !terrain.has(TerrainFlag::Solid)
            && tile.owner() == player;
        let on_water = room.has(RoomFlag::PlaceableOnWater) && terrain.has(TerrainFlag::Water);
        let on_lava = room.has(RoomFlag::PlaceableOnLava) && terrain.has(TerrainFlag::Lava);
        on_land || on_water || on_lava
    }

    pub(crate) fn build(
        &mut self,
        area: SelectionRect,
        player: PlayerId,
        room: RoomId,
        out_events: &mut Vec<Event>,
    ) {
        let Some(definition) = self.catalog.room(room).cloned() else {
            tracing::warn!(?room, "ignored build of unknown room");
            return;
        };
        let Some(room_terrain) = self.terrain_record(definition.terrain) else {
            return;
        };

        let mut plots = BTreeSet::new();
        let mut footprint = BTreeSet::new();
        for coord in self.tiles.clip(area) {
            if !self.is_buildable(coord, player, room) {
                continue;
            }
            let bridge = self
                .inspect(coord)
                .and_then(|(_, terrain)| bridge_of(terrain));
            if let Some(bridge) = bridge {
                self.tiles.set_bridge(coord, bridge);
            }
            self.tiles.set_owner(coord, player);
            self.tiles.set_terrain(coord, &room_terrain);

            plots.extend(self.tiles.surrounding(coord, false));
            footprint.extend(self.tiles.surrounding(coord, true));
        }

        let adjacent: BTreeSet<RoomInstanceId> = plots
            .iter()
            .filter_map(|plot| self.rooms.instance_at(*plot))
            .filter(|instance| instance.room() == room && instance.owner() == player)
            .map(RoomInstance::id)
            .collect();
        for id in &adjacent {
            if let Some(instance) = self.rooms.get(*id) {
                for tile in instance.tiles() {
                    footprint.extend(self.tiles.surrounding(*tile, true));
                }
            }
        }

        tracing::debug!(?room, ?player, merged = adjacent.len(), "built room tiles");
        self.update_tiles(footprint, adjacent.into_iter().collect(), out_events);
    }

    pub(crate) fn is_sellable(&self, coord: TileCoord, player: PlayerId) -> bool {
        let owned = self
            .tiles
            .tile(coord)
            .is_some_and(|tile| tile.owner() == player);
        owned
            && self
                .rooms
                .instance_at(coord)
                .and_then(|instance| self.catalog.room(instance.room()))
                .is_some_and(|room| room.has(RoomFlag::Buildable))
    }

    pub(crate) fn sell(
        &mut self,
        area: SelectionRect,
        player: PlayerId,
        out_events: &mut Vec<Event>,
    ) {
        let mut sold = BTreeSet::new();
        let mut footprint = BTreeSet::new();
        for coord in self.tiles.clip(area) {
            if !self.is_sellable(coord, player) {
                continue;
            }
            let Some((tile, terrain)) = self.inspect_owned(coord) else {
                continue;
            };
            if terrain.has(TerrainFlag::Room) {
                if let Some(record) = self.sold_terrain(&tile, &terrain) {
                    self.tiles.set_terrain(coord, &record);
                }
            }
            if let Some(instance) = self.rooms.instance_at(coord) {
                let _ = sold.insert(instance.id());
            }
            footprint.extend(self.tiles.surrounding(coord, true));
        }

        for id in &sold {
            if let Some(instance) = self.rooms.get(*id) {
                for tile in instance.tiles() {
                    footprint.extend(self.tiles.surrounding(*tile, true));
                }
            }
        }

        tracing::debug!(?player, instances = sold.len(), "sold room tiles");
        self.update_tiles(footprint, sold.into_iter().collect(), out_events);
    }

    /// Terrain a sold room tile reverts to.
    fn sold_terrain(&self, tile: &Tile, terrain: &TerrainType) -> Option<TerrainType> {
        let room = self.catalog.room_for_terrain(terrain.id)?;
        let rules = self.catalog.rules();
        let reverted = if room.has(RoomFlag::PlaceableOnLand) {
            terrain.destroyed_terrain
        } else if tile.bridge() == Some(BridgeTerrain::Lava) {
            rules.lava
        } else {
            rules.water
        };
        self.terrain_record(reverted)
    }

    /// Damages a solid tile, mining gold seams first.
    ///
    /// Returns the gold extracted by the strike.
    ///
    /// # Panics
    ///
    /// Panics when the tile is not solid.
    pub(crate) fn damage_tile(
        &mut self,
        coord: TileCoord,
        player: PlayerId,
        out_events: &mut Vec<Event>,
    ) -> u32 {
        let Some((tile, terrain)) = self.inspect_owned(coord) else {
            return 0;
        };
        assert!(
            terrain.has(TerrainFlag::Solid),
            "only solid tiles can be damaged, {coord:?} carries {:?}",
            terrain.id
        );

        let rates = self.catalog.rules().rates;
        let damage = if terrain.has(TerrainFlag::Ownable) {
            if tile.owner() == player {
                rates.dig_own_wall
            } else {
                rates.dig_enemy_wall
            }
        } else if tile.gold() > 0 {
            if terrain.has(TerrainFlag::Impenetrable) {
                rates.gold_mined_from_gems
            } else {
                rates.mine_gold
            }
        } else {
            rates.dig_rock
        }
        .unsigned_abs();

        let (destroyed, mined) = if tile.gold() > 0 {
            let mined = self.tiles.mine_gold(coord, damage);
            (mined >= tile.gold(), mined)
        } else {
            (self.tiles.apply_damage(coord, damage), 0)
        };

        if mined > 0 {
            out_events.push(Event::GoldMined {
                tile: coord,
                player,
                amount: mined,
            });
        }

        if destroyed {
            if let Some(effect) = terrain.destroyed_effect {
                out_events.push(Event::TerrainEffect { tile: coord, effect });
            }
            if let Some(record) = self.terrain_record(terrain.destroyed_terrain) {
                self.tiles.set_terrain(coord, &record);
            }
            self.update_room_walls(coord, out_events);
            let footprint = self.tiles.surrounding(coord, true);
            self.update_tiles(footprint, Vec::new(), out_events);
            self.notify(coord, out_events);
        } else if terrain.has(TerrainFlag::Decay) {
            self.update_tiles(BTreeSet::from([coord]), Vec::new(), out_events);
        }

        mined
    }

    pub(crate) fn heal_tile(
        &mut self,
        coord: TileCoord,
        player: PlayerId,
        out_events: &mut Vec<Event>,
    ) {
        let Some((tile, terrain)) = self.inspect_owned(coord) else {
            return;
        };

        let rates = self.catalog.rules().rates;
        let healing = if terrain.has(TerrainFlag::Solid) {
            if !terrain.has(TerrainFlag::Ownable) {
                rates.reinforce_wall
            } else if tile.owner() == player {
                rates.repair_wall
            } else {
                rates.claim_tile
            }
        } else {
            rates.repair_tile
        }
        .unsigned_abs();

        if self.tiles.apply_healing(coord, healing, &terrain) {
            if let Some(effect) = terrain.max_health_effect {
                out_events.push(Event::TerrainEffect { tile: coord, effect });
            }
            if let Some(record) = terrain
                .max_health_terrain
                .and_then(|id| self.terrain_record(id))
            {
                self.tiles.set_terrain(coord, &record);
                self.tiles.set_owner(coord, player);
            }
            self.update_room_walls(coord, out_events);
            let footprint = self.tiles.surrounding(coord, true);
            self.update_tiles(footprint, Vec::new(), out_events);
            self.notify(coord, out_events);
        } else if terrain.has(TerrainFlag::Decay) {
            self.update_tiles(BTreeSet::from([coord]), Vec::new(), out_events);
        }
    }

    /// One step of a continuous claim: attacks foreign property, heals the rest.
    pub(crate) fn apply_claim(
        &mut self,
        coord: TileCoord,
        player: PlayerId,
        out_events: &mut Vec<Event>,
    ) {
        let Some((tile, terrain)) = self.inspect(coord) else {
            return;
        };
        let foreign = terrain.has(TerrainFlag::Ownable) && tile.owner() != player;
        let room = terrain.has(TerrainFlag::Room);
        let solid = terrain.has(TerrainFlag::Solid);

        if foreign && room {
            self.damage_room(coord, player, out_events);
        } else if foreign && solid {
            let _ = self.damage_tile(coord, player, out_events);
        } else {
            self.heal_tile(coord, player, out_events);
        }
    }

    /// Spreads damage over a room instance and converts it all at once.
    pub(crate) fn damage_room(
        &mut self,
        coord: TileCoord,
        player: PlayerId,
        out_events: &mut Vec<Event>,
    ) {
        let Some(instance) = self.rooms.instance_at(coord).cloned() else {
            tracing::debug!(?coord, "ignored room damage outside any room");
            return;
        };
        let Some(tile) = self.tiles.tile(coord).copied() else {
            return;
        };

        let rates = self.catalog.rules().rates;
        let damage = if tile.owner().is_neutral() {
            rates.convert_room
        } else {
            rates.attack_room
        };
        let size = i32::try_from(instance.tiles().len()).unwrap_or(i32::MAX).max(1);
        let per_tile = (damage / size).unsigned_abs();

        let converted = instance
            .tiles()
            .iter()
            .any(|member| self.tiles.apply_damage(*member, per_tile));
        if !converted {
            return;
        }

        for member in instance.tiles() {
            let Some(terrain) = self
                .tiles
                .tile(*member)
                .and_then(|tile| self.terrain_record(tile.terrain()))
            else {
                continue;
            };
            self.tiles.set_owner(*member, player);
            let _ = self.tiles.apply_healing(*member, u32::MAX, &terrain);
            self.notify(*member, out_events);
        }
        out_events.push(Event::RoomClaimed {
            instance: instance.id(),
            player,
        });
        tracing::debug!(instance = ?instance.id(), ?player, "room converted");

        let mut footprint = BTreeSet::new();
        for member in instance.tiles() {
            footprint.extend(self.tiles.surrounding(*member, true));
        }
        self.update_tiles(footprint, vec![instance.id()], out_events);
    }

    /// Queues wall recomputation for walled rooms bordering the tile.
    pub(crate) fn update_room_walls(&mut self, coord: TileCoord, out_events: &mut Vec<Event>) {
        let allows_walls = self
            .inspect(coord)
            .is_some_and(|(_, terrain)| terrain.has(TerrainFlag::AllowRoomWalls));
        if !allows_walls {
            return;
        }

        let instances: BTreeSet<RoomInstanceId> = self
            .tiles
            .surrounding(coord, false)
            .into_iter()
            .filter_map(|neighbor| self.rooms.instance_at(neighbor))
            .filter(|instance| {
                self.catalog
                    .room(instance.room())
                    .is_some_and(|room| room.has(RoomFlag::HasWalls))
            })
            .map(RoomInstance::id)
            .collect();

        if !instances.is_empty() {
            out_events.push(Event::RoomWallsInvalidated {
                instances: instances.into_iter().collect(),
            });
        }
    }

    /// Discards `discarded`, regenerates room instances over `footprint` and
    /// reports the footprint as dirty.
    pub(crate) fn update_tiles(
        &mut self,
        footprint: BTreeSet<TileCoord>,
        discarded: Vec<RoomInstanceId>,
        out_events: &mut Vec<Event>,
    ) {
        let mut displaced = Vec::new();
        for instance in self.rooms.remove_all(discarded) {
            self.retire_instance(&instance, &mut displaced, out_events);
        }
        self.rebuild_rooms(&footprint, displaced, out_events);

        if !footprint.is_empty() {
            out_events.push(Event::TilesUpdated {
                tiles: footprint.into_iter().collect(),
            });
        }
    }

    /// Rebuilds room instances over the footprint and re-homes displaced gold.
    fn rebuild_rooms(
        &mut self,
        footprint: &BTreeSet<TileCoord>,
        mut displaced: Vec<DisplacedGold>,
        out_events: &mut Vec<Event>,
    ) {
        let tiles = &self.tiles;
        let catalog = &self.catalog;
        let outcome = self.rooms.regenerate(tiles.columns(), tiles.rows(), footprint, |coord| {
            room_key(tiles, catalog, coord)
        });

        for instance in &outcome.removed {
            self.retire_instance(instance, &mut displaced, out_events);
        }

        for id in outcome.created {
            let Some(instance) = self.rooms.get(id) else {
                continue;
            };
            let storage = self
                .catalog
                .room(instance.room())
                .and_then(|room| room.gold_storage);
            if let Some(storage) = storage {
                self.gold.open(id, GoldControl::new(instance.tiles(), storage));
            }
            out_events.push(Event::RoomInstanceCreated {
                instance: id,
                room: instance.room(),
                owner: instance.owner(),
                tiles: instance.tiles().to_vec(),
            });
        }

        for gold in displaced {
            let target = self
                .rooms
                .instance_at(gold.tile)
                .filter(|instance| instance.owner() == gold.owner)
                .map(RoomInstance::id);
            let leftover = match target.and_then(|id| self.gold.control_mut(id)) {
                Some(control) => control.add_gold(gold.amount, Some(gold.tile)),
                None => gold.amount,
            };
            if leftover > 0 {
                tracing::debug!(tile = ?gold.tile, leftover, "displaced gold left loose");
                out_events.push(Event::GoldLeftOver {
                    player: gold.owner,
                    tile: Some(gold.tile),
                    amount: leftover,
                });
            }
        }
    }

    fn retire_instance(
        &mut self,
        instance: &RoomInstance,
        displaced: &mut Vec<DisplacedGold>,
        out_events: &mut Vec<Event>,
    ) {
        out_events.push(Event::RoomInstanceRemoved {
            instance: instance.id(),
        });
        if let Some(control) = self.gold.close(instance.id()) {
            displaced.extend(control.stored_tiles().map(|(tile, amount)| DisplacedGold {
                owner: instance.owner(),
                tile,
                amount,
            }));
        }
    }

    /// Reports a changed tile to the event stream and every listener.
    pub(crate) fn notify(&mut self, coord: TileCoord, out_events: &mut Vec<Event>) {
        out_events.push(Event::TileChanged { tile: coord });
        self.listeners.notify(coord);
    }
}

fn room_key(tiles: &TileMap, catalog: &Catalog, coord: TileCoord) -> Option<RoomKey> {
    let tile = tiles.tile(coord)?;
    let terrain = catalog.terrain(tile.terrain())?;
    if !terrain.has(TerrainFlag::Room) {
        return None;
    }
    let room = catalog.room_for_terrain(terrain.id)?;
    Some(RoomKey {
        room: room.id,
        owner: tile.owner(),
    })
}

fn bridge_of(terrain: &TerrainType) -> Option<BridgeTerrain> {
    if terrain.has(TerrainFlag::Water) {
        Some(BridgeTerrain::Water)
    } else if terrain.has(TerrainFlag::Lava) {
        Some(BridgeTerrain::Lava)
    } else {
        None
    }
}

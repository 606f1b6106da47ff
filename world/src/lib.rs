#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative dungeon world state.
//!
//! The world owns the tile map, the room instance index and the gold ledger.
//! All mutation flows through [`apply`]; everything else reads state through
//! the [`query`] module.

mod access;
mod catalog;
mod gold;
mod grid;
mod listeners;
mod navigation;
mod rooms;
mod terrain;

use std::collections::BTreeSet;

use keeper_core::{Command, Event, MapLayout, TerrainId, TileCoord, WELCOME_BANNER};
use thiserror::Error;

pub use access::{OpenRooms, RoomObstacles};
pub use catalog::{Catalog, CatalogError};
pub use grid::{Tile, TileMap};
pub use listeners::TileChangeListener;
pub use navigation::{BreadthFirstPaths, PathService};
pub use rooms::RoomInstance;

use gold::GoldLedger;
use listeners::ChangeListeners;
use rooms::RoomInstanceIndex;

/// Reasons a map layout cannot be turned into a world.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum WorldError {
    /// The number of tile seeds does not match the declared dimensions.
    #[error("layout declares {columns}x{rows} tiles but provides {provided}")]
    LayoutSize {
        /// Declared column count.
        columns: u32,
        /// Declared row count.
        rows: u32,
        /// Number of seeds actually provided.
        provided: usize,
    },
    /// A tile references a terrain missing from the catalog.
    #[error("tile {tile:?} uses unknown terrain {terrain:?}")]
    UnknownTerrain {
        /// Offending tile.
        tile: TileCoord,
        /// Terrain that could not be resolved.
        terrain: TerrainId,
    },
    /// A tile holds gold although its terrain is not a gold seam.
    #[error("tile {tile:?} holds {gold} gold but its terrain is not a gold seam")]
    GoldOutsideSeam {
        /// Offending tile.
        tile: TileCoord,
        /// Gold declared for the tile.
        gold: u32,
    },
}

/// Represents the authoritative dungeon world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    catalog: Catalog,
    tiles: TileMap,
    rooms: RoomInstanceIndex,
    gold: GoldLedger,
    obstacles: Box<dyn RoomObstacles>,
    listeners: ChangeListeners,
}

impl World {
    /// Creates a world from a validated catalog and a static layout.
    ///
    /// Room instances are discovered for every room tile of the layout.
    pub fn new(catalog: Catalog, layout: MapLayout) -> Result<Self, WorldError> {
        let MapLayout {
            columns,
            rows,
            tiles: seeds,
        } = layout;

        let expected = u64::from(columns) * u64::from(rows);
        if u64::try_from(seeds.len()).ok() != Some(expected) {
            return Err(WorldError::LayoutSize {
                columns,
                rows,
                provided: seeds.len(),
            });
        }

        let coords = (0..rows).flat_map(|y| (0..columns).map(move |x| TileCoord::new(x, y)));
        let mut tiles = Vec::with_capacity(seeds.len());
        for (coord, seed) in coords.zip(seeds) {
            let terrain = catalog
                .terrain(seed.terrain)
                .ok_or(WorldError::UnknownTerrain {
                    tile: coord,
                    terrain: seed.terrain,
                })?;
            if seed.gold > 0 && !terrain.is_gold_seam() {
                return Err(WorldError::GoldOutsideSeam {
                    tile: coord,
                    gold: seed.gold,
                });
            }
            tiles.push(grid::seed_tile(
                coord,
                terrain,
                seed.owner,
                seed.gold,
                seed.bridge,
            ));
        }

        let mut world = Self {
            banner: WELCOME_BANNER,
            catalog,
            tiles: TileMap::new(columns, rows, tiles),
            rooms: RoomInstanceIndex::default(),
            gold: GoldLedger::default(),
            obstacles: Box::new(OpenRooms),
            listeners: ChangeListeners::default(),
        };

        let everything: BTreeSet<TileCoord> = world.tiles.iter().map(Tile::coord).collect();
        let mut discovery = Vec::new();
        world.update_tiles(everything, Vec::new(), &mut discovery);

        tracing::info!(
            columns,
            rows,
            rooms = world.rooms.iter().count(),
            "world constructed"
        );
        Ok(world)
    }

    /// Registers a listener for tile changes; listeners run in registration order.
    pub fn add_listener<L>(&mut self, listener: L)
    where
        L: TileChangeListener + 'static,
    {
        self.listeners.register(Box::new(listener));
    }

    /// Replaces the obstacle model consulted for room tiles.
    pub fn set_room_obstacles<O>(&mut self, obstacles: O)
    where
        O: RoomObstacles + 'static,
    {
        self.obstacles = Box::new(obstacles);
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// # Panics
///
/// Panics when [`Command::DamageTile`] targets a tile that is not solid.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => out_events.push(Event::TimeAdvanced { dt }),
        Command::SelectTiles {
            area,
            select,
            player,
        } => world.select_tiles(area, select, player, out_events),
        Command::DigTile { tile } => world.dig(tile, out_events),
        Command::AlterTerrain {
            tile,
            terrain,
            owner,
        } => world.alter_terrain(tile, terrain, owner, out_events),
        Command::ClaimTile { tile, player } => world.claim_tile(tile, player, out_events),
        Command::Build { area, player, room } => world.build(area, player, room, out_events),
        Command::Sell { area, player } => world.sell(area, player, out_events),
        Command::DamageTile { tile, player } => {
            let _ = world.damage_tile(tile, player, out_events);
        }
        Command::HealTile { tile, player } => world.heal_tile(tile, player, out_events),
        Command::ApplyClaim { tile, player } => world.apply_claim(tile, player, out_events),
        Command::DamageRoom { tile, player } => world.damage_room(tile, player, out_events),
        Command::AddGold {
            player,
            tile,
            amount,
        } => {
            let _ = world.add_gold(player, tile, amount, out_events);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use keeper_core::{
        CreatureProfile, PlayerId, RoomId, RoomInstanceId, TerrainFlag, TerrainType, TileCoord,
    };
    use rand::Rng;

    use super::{access, navigation, Catalog, PathService, RoomInstance, Tile, TileMap, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Provides read-only access to the rule catalog.
    #[must_use]
    pub fn catalog(world: &World) -> &Catalog {
        &world.catalog
    }

    /// Provides read-only access to the tile map.
    #[must_use]
    pub fn tile_map(world: &World) -> &TileMap {
        &world.tiles
    }

    /// Returns the tile at the coordinate, or `None` outside the map.
    #[must_use]
    pub fn tile(world: &World, coord: TileCoord) -> Option<&Tile> {
        world.tiles.tile(coord)
    }

    /// Terrain record of the tile at the coordinate.
    #[must_use]
    pub fn terrain_at(world: &World, coord: TileCoord) -> Option<&TerrainType> {
        world.inspect(coord).map(|(_, terrain)| terrain)
    }

    /// Reports whether the tile can be tagged for digging.
    #[must_use]
    pub fn is_taggable(world: &World, coord: TileCoord) -> bool {
        has_flag(world, coord, TerrainFlag::Taggable)
    }

    /// Reports whether any player tagged the tile.
    #[must_use]
    pub fn is_selected(world: &World, coord: TileCoord) -> bool {
        world.tiles.tile(coord).is_some_and(Tile::is_selected)
    }

    /// Reports whether the player tagged the tile.
    #[must_use]
    pub fn is_selected_by(world: &World, coord: TileCoord, player: PlayerId) -> bool {
        world
            .tiles
            .tile(coord)
            .is_some_and(|tile| tile.is_selected_by(player))
    }

    /// Reports whether the player may place the room on the tile.
    #[must_use]
    pub fn is_buildable(world: &World, coord: TileCoord, player: PlayerId, room: RoomId) -> bool {
        world.is_buildable(coord, player, room)
    }

    /// Reports whether the player may claim the tile.
    #[must_use]
    pub fn is_claimable(world: &World, coord: TileCoord, player: PlayerId) -> bool {
        world.is_claimable(coord, player)
    }

    /// Reports whether the player may sell the room tile.
    #[must_use]
    pub fn is_sellable(world: &World, coord: TileCoord, player: PlayerId) -> bool {
        world.is_sellable(coord, player)
    }

    /// Reports whether the tile is a damaged wall the player should repair.
    #[must_use]
    pub fn is_repairable_wall(world: &World, coord: TileCoord, player: PlayerId) -> bool {
        world.inspect(coord).is_some_and(|(tile, terrain)| {
            !tile.is_selected_by(player)
                && tile.owner() == player
                && terrain.has(TerrainFlag::Solid)
                && terrain.has(TerrainFlag::Ownable)
                && !tile.is_at_full_health(terrain)
        })
    }

    /// Reports whether the tile is a wall the player may claim.
    #[must_use]
    pub fn is_claimable_wall(world: &World, coord: TileCoord, player: PlayerId) -> bool {
        has_flag(world, coord, TerrainFlag::Solid) && world.is_claimable(coord, player)
    }

    /// Reports whether the tile is a non-room tile the player may claim.
    #[must_use]
    pub fn is_claimable_tile(world: &World, coord: TileCoord, player: PlayerId) -> bool {
        world.inspect(coord).is_some()
            && !has_flag(world, coord, TerrainFlag::Room)
            && world.is_claimable(coord, player)
    }

    /// Reports whether the tile is a room tile the player may claim.
    #[must_use]
    pub fn is_claimable_room(world: &World, coord: TileCoord, player: PlayerId) -> bool {
        has_flag(world, coord, TerrainFlag::Room) && world.is_claimable(coord, player)
    }

    /// Reports whether the creature may occupy the tile.
    #[must_use]
    pub fn is_accessible(world: &World, coord: TileCoord, creature: &CreatureProfile) -> bool {
        world.inspect(coord).is_some_and(|(_, terrain)| {
            access::is_accessible(
                terrain,
                coord,
                world.rooms.instance_at(coord),
                creature,
                world.obstacles.as_ref(),
            )
        })
    }

    /// Room instance covering the tile, if any.
    #[must_use]
    pub fn room_instance_at(world: &World, coord: TileCoord) -> Option<&RoomInstance> {
        world.rooms.instance_at(coord)
    }

    /// Looks up a room instance by identifier.
    #[must_use]
    pub fn room_instance(world: &World, instance: RoomInstanceId) -> Option<&RoomInstance> {
        world.rooms.get(instance)
    }

    /// Iterates over every room instance in creation order.
    pub fn room_instances(world: &World) -> impl Iterator<Item = &RoomInstance> {
        world.rooms.iter()
    }

    /// Gold stored in the room instance, or `None` when it cannot store gold.
    #[must_use]
    pub fn stored_gold(world: &World, instance: RoomInstanceId) -> Option<u32> {
        world.gold.control(instance).map(|control| control.stored_gold())
    }

    /// Gold capacity of the room instance, or `None` when it cannot store gold.
    #[must_use]
    pub fn max_gold_capacity(world: &World, instance: RoomInstanceId) -> Option<u32> {
        world
            .gold
            .control(instance)
            .map(|control| control.max_capacity())
    }

    /// Gold stored on a single room tile.
    #[must_use]
    pub fn gold_at(world: &World, coord: TileCoord) -> u32 {
        world
            .rooms
            .instance_at(coord)
            .and_then(|instance| world.gold.control(instance.id()))
            .map_or(0, |control| control.gold_at(coord))
    }

    /// Total gold credited to the player.
    #[must_use]
    pub fn player_gold(world: &World, player: PlayerId) -> u64 {
        world.gold.total(player)
    }

    /// Finds a path for the creature using the provided path service.
    pub fn find_path(
        world: &World,
        paths: &mut dyn PathService,
        start: TileCoord,
        end: TileCoord,
        creature: &CreatureProfile,
    ) -> Option<Vec<TileCoord>> {
        let accessible = |coord: TileCoord| is_accessible(world, coord, creature);
        paths.find_path(
            world.tiles.columns(),
            world.tiles.rows(),
            start,
            end,
            &accessible,
        )
    }

    /// Picks a random accessible tile near `start`, excluding `start` itself.
    pub fn find_random_accessible_tile<R>(
        world: &World,
        start: TileCoord,
        radius: u32,
        creature: &CreatureProfile,
        rng: &mut R,
    ) -> Option<TileCoord>
    where
        R: Rng + ?Sized,
    {
        navigation::random_accessible_tile(
            start,
            radius,
            world.tiles.columns(),
            world.tiles.rows(),
            |coord| is_accessible(world, coord, creature),
            rng,
        )
    }

    fn has_flag(world: &World, coord: TileCoord, flag: TerrainFlag) -> bool {
        world
            .inspect(coord)
            .is_some_and(|(_, terrain)| terrain.has(flag))
    }
}

#![allow(dead_code)]

use keeper_core::{
    AccessibleTiles, BridgeTerrain, Command, EffectId, Event, GoldStorage, LevelRules, MapLayout,
    PlayerId, RoomDefinition, RoomFlag, RoomFlags, RoomId, RuleRates, TerrainFlag, TerrainFlags,
    TerrainId, TerrainType, TileCoord, TileSeed,
};
use keeper_world::{apply, query, Catalog, World};

pub const KEEPER: PlayerId = PlayerId::new(3);
pub const RIVAL: PlayerId = PlayerId::new(4);

pub const ROCK: TerrainId = TerrainId::new(1);
pub const GOLD: TerrainId = TerrainId::new(2);
pub const DIRT: TerrainId = TerrainId::new(3);
pub const FLOOR: TerrainId = TerrainId::new(4);
pub const WALL: TerrainId = TerrainId::new(5);
pub const TREASURY_TERRAIN: TerrainId = TerrainId::new(6);
pub const WATER: TerrainId = TerrainId::new(7);
pub const LAVA: TerrainId = TerrainId::new(8);
pub const BRIDGE_TERRAIN: TerrainId = TerrainId::new(9);
pub const GEMS: TerrainId = TerrainId::new(10);
pub const LAIR_TERRAIN: TerrainId = TerrainId::new(11);
pub const CRUMBLING: TerrainId = TerrainId::new(12);

pub const TREASURY: RoomId = RoomId::new(1);
pub const BRIDGE: RoomId = RoomId::new(2);
pub const LAIR: RoomId = RoomId::new(3);

pub const WALL_CRUMBLES: EffectId = EffectId::new(7);

fn flags(list: &[TerrainFlag]) -> TerrainFlags {
    list.iter().copied().collect()
}

fn terrain(
    id: TerrainId,
    name: &str,
    list: &[TerrainFlag],
    max_health: u32,
    destroyed_terrain: TerrainId,
) -> TerrainType {
    TerrainType {
        id,
        name: name.to_owned(),
        flags: flags(list),
        gold_value: 0,
        max_health,
        starting_health: max_health,
        destroyed_terrain,
        max_health_terrain: None,
        destroyed_effect: None,
        max_health_effect: None,
    }
}

pub fn terrains() -> Vec<TerrainType> {
    use TerrainFlag::*;

    let mut gold = terrain(GOLD, "gold", &[Solid, Taggable], 40, DIRT);
    gold.gold_value = 200;
    let mut dirt = terrain(DIRT, "dirt path", &[], 10, DIRT);
    dirt.max_health_terrain = Some(FLOOR);
    let mut wall = terrain(
        WALL,
        "reinforced wall",
        &[Solid, Ownable, Taggable, AllowRoomWalls],
        50,
        DIRT,
    );
    wall.destroyed_effect = Some(WALL_CRUMBLES);
    let mut gems = terrain(GEMS, "gems", &[Solid, Impenetrable], 100, GEMS);
    gems.gold_value = 1;

    vec![
        terrain(ROCK, "rock", &[Solid, Taggable, AllowRoomWalls], 40, DIRT),
        gold,
        dirt,
        terrain(FLOOR, "claimed floor", &[Ownable], 20, DIRT),
        wall,
        terrain(TREASURY_TERRAIN, "treasury", &[Room, Ownable], 10, FLOOR),
        terrain(WATER, "water", &[Water], 0, WATER),
        terrain(LAVA, "lava", &[Lava], 0, LAVA),
        terrain(BRIDGE_TERRAIN, "bridge", &[Room, Ownable], 10, WATER),
        gems,
        terrain(LAIR_TERRAIN, "lair", &[Room, Ownable], 10, FLOOR),
        terrain(CRUMBLING, "crumbling rock", &[Solid, Taggable, Decay], 40, DIRT),
    ]
}

pub fn rooms() -> Vec<RoomDefinition> {
    vec![
        RoomDefinition {
            id: TREASURY,
            name: "treasury".to_owned(),
            terrain: TREASURY_TERRAIN,
            flags: RoomFlags::empty()
                .with(RoomFlag::HasWalls)
                .with(RoomFlag::Buildable)
                .with(RoomFlag::PlaceableOnLand),
            gold_storage: Some(GoldStorage {
                gold_per_tile: 100,
                accessible_tiles: AccessibleTiles::AllTiles,
            }),
        },
        RoomDefinition {
            id: BRIDGE,
            name: "bridge".to_owned(),
            terrain: BRIDGE_TERRAIN,
            flags: RoomFlags::empty()
                .with(RoomFlag::Buildable)
                .with(RoomFlag::PlaceableOnWater)
                .with(RoomFlag::PlaceableOnLava),
            gold_storage: None,
        },
        RoomDefinition {
            id: LAIR,
            name: "lair".to_owned(),
            terrain: LAIR_TERRAIN,
            flags: RoomFlags::empty()
                .with(RoomFlag::Buildable)
                .with(RoomFlag::PlaceableOnLand),
            gold_storage: None,
        },
    ]
}

pub fn catalog(rates: RuleRates) -> Catalog {
    Catalog::new(
        terrains(),
        rooms(),
        LevelRules {
            water: WATER,
            lava: LAVA,
            dig_gold_recipient: KEEPER,
            rates,
        },
    )
    .expect("fixture catalog is valid")
}

/// Parses an ASCII map.
///
/// `#` rock, `%` crumbling rock, `$` gold seam (100 gold), `*` gems, `.` dirt, `_`/`,` floor of
/// keeper/rival, `W`/`w` walls, `T`/`t` treasuries, `L` keeper lair,
/// `~` water, `^` lava, `=` keeper bridge over water.
pub fn layout(rows: &[&str]) -> MapLayout {
    let columns = rows.first().map_or(0, |row| row.len()) as u32;
    let mut layout = MapLayout::filled(columns, rows.len() as u32, TileSeed::new(ROCK));
    for (y, row) in rows.iter().enumerate() {
        for (x, symbol) in row.chars().enumerate() {
            let seed = match symbol {
                '#' => TileSeed::new(ROCK),
                '%' => TileSeed::new(CRUMBLING),
                '$' => TileSeed::new(GOLD).with_gold(100),
                '*' => TileSeed::new(GEMS).with_gold(1_000),
                '.' => TileSeed::new(DIRT),
                '_' => TileSeed::new(FLOOR).owned_by(KEEPER),
                ',' => TileSeed::new(FLOOR).owned_by(RIVAL),
                'W' => TileSeed::new(WALL).owned_by(KEEPER),
                'w' => TileSeed::new(WALL).owned_by(RIVAL),
                'T' => TileSeed::new(TREASURY_TERRAIN).owned_by(KEEPER),
                't' => TileSeed::new(TREASURY_TERRAIN).owned_by(RIVAL),
                'L' => TileSeed::new(LAIR_TERRAIN).owned_by(KEEPER),
                '~' => TileSeed::new(WATER),
                '^' => TileSeed::new(LAVA),
                '=' => TileSeed {
                    terrain: BRIDGE_TERRAIN,
                    owner: KEEPER,
                    gold: 0,
                    bridge: Some(BridgeTerrain::Water),
                },
                other => panic!("unknown map symbol {other:?}"),
            };
            layout.set(TileCoord::new(x as u32, y as u32), seed);
        }
    }
    layout
}

pub fn world(rows: &[&str]) -> World {
    world_with_rates(rows, RuleRates::default())
}

pub fn world_with_rates(rows: &[&str], rates: RuleRates) -> World {
    World::new(catalog(rates), layout(rows)).expect("fixture world is valid")
}

pub fn run(world: &mut World, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    apply(world, command, &mut events);
    events
}

pub fn at(x: u32, y: u32) -> TileCoord {
    TileCoord::new(x, y)
}

pub fn terrain_of(world: &World, tile: TileCoord) -> TerrainId {
    query::tile(world, tile).expect("tile exists").terrain()
}

pub fn owner_of(world: &World, tile: TileCoord) -> PlayerId {
    query::tile(world, tile).expect("tile exists").owner()
}

pub fn health_of(world: &World, tile: TileCoord) -> u32 {
    query::tile(world, tile).expect("tile exists").health()
}

pub fn changed_tiles(events: &[Event]) -> Vec<TileCoord> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::TileChanged { tile } => Some(*tile),
            _ => None,
        })
        .collect()
}

/// Asserts that no two adjacent tiles of the same room and owner sit in different instances.
pub fn assert_rooms_are_maximal(world: &World) {
    let map = query::tile_map(world);
    for tile in map.iter() {
        let coord = tile.coord();
        let terrain = query::terrain_at(world, coord).expect("terrain exists");
        let instance = query::room_instance_at(world, coord);
        if terrain.has(TerrainFlag::Room) {
            let instance = instance.unwrap_or_else(|| panic!("room tile {coord:?} has no instance"));
            assert_eq!(instance.owner(), tile.owner(), "owner mismatch at {coord:?}");
        } else {
            assert!(instance.is_none(), "non-room tile {coord:?} has an instance");
        }

        for neighbor in [at(coord.x() + 1, coord.y()), at(coord.x(), coord.y() + 1)] {
            let Some(other) = query::tile(world, neighbor) else {
                continue;
            };
            let same_key = other.terrain() == tile.terrain() && other.owner() == tile.owner();
            if !same_key || !terrain.has(TerrainFlag::Room) {
                continue;
            }
            assert_eq!(
                query::room_instance_at(world, coord).map(|room| room.id()),
                query::room_instance_at(world, neighbor).map(|room| room.id()),
                "{coord:?} and {neighbor:?} belong to different instances"
            );
        }
    }
}

/// Asserts that every tile keeps its health inside the terrain's range.
pub fn assert_health_in_range(world: &World) {
    for tile in query::tile_map(world).iter() {
        let terrain = query::terrain_at(world, tile.coord()).expect("terrain exists");
        assert!(
            tile.health() <= terrain.max_health,
            "{:?} has {} health above {}",
            tile.coord(),
            tile.health(),
            terrain.max_health
        );
        if tile.gold() > 0 {
            assert!(terrain.is_gold_seam(), "{:?} holds gold off a seam", tile.coord());
        }
    }
}

//! Dense tile storage owned by the world.
//!
//! The map is a passive store: it validates coordinates and keeps per-tile
//! values inside their legal ranges, but never notifies anyone. Callers in
//! the mutation engine decide which tiles are marked dirty afterwards.

use std::collections::BTreeSet;

use keeper_core::{BridgeTerrain, PlayerId, SelectionRect, TerrainId, TerrainType, TileCoord};

/// Mutable state of a single map tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tile {
    coord: TileCoord,
    terrain: TerrainId,
    owner: PlayerId,
    health: u32,
    gold: u32,
    selection: [u64; SELECTION_WORDS],
    bridge: Option<BridgeTerrain>,
}

impl Tile {
    /// Location of the tile.
    #[must_use]
    pub const fn coord(&self) -> TileCoord {
        self.coord
    }

    /// Terrain currently carried by the tile.
    #[must_use]
    pub const fn terrain(&self) -> TerrainId {
        self.terrain
    }

    /// Current owner; [`PlayerId::NEUTRAL`] when unowned.
    #[must_use]
    pub const fn owner(&self) -> PlayerId {
        self.owner
    }

    /// Remaining structural health.
    #[must_use]
    pub const fn health(&self) -> u32 {
        self.health
    }

    /// Gold remaining in the tile.
    #[must_use]
    pub const fn gold(&self) -> u32 {
        self.gold
    }

    /// Liquid underneath the tile when it hosts a bridge.
    #[must_use]
    pub const fn bridge(&self) -> Option<BridgeTerrain> {
        self.bridge
    }

    /// Reports whether any player tagged the tile.
    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.selection.iter().any(|word| *word != 0)
    }

    /// Reports whether the provided player tagged the tile.
    #[must_use]
    pub fn is_selected_by(&self, player: PlayerId) -> bool {
        let (word, bit) = selection_slot(player);
        self.selection[word] & bit != 0
    }

    /// Reports whether the tile is at the maximum health of its terrain.
    #[must_use]
    pub fn is_at_full_health(&self, terrain: &TerrainType) -> bool {
        self.health >= terrain.max_health
    }
}

/// Fixed-size grid of tiles in row-major order.
#[derive(Clone, Debug)]
pub struct TileMap {
    columns: u32,
    rows: u32,
    tiles: Vec<Tile>,
}

impl TileMap {
    pub(crate) fn new(columns: u32, rows: u32, tiles: Vec<Tile>) -> Self {
        Self {
            columns,
            rows,
            tiles,
        }
    }

    /// Number of tile columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of tile rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Returns the tile at the coordinate, or `None` outside the map.
    #[must_use]
    pub fn tile(&self, coord: TileCoord) -> Option<&Tile> {
        self.index(coord).and_then(|index| self.tiles.get(index))
    }

    /// Iterates over every tile in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    /// Converts the tile to a new terrain.
    ///
    /// Health restarts at the terrain's starting health and gold is dropped
    /// unless the new terrain is a gold seam.
    pub(crate) fn set_terrain(&mut self, coord: TileCoord, terrain: &TerrainType) {
        if let Some(tile) = self.tile_mut(coord) {
            tile.terrain = terrain.id;
            tile.health = terrain.starting_health.min(terrain.max_health);
            if !terrain.is_gold_seam() {
                tile.gold = 0;
            }
        }
    }

    pub(crate) fn set_owner(&mut self, coord: TileCoord, owner: PlayerId) {
        if let Some(tile) = self.tile_mut(coord) {
            tile.owner = owner;
        }
    }

    pub(crate) fn set_bridge(&mut self, coord: TileCoord, bridge: BridgeTerrain) {
        if let Some(tile) = self.tile_mut(coord) {
            tile.bridge = Some(bridge);
        }
    }

    pub(crate) fn set_selected(&mut self, coord: TileCoord, player: PlayerId, selected: bool) {
        let (word, bit) = selection_slot(player);
        if let Some(tile) = self.tile_mut(coord) {
            if selected {
                tile.selection[word] |= bit;
            } else {
                tile.selection[word] &= !bit;
            }
        }
    }

    /// Removes health from the tile, returning `true` once it reaches zero.
    pub(crate) fn apply_damage(&mut self, coord: TileCoord, damage: u32) -> bool {
        match self.tile_mut(coord) {
            Some(tile) => {
                tile.health = tile.health.saturating_sub(damage);
                tile.health == 0
            }
            None => false,
        }
    }

    /// Adds health to the tile, returning `true` when it sits at full health.
    pub(crate) fn apply_healing(
        &mut self,
        coord: TileCoord,
        healing: u32,
        terrain: &TerrainType,
    ) -> bool {
        match self.tile_mut(coord) {
            Some(tile) => {
                tile.health = tile.health.saturating_add(healing).min(terrain.max_health);
                tile.is_at_full_health(terrain)
            }
            None => false,
        }
    }

    /// Extracts up to `amount` gold from the tile, returning what was mined.
    pub(crate) fn mine_gold(&mut self, coord: TileCoord, amount: u32) -> u32 {
        match self.tile_mut(coord) {
            Some(tile) => {
                let mined = tile.gold.min(amount);
                tile.gold -= mined;
                mined
            }
            None => 0,
        }
    }

    /// Tiles of the selection that lie inside the map.
    pub(crate) fn clip(&self, area: SelectionRect) -> Vec<TileCoord> {
        area.tiles()
            .filter(|coord| coord.x() < self.columns && coord.y() < self.rows)
            .collect()
    }

    /// The four edge-adjacent neighbours inside the map.
    pub(crate) fn neighbors(&self, coord: TileCoord) -> impl Iterator<Item = TileCoord> {
        neighbors(coord, self.columns, self.rows)
    }

    /// The tile itself plus its neighbours, optionally including diagonals.
    pub(crate) fn surrounding(&self, coord: TileCoord, diagonal: bool) -> BTreeSet<TileCoord> {
        let mut tiles = BTreeSet::new();
        if self.tile(coord).is_none() {
            return tiles;
        }
        let _ = tiles.insert(coord);
        tiles.extend(self.neighbors(coord));
        if diagonal {
            for (dx, dy) in [(-1, -1), (1, -1), (-1, 1), (1, 1)] {
                if let Some(corner) = offset(coord, dx, dy, self.columns, self.rows) {
                    let _ = tiles.insert(corner);
                }
            }
        }
        tiles
    }

    fn tile_mut(&mut self, coord: TileCoord) -> Option<&mut Tile> {
        self.index(coord).and_then(|index| self.tiles.get_mut(index))
    }

    fn index(&self, coord: TileCoord) -> Option<usize> {
        if coord.x() < self.columns && coord.y() < self.rows {
            let row = usize::try_from(coord.y()).ok()?;
            let column = usize::try_from(coord.x()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            row.checked_mul(width)?.checked_add(column)
        } else {
            None
        }
    }
}

/// Creates a tile with clamped health for the level loader.
pub(crate) fn seed_tile(
    coord: TileCoord,
    terrain: &TerrainType,
    owner: PlayerId,
    gold: u32,
    bridge: Option<BridgeTerrain>,
) -> Tile {
    Tile {
        coord,
        terrain: terrain.id,
        owner,
        health: terrain.starting_health.min(terrain.max_health),
        gold,
        selection: [0; SELECTION_WORDS],
        bridge,
    }
}

/// Edge-adjacent neighbours of a coordinate within `columns` x `rows`.
pub(crate) fn neighbors(
    coord: TileCoord,
    columns: u32,
    rows: u32,
) -> impl Iterator<Item = TileCoord> {
    let mut candidates = [None; 4];
    let mut count = 0;

    if let Some(y) = coord.y().checked_sub(1) {
        candidates[count] = Some(TileCoord::new(coord.x(), y));
        count += 1;
    }

    if let Some(x) = coord.x().checked_add(1) {
        if x < columns {
            candidates[count] = Some(TileCoord::new(x, coord.y()));
            count += 1;
        }
    }

    if let Some(y) = coord.y().checked_add(1) {
        if y < rows {
            candidates[count] = Some(TileCoord::new(coord.x(), y));
            count += 1;
        }
    }

    if let Some(x) = coord.x().checked_sub(1) {
        candidates[count] = Some(TileCoord::new(x, coord.y()));
        count += 1;
    }

    candidates.into_iter().take(count).flatten()
}

fn offset(coord: TileCoord, dx: i64, dy: i64, columns: u32, rows: u32) -> Option<TileCoord> {
    let x = u32::try_from(i64::from(coord.x()) + dx).ok()?;
    let y = u32::try_from(i64::from(coord.y()) + dy).ok()?;
    (x < columns && y < rows).then(|| TileCoord::new(x, y))
}

/// Every `u8` player id gets its own bit.
const SELECTION_WORDS: usize = 4;

fn selection_slot(player: PlayerId) -> (usize, u64) {
    let id = player.get();
    (usize::from(id / 64), 1u64 << (id % 64))
}

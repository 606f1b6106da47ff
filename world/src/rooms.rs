//! Room instance index: maps tiles to the connected room regions covering them.
//!
//! Instances are never patched in place. Whenever tiles change, every
//! instance touching the changed footprint is checked against a fresh
//! flood fill and discarded if it no longer matches; the footprint is then
//! re-covered with newly discovered instances.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use keeper_core::{PlayerId, RoomId, RoomInstanceId, TileCoord};

use crate::grid::neighbors;

/// Grouping key of a room tile: room type plus owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct RoomKey {
    pub(crate) room: RoomId,
    pub(crate) owner: PlayerId,
}

/// Maximal connected group of same-type, same-owner room tiles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoomInstance {
    id: RoomInstanceId,
    room: RoomId,
    owner: PlayerId,
    tiles: Vec<TileCoord>,
}

impl RoomInstance {
    /// Identifier allocated by the world.
    #[must_use]
    pub const fn id(&self) -> RoomInstanceId {
        self.id
    }

    /// Room type shared by every tile.
    #[must_use]
    pub const fn room(&self) -> RoomId {
        self.room
    }

    /// Owner shared by every tile.
    #[must_use]
    pub const fn owner(&self) -> PlayerId {
        self.owner
    }

    /// Member tiles in row-major order.
    #[must_use]
    pub fn tiles(&self) -> &[TileCoord] {
        &self.tiles
    }

    /// Reports whether the tile belongs to the instance.
    #[must_use]
    pub fn contains(&self, tile: TileCoord) -> bool {
        self.tiles.contains(&tile)
    }

    fn key(&self) -> RoomKey {
        RoomKey {
            room: self.room,
            owner: self.owner,
        }
    }
}

/// Instances dropped and discovered by a regeneration pass.
#[derive(Debug, Default)]
pub(crate) struct Regeneration {
    pub(crate) removed: Vec<RoomInstance>,
    pub(crate) created: Vec<RoomInstanceId>,
}

/// Coordinate to instance lookup plus instance storage.
#[derive(Debug, Default)]
pub(crate) struct RoomInstanceIndex {
    instances: BTreeMap<RoomInstanceId, RoomInstance>,
    by_tile: HashMap<TileCoord, RoomInstanceId>,
    next_id: u32,
}

impl RoomInstanceIndex {
    pub(crate) fn instance_at(&self, tile: TileCoord) -> Option<&RoomInstance> {
        self.by_tile
            .get(&tile)
            .and_then(|id| self.instances.get(id))
    }

    pub(crate) fn get(&self, id: RoomInstanceId) -> Option<&RoomInstance> {
        self.instances.get(&id)
    }

    /// Instances in creation order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &RoomInstance> {
        self.instances.values()
    }

    /// Discards the listed instances, returning them in identifier order.
    pub(crate) fn remove_all(
        &mut self,
        ids: impl IntoIterator<Item = RoomInstanceId>,
    ) -> Vec<RoomInstance> {
        let ids: BTreeSet<RoomInstanceId> = ids.into_iter().collect();
        ids.into_iter().filter_map(|id| self.remove(id)).collect()
    }

    /// Rebuilds the instances covering `footprint`.
    ///
    /// `key_at` reports the grouping key of a tile, or `None` for tiles that
    /// are not room tiles.
    pub(crate) fn regenerate<F>(
        &mut self,
        columns: u32,
        rows: u32,
        footprint: &BTreeSet<TileCoord>,
        key_at: F,
    ) -> Regeneration
    where
        F: Fn(TileCoord) -> Option<RoomKey>,
    {
        let mut outcome = Regeneration::default();

        let touched: BTreeSet<RoomInstanceId> = footprint
            .iter()
            .filter_map(|tile| self.by_tile.get(tile).copied())
            .collect();
        for id in touched {
            let Some(instance) = self.instances.get(&id) else {
                continue;
            };
            if !self.is_still_maximal(instance, columns, rows, &key_at) {
                outcome.removed.extend(self.remove(id));
            }
        }

        let mut candidates = footprint.clone();
        for instance in &outcome.removed {
            candidates.extend(instance.tiles.iter().copied());
        }

        for seed in candidates {
            if self.by_tile.contains_key(&seed) {
                continue;
            }
            let Some(key) = key_at(seed) else {
                continue;
            };

            let component = flood(seed, key, columns, rows, &key_at);
            let absorbed: BTreeSet<RoomInstanceId> = component
                .iter()
                .filter_map(|tile| self.by_tile.get(tile).copied())
                .collect();
            outcome.removed.extend(self.remove_all(absorbed));
            outcome.created.push(self.insert(key, component));
        }

        if !outcome.removed.is_empty() || !outcome.created.is_empty() {
            tracing::debug!(
                removed = outcome.removed.len(),
                created = outcome.created.len(),
                "regenerated room instances"
            );
        }

        outcome
    }

    fn is_still_maximal<F>(
        &self,
        instance: &RoomInstance,
        columns: u32,
        rows: u32,
        key_at: &F,
    ) -> bool
    where
        F: Fn(TileCoord) -> Option<RoomKey>,
    {
        let Some(first) = instance.tiles.first().copied() else {
            return false;
        };
        if key_at(first) != Some(instance.key()) {
            return false;
        }
        let component = flood(first, instance.key(), columns, rows, key_at);
        component.len() == instance.tiles.len()
            && component
                .iter()
                .all(|tile| self.by_tile.get(tile) == Some(&instance.id))
    }

    fn insert(&mut self, key: RoomKey, mut tiles: Vec<TileCoord>) -> RoomInstanceId {
        tiles.sort_by_key(|tile| (tile.y(), tile.x()));
        let id = RoomInstanceId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        for tile in &tiles {
            let _ = self.by_tile.insert(*tile, id);
        }
        let _ = self.instances.insert(
            id,
            RoomInstance {
                id,
                room: key.room,
                owner: key.owner,
                tiles,
            },
        );
        id
    }

    fn remove(&mut self, id: RoomInstanceId) -> Option<RoomInstance> {
        let instance = self.instances.remove(&id)?;
        for tile in &instance.tiles {
            if self.by_tile.get(tile) == Some(&id) {
                let _ = self.by_tile.remove(tile);
            }
        }
        Some(instance)
    }
}

/// Breadth-first discovery of the 4-connected same-key region around `seed`.
fn flood<F>(
    seed: TileCoord,
    key: RoomKey,
    columns: u32,
    rows: u32,
    key_at: &F,
) -> Vec<TileCoord>
where
    F: Fn(TileCoord) -> Option<RoomKey>,
{
    let mut visited = BTreeSet::new();
    let mut queue = VecDeque::new();
    let _ = visited.insert(seed);
    queue.push_back(seed);

    while let Some(tile) = queue.pop_front() {
        for neighbor in neighbors(tile, columns, rows) {
            if visited.contains(&neighbor) || key_at(neighbor) != Some(key) {
                continue;
            }
            let _ = visited.insert(neighbor);
            queue.push_back(neighbor);
        }
    }

    visited.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TREASURY: RoomId = RoomId::new(1);
    const LAIR: RoomId = RoomId::new(2);

    fn key(room: RoomId, owner: u8) -> RoomKey {
        RoomKey {
            room,
            owner: PlayerId::new(owner),
        }
    }

    /// Parses rows where `T`/`t` are treasury tiles of players 3/4, `L` a lair of player 3.
    fn layout(rows: &[&str]) -> HashMap<TileCoord, RoomKey> {
        let mut keys = HashMap::new();
        for (y, row) in rows.iter().enumerate() {
            for (x, symbol) in row.chars().enumerate() {
                let coord = TileCoord::new(x as u32, y as u32);
                let entry = match symbol {
                    'T' => Some(key(TREASURY, 3)),
                    't' => Some(key(TREASURY, 4)),
                    'L' => Some(key(LAIR, 3)),
                    _ => None,
                };
                if let Some(entry) = entry {
                    let _ = keys.insert(coord, entry);
                }
            }
        }
        keys
    }

    fn everything(columns: u32, rows: u32) -> BTreeSet<TileCoord> {
        (0..rows)
            .flat_map(|y| (0..columns).map(move |x| TileCoord::new(x, y)))
            .collect()
    }

    #[test]
    fn groups_by_room_and_owner() {
        let keys = layout(&["TTt", "L.t", "L.."]);
        let mut index = RoomInstanceIndex::default();
        let outcome = index.regenerate(3, 3, &everything(3, 3), |tile| keys.get(&tile).copied());

        assert_eq!(outcome.created.len(), 3);
        let treasury = index.instance_at(TileCoord::new(0, 0)).expect("treasury");
        assert_eq!(treasury.tiles(), &[TileCoord::new(0, 0), TileCoord::new(1, 0)]);
        let enemy = index.instance_at(TileCoord::new(2, 0)).expect("enemy treasury");
        assert_eq!(enemy.owner(), PlayerId::new(4));
        assert_eq!(enemy.tiles().len(), 2);
        let lair = index.instance_at(TileCoord::new(0, 2)).expect("lair");
        assert_eq!(lair.room(), LAIR);
    }

    #[test]
    fn joining_tile_merges_instances() {
        let mut keys = layout(&["T.T"]);
        let mut index = RoomInstanceIndex::default();
        let _ = index.regenerate(3, 1, &everything(3, 1), |tile| keys.get(&tile).copied());
        assert_eq!(index.iter().count(), 2);

        let _ = keys.insert(TileCoord::new(1, 0), key(TREASURY, 3));
        let footprint: BTreeSet<_> = [TileCoord::new(1, 0)].into_iter().collect();
        let outcome = index.regenerate(3, 1, &footprint, |tile| keys.get(&tile).copied());

        assert_eq!(outcome.removed.len(), 2);
        assert_eq!(outcome.created.len(), 1);
        let merged = index.instance_at(TileCoord::new(0, 0)).expect("merged");
        assert_eq!(merged.tiles().len(), 3);
    }

    #[test]
    fn removing_middle_tile_splits_instance() {
        let mut keys = layout(&["TTT"]);
        let mut index = RoomInstanceIndex::default();
        let _ = index.regenerate(3, 1, &everything(3, 1), |tile| keys.get(&tile).copied());

        let _ = keys.remove(&TileCoord::new(1, 0));
        let footprint: BTreeSet<_> = [TileCoord::new(1, 0)].into_iter().collect();
        let outcome = index.regenerate(3, 1, &footprint, |tile| keys.get(&tile).copied());

        assert_eq!(outcome.removed.len(), 1);
        assert_eq!(outcome.created.len(), 2);
        assert!(index.instance_at(TileCoord::new(1, 0)).is_none());
        let left = index.instance_at(TileCoord::new(0, 0)).expect("left").id();
        let right = index.instance_at(TileCoord::new(2, 0)).expect("right").id();
        assert_ne!(left, right);
    }

    #[test]
    fn unchanged_instances_keep_their_identity() {
        let keys = layout(&["TT.", "..."]);
        let mut index = RoomInstanceIndex::default();
        let _ = index.regenerate(3, 2, &everything(3, 2), |tile| keys.get(&tile).copied());
        let before = index.instance_at(TileCoord::new(0, 0)).expect("room").id();

        let outcome = index.regenerate(3, 2, &everything(3, 2), |tile| keys.get(&tile).copied());

        assert!(outcome.removed.is_empty());
        assert!(outcome.created.is_empty());
        assert_eq!(index.instance_at(TileCoord::new(1, 0)).map(RoomInstance::id), Some(before));
    }

    #[test]
    fn owner_change_replaces_instance() {
        let mut keys = layout(&["TT"]);
        let mut index = RoomInstanceIndex::default();
        let _ = index.regenerate(2, 1, &everything(2, 1), |tile| keys.get(&tile).copied());

        for tile in [TileCoord::new(0, 0), TileCoord::new(1, 0)] {
            let _ = keys.insert(tile, key(TREASURY, 4));
        }
        let _ = index.regenerate(2, 1, &everything(2, 1), |tile| keys.get(&tile).copied());

        let instance = index.instance_at(TileCoord::new(1, 0)).expect("room");
        assert_eq!(instance.owner(), PlayerId::new(4));
        assert_eq!(instance.tiles().len(), 2);
        assert_eq!(index.iter().count(), 1);
    }
}

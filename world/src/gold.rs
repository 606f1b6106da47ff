//! Gold storage controls for room instances and per-player gold totals.

use std::collections::BTreeMap;

use keeper_core::{AccessibleTiles, Event, GoldStorage, PlayerId, RoomInstanceId, TileCoord};

use crate::World;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct GoldSlot {
    tile: TileCoord,
    amount: u32,
}

/// Gold stored inside a single room instance.
///
/// Tiles are filled in instance order. The stored total never exceeds
/// `gold_per_tile * accessible_tiles`, and no tile exceeds `gold_per_tile`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct GoldControl {
    gold_per_tile: u32,
    max_capacity: u32,
    stored: u32,
    slots: Vec<GoldSlot>,
}

impl GoldControl {
    pub(crate) fn new(tiles: &[TileCoord], storage: GoldStorage) -> Self {
        let accessible = match storage.accessible_tiles {
            AccessibleTiles::AllTiles => u32::try_from(tiles.len()).unwrap_or(u32::MAX),
            AccessibleTiles::Fixed(count) => count,
        };
        Self {
            gold_per_tile: storage.gold_per_tile,
            max_capacity: storage.gold_per_tile.saturating_mul(accessible),
            stored: 0,
            slots: tiles
                .iter()
                .map(|&tile| GoldSlot { tile, amount: 0 })
                .collect(),
        }
    }

    pub(crate) const fn max_capacity(&self) -> u32 {
        self.max_capacity
    }

    pub(crate) const fn stored_gold(&self) -> u32 {
        self.stored
    }

    pub(crate) fn gold_at(&self, tile: TileCoord) -> u32 {
        self.slots
            .iter()
            .find(|slot| slot.tile == tile)
            .map_or(0, |slot| slot.amount)
    }

    /// Tiles currently holding gold, in instance order.
    pub(crate) fn stored_tiles(&self) -> impl Iterator<Item = (TileCoord, u32)> + '_ {
        self.slots
            .iter()
            .filter(|slot| slot.amount > 0)
            .map(|slot| (slot.tile, slot.amount))
    }

    /// Stores up to `sum` gold, starting at `preferred` when it belongs to the room.
    ///
    /// Returns the amount that did not fit.
    pub(crate) fn add_gold(&mut self, mut sum: u32, preferred: Option<TileCoord>) -> u32 {
        if let Some(index) =
            preferred.and_then(|tile| self.slots.iter().position(|slot| slot.tile == tile))
        {
            sum = self.put_gold(index, sum);
        }
        for index in 0..self.slots.len() {
            if sum == 0 {
                break;
            }
            sum = self.put_gold(index, sum);
        }
        sum
    }

    fn put_gold(&mut self, index: usize, sum: u32) -> u32 {
        let room_space = self.max_capacity.saturating_sub(self.stored);
        let Some(slot) = self.slots.get_mut(index) else {
            return sum;
        };
        let tile_space = self.gold_per_tile.saturating_sub(slot.amount);
        let stored = sum.min(tile_space).min(room_space);
        slot.amount += stored;
        self.stored += stored;
        sum - stored
    }
}

/// Gold controls of every storage-capable room instance plus player totals.
#[derive(Debug, Default)]
pub(crate) struct GoldLedger {
    controls: BTreeMap<RoomInstanceId, GoldControl>,
    totals: BTreeMap<PlayerId, u64>,
}

impl GoldLedger {
    pub(crate) fn open(&mut self, instance: RoomInstanceId, control: GoldControl) {
        let _ = self.controls.insert(instance, control);
    }

    pub(crate) fn close(&mut self, instance: RoomInstanceId) -> Option<GoldControl> {
        self.controls.remove(&instance)
    }

    pub(crate) fn control(&self, instance: RoomInstanceId) -> Option<&GoldControl> {
        self.controls.get(&instance)
    }

    pub(crate) fn control_mut(&mut self, instance: RoomInstanceId) -> Option<&mut GoldControl> {
        self.controls.get_mut(&instance)
    }

    pub(crate) fn credit(&mut self, player: PlayerId, amount: u32) {
        let total = self.totals.entry(player).or_insert(0);
        *total = total.saturating_add(u64::from(amount));
    }

    pub(crate) fn total(&self, player: PlayerId) -> u64 {
        self.totals.get(&player).copied().unwrap_or(0)
    }
}

impl World {
    /// Deposits gold for a player and returns what could not be stored.
    ///
    /// With a target tile the whole sum goes to the storage room covering it.
    /// Without one it is spread over the player's storage rooms in creation
    /// order. Only the stored amount is credited to the player.
    pub(crate) fn add_gold(
        &mut self,
        player: PlayerId,
        tile: Option<TileCoord>,
        amount: u32,
        out_events: &mut Vec<Event>,
    ) -> u32 {
        let mut leftover = amount;
        match tile {
            Some(tile) => {
                let target = self.rooms.instance_at(tile).map(|instance| instance.id());
                if let Some(control) = target.and_then(|id| self.gold.control_mut(id)) {
                    leftover = control.add_gold(leftover, Some(tile));
                }
            }
            None => {
                let owned: Vec<RoomInstanceId> = self
                    .rooms
                    .iter()
                    .filter(|instance| instance.owner() == player)
                    .map(|instance| instance.id())
                    .collect();
                for id in owned {
                    if leftover == 0 {
                        break;
                    }
                    if let Some(control) = self.gold.control_mut(id) {
                        leftover = control.add_gold(leftover, None);
                    }
                }
            }
        }

        self.credit_player(player, amount - leftover, out_events);
        if leftover > 0 {
            out_events.push(Event::GoldLeftOver {
                player,
                tile,
                amount: leftover,
            });
        }
        out_events.push(Event::GoldDeposited {
            player,
            requested: amount,
            leftover,
        });
        leftover
    }

    pub(crate) fn credit_player(
        &mut self,
        player: PlayerId,
        amount: u32,
        out_events: &mut Vec<Event>,
    ) {
        if amount == 0 {
            return;
        }
        self.gold.credit(player, amount);
        out_events.push(Event::PlayerGoldCredited { player, amount });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(count: u32) -> Vec<TileCoord> {
        (0..count).map(|x| TileCoord::new(x, 0)).collect()
    }

    fn storage(gold_per_tile: u32, accessible_tiles: AccessibleTiles) -> GoldStorage {
        GoldStorage {
            gold_per_tile,
            accessible_tiles,
        }
    }

    #[test]
    fn fills_tiles_in_instance_order() {
        let tiles = row(3);
        let mut control = GoldControl::new(&tiles, storage(100, AccessibleTiles::AllTiles));

        assert_eq!(control.max_capacity(), 300);
        assert_eq!(control.add_gold(250, None), 0);
        assert_eq!(control.stored_gold(), 250);
        let amounts: Vec<u32> = tiles.iter().map(|tile| control.gold_at(*tile)).collect();
        assert_eq!(amounts, vec![100, 100, 50]);
    }

    #[test]
    fn preferred_tile_is_filled_first() {
        let tiles = row(3);
        let mut control = GoldControl::new(&tiles, storage(100, AccessibleTiles::AllTiles));

        assert_eq!(control.add_gold(150, Some(TileCoord::new(2, 0))), 0);
        assert_eq!(control.gold_at(TileCoord::new(2, 0)), 100);
        assert_eq!(control.gold_at(TileCoord::new(0, 0)), 50);
        assert_eq!(control.gold_at(TileCoord::new(1, 0)), 0);
    }

    #[test]
    fn overflow_is_returned() {
        let mut control = GoldControl::new(&row(2), storage(100, AccessibleTiles::AllTiles));
        assert_eq!(control.add_gold(260, None), 60);
        assert_eq!(control.stored_gold(), 200);
    }

    #[test]
    fn fixed_accessible_tiles_cap_the_room() {
        let mut control = GoldControl::new(&row(4), storage(100, AccessibleTiles::Fixed(1)));

        assert_eq!(control.max_capacity(), 100);
        assert_eq!(control.add_gold(160, None), 60);
        assert_eq!(control.stored_tiles().count(), 1);
    }

    #[test]
    fn ledger_accumulates_totals() {
        let mut ledger = GoldLedger::default();
        let player = PlayerId::new(3);
        ledger.credit(player, 40);
        ledger.credit(player, 2);
        assert_eq!(ledger.total(player), 42);
        assert_eq!(ledger.total(PlayerId::new(4)), 0);
    }
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure bootstrap system that prepares a dungeon session.

use keeper_core::{Command, PlayerId};
use keeper_world::{query, TileMap, World};

/// Gold a player owns when the session starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StartingGold {
    /// Player receiving the gold.
    pub player: PlayerId,
    /// Amount handed out before the first tick.
    pub amount: u32,
}

/// Produces data required to greet the player and seed the economy.
#[derive(Debug, Default)]
pub struct Bootstrap;

impl Bootstrap {
    /// Derives the banner that should be shown when the session starts.
    #[must_use]
    pub fn welcome_banner<'world>(&self, world: &'world World) -> &'world str {
        query::welcome_banner(world)
    }

    /// Exposes the tile map required for presentation.
    #[must_use]
    pub fn tile_map<'world>(&self, world: &'world World) -> &'world TileMap {
        query::tile_map(world)
    }

    /// Emits one untargeted deposit per player that starts with gold.
    pub fn seed_gold(&self, players: &[StartingGold], out: &mut Vec<Command>) {
        out.extend(
            players
                .iter()
                .filter(|start| start.amount > 0)
                .map(|start| Command::AddGold {
                    player: start.player,
                    tile: None,
                    amount: start.amount,
                }),
        );
    }
}

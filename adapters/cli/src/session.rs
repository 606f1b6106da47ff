use std::{cell::Cell, collections::BTreeMap, rc::Rc, time::Duration};

use anyhow::{bail, Context, Result};
use keeper_core::{Command, CreatureProfile, Event, PlayerId, TerrainFlag, TileCoord};
use keeper_system_bootstrap::{Bootstrap, StartingGold};
use keeper_system_builder::{Builder, BuilderInput, Tool};
use keeper_system_claiming::{ClaimAssignment, Claiming, Config};
use keeper_world::{self as world, query, BreadthFirstPaths, World};
use serde::Serialize;

use crate::level::{Level, Step};

const CLAIM_INTERVAL: Duration = Duration::from_millis(500);

/// Replays a level script against a freshly built world.
#[derive(Debug)]
pub(crate) struct Session {
    world: World,
    bootstrap: Bootstrap,
    claiming: Claiming,
    builders: BTreeMap<PlayerId, Builder>,
    assignments: Vec<ClaimAssignment>,
    paths: BreadthFirstPaths,
    players: Vec<StartingGold>,
    tally: Tally,
    path_reports: Vec<PathReport>,
    changed_tiles: Rc<Cell<usize>>,
}

#[derive(Clone, Copy, Debug, Default)]
struct Tally {
    commands: usize,
    loose_gold: u64,
    rooms_claimed: usize,
}

/// End-of-run report printed by the adapter.
#[derive(Clone, Debug, Serialize)]
pub(crate) struct Summary {
    pub(crate) level: String,
    pub(crate) banner: String,
    pub(crate) columns: u32,
    pub(crate) rows: u32,
    pub(crate) commands: usize,
    pub(crate) tiles_changed: usize,
    pub(crate) rooms_claimed: usize,
    pub(crate) loose_gold: u64,
    pub(crate) room_types: Vec<String>,
    pub(crate) players: Vec<PlayerReport>,
    pub(crate) rooms: Vec<RoomReport>,
    pub(crate) paths: Vec<PathReport>,
}

/// Gold held by one player.
#[derive(Clone, Debug, Serialize)]
pub(crate) struct PlayerReport {
    pub(crate) player: u8,
    pub(crate) gold: u64,
}

/// Snapshot of one room instance.
#[derive(Clone, Debug, Serialize)]
pub(crate) struct RoomReport {
    pub(crate) instance: u32,
    pub(crate) room: String,
    pub(crate) owner: u8,
    pub(crate) tiles: usize,
    pub(crate) stored_gold: Option<u32>,
    pub(crate) capacity: Option<u32>,
}

/// Result of one scripted path query.
#[derive(Clone, Debug, Serialize)]
pub(crate) struct PathReport {
    pub(crate) from: TileCoord,
    pub(crate) to: TileCoord,
    pub(crate) steps: Option<usize>,
}

impl Session {
    /// Builds the world for the level and seeds starting gold.
    pub(crate) fn start(level: &Level) -> Result<Self> {
        let mut world = World::new(level.catalog.clone(), level.layout.clone())
            .context("level map does not fit its catalog")?;

        let changed_tiles = Rc::new(Cell::new(0));
        let counter = Rc::clone(&changed_tiles);
        world.add_listener(move |tile: TileCoord| {
            tracing::trace!(?tile, "tile changed");
            counter.set(counter.get() + 1);
        });

        let mut session = Self {
            world,
            bootstrap: Bootstrap,
            claiming: Claiming::new(Config::new(CLAIM_INTERVAL)),
            builders: BTreeMap::new(),
            assignments: Vec::new(),
            paths: BreadthFirstPaths::default(),
            players: level.players.clone(),
            tally: Tally::default(),
            path_reports: Vec::new(),
            changed_tiles,
        };
        tracing::info!(
            banner = session.bootstrap.welcome_banner(&session.world),
            "session started"
        );

        let mut seeds = Vec::new();
        session.bootstrap.seed_gold(&session.players, &mut seeds);
        for command in seeds {
            session.submit(command)?;
        }
        Ok(session)
    }

    /// Replays every step of the script in order.
    pub(crate) fn run(&mut self, script: &[Step]) -> Result<()> {
        for (index, step) in script.iter().enumerate() {
            self.step(step.clone())
                .with_context(|| format!("script step {index} failed"))?;
        }
        Ok(())
    }

    fn step(&mut self, step: Step) -> Result<()> {
        match step {
            Step::Command(command) => self.submit(command),
            Step::Drag {
                player,
                tool,
                from,
                to,
            } => self.drag(player, tool, from, to),
            Step::Assign(assignment) => {
                if !self.assignments.contains(&assignment) {
                    self.assignments.push(assignment);
                }
                Ok(())
            }
            Step::Release(tile) => {
                self.assignments.retain(|assignment| assignment.tile != tile);
                Ok(())
            }
            Step::Path { from, to } => {
                let walker = CreatureProfile::default();
                let steps = query::find_path(&self.world, &mut self.paths, from, to, &walker)
                    .map(|path| path.len().saturating_sub(1));
                tracing::debug!(?from, ?to, ?steps, "path query");
                self.path_reports.push(PathReport { from, to, steps });
                Ok(())
            }
        }
    }

    fn drag(&mut self, player: PlayerId, tool: Tool, from: TileCoord, to: TileCoord) -> Result<()> {
        let world = &self.world;
        let builder = self
            .builders
            .entry(player)
            .or_insert_with(|| Builder::new(player));
        let mut commands = Vec::new();

        let press = BuilderInput {
            press_action: true,
            cursor_tile: Some(from),
            ..BuilderInput::default()
        };
        builder.handle(None, press, &mut commands);

        let preview = builder.preview(tool, to, |tool, tile| match tool {
            Tool::Tag | Tool::Untag => query::is_taggable(world, tile),
            Tool::Build(room) => query::is_buildable(world, tile, player, room),
            Tool::Sell => query::is_sellable(world, tile, player),
        });
        if !preview.valid {
            tracing::debug!(?tool, ?from, ?to, "drag has no valid tiles");
        }
        let release = BuilderInput {
            confirm_action: true,
            cursor_tile: Some(to),
            ..BuilderInput::default()
        };
        builder.handle(Some(preview), release, &mut commands);

        for command in commands {
            self.submit(command)?;
        }
        Ok(())
    }

    /// Applies a command and lets the claiming system react until it goes quiet.
    fn submit(&mut self, command: Command) -> Result<()> {
        let mut pending = vec![command];

        while !pending.is_empty() {
            let mut events = Vec::new();
            for command in pending.drain(..) {
                self.guard(&command)?;
                self.tally.commands += 1;
                world::apply(&mut self.world, command, &mut events);
            }
            self.record(&events);

            let world = &self.world;
            self.claiming.handle(
                &events,
                &self.assignments,
                |work| {
                    query::is_claimable(world, work.tile, work.player)
                        || query::is_repairable_wall(world, work.tile, work.player)
                },
                &mut pending,
            );
        }
        Ok(())
    }

    /// Rejects commands the world treats as contract violations.
    fn guard(&self, command: &Command) -> Result<()> {
        if let Command::DamageTile { tile, .. } = command {
            let solid = query::terrain_at(&self.world, *tile)
                .is_some_and(|terrain| terrain.has(TerrainFlag::Solid));
            if !solid {
                bail!("damage_tile targets {tile:?}, which is not solid");
            }
        }
        Ok(())
    }

    fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::GoldLeftOver {
                    player,
                    tile,
                    amount,
                } => {
                    tracing::warn!(?player, ?tile, amount, "gold left loose");
                    self.tally.loose_gold += u64::from(*amount);
                }
                Event::RoomClaimed { instance, player } => {
                    tracing::info!(?instance, ?player, "room changed hands");
                    self.tally.rooms_claimed += 1;
                }
                Event::RoomInstanceCreated {
                    instance, room, ..
                } => tracing::debug!(?instance, ?room, "room instance created"),
                _ => {}
            }
        }
    }

    /// Collects the end-of-run report.
    pub(crate) fn summary(&self, level: &str) -> Summary {
        let map = self.bootstrap.tile_map(&self.world);
        let catalog = query::catalog(&self.world);

        let players = self
            .players
            .iter()
            .map(|start| PlayerReport {
                player: start.player.get(),
                gold: query::player_gold(&self.world, start.player),
            })
            .collect();

        let rooms = query::room_instances(&self.world)
            .map(|instance| RoomReport {
                instance: instance.id().get(),
                room: catalog
                    .room(instance.room())
                    .map_or_else(|| format!("{:?}", instance.room()), |room| room.name.clone()),
                owner: instance.owner().get(),
                tiles: instance.tiles().len(),
                stored_gold: query::stored_gold(&self.world, instance.id()),
                capacity: query::max_gold_capacity(&self.world, instance.id()),
            })
            .collect();

        Summary {
            level: level.to_owned(),
            banner: self.bootstrap.welcome_banner(&self.world).to_owned(),
            columns: map.columns(),
            rows: map.rows(),
            commands: self.tally.commands,
            tiles_changed: self.changed_tiles.get(),
            rooms_claimed: self.tally.rooms_claimed,
            loose_gold: self.tally.loose_gold,
            room_types: catalog.rooms().map(|room| room.name.clone()).collect(),
            players,
            rooms,
            paths: self.path_reports.clone(),
        }
    }
}

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use keeper_core::{
    Command, LevelRules, MapLayout, PlayerId, RoomDefinition, RoomId, TerrainType, TileCoord,
    TileSeed,
};
use keeper_system_bootstrap::StartingGold;
use keeper_system_builder::Tool;
use keeper_system_claiming::ClaimAssignment;
use keeper_world::Catalog;
use serde::Deserialize;

const SUPPORTED_LEVEL_VERSION: u32 = 1;

/// A fully validated level: rule catalog, map, starting gold and script.
#[derive(Debug)]
pub(crate) struct Level {
    pub(crate) name: String,
    pub(crate) catalog: Catalog,
    pub(crate) layout: MapLayout,
    pub(crate) players: Vec<StartingGold>,
    pub(crate) script: Vec<Step>,
}

/// One scripted action replayed against the world.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Step {
    /// Raw world command.
    Command(Command),
    /// Cursor drag performed with a selection tool.
    Drag {
        player: PlayerId,
        tool: Tool,
        from: TileCoord,
        to: TileCoord,
    },
    /// Puts a worker on a claim job.
    Assign(ClaimAssignment),
    /// Takes every worker off the tile.
    Release(TileCoord),
    /// Asks the path service for a walking route.
    Path { from: TileCoord, to: TileCoord },
}

impl Level {
    /// Returns the default level path relative to the adapter crate.
    #[must_use]
    pub(crate) fn default_path() -> PathBuf {
        PathBuf::from("levels/demo.toml")
    }

    /// Loads and validates the level located at the provided path.
    pub(crate) fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read level manifest at {}", path.display()))?;
        parse_level(&contents)
            .with_context(|| format!("invalid level manifest at {}", path.display()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    version: u32,
    #[serde(default)]
    name: String,
    rules: LevelRules,
    terrains: Vec<TerrainType>,
    #[serde(default)]
    rooms: Vec<RoomDefinition>,
    legend: BTreeMap<String, TileSeed>,
    map: MapRecord,
    #[serde(default)]
    players: Vec<PlayerRecord>,
    #[serde(default)]
    script: Vec<StepRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MapRecord {
    rows: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PlayerRecord {
    id: PlayerId,
    #[serde(default)]
    gold: u32,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StepRecord {
    Drag { drag: DragRecord },
    Assign { assign: ClaimRecord },
    Release { release: TileCoord },
    Path { path: PathRecord },
    Command(Command),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DragRecord {
    player: PlayerId,
    tool: ToolName,
    #[serde(default)]
    room: Option<RoomId>,
    from: TileCoord,
    to: TileCoord,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ToolName {
    Tag,
    Untag,
    Build,
    Sell,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ClaimRecord {
    player: PlayerId,
    tile: TileCoord,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PathRecord {
    from: TileCoord,
    to: TileCoord,
}

fn parse_level(contents: &str) -> Result<Level> {
    let manifest: Manifest =
        toml::from_str(contents).context("failed to parse level manifest toml contents")?;
    if manifest.version != SUPPORTED_LEVEL_VERSION {
        bail!(
            "unsupported level manifest version {}; expected {}",
            manifest.version,
            SUPPORTED_LEVEL_VERSION
        );
    }

    let catalog = Catalog::new(manifest.terrains, manifest.rooms, manifest.rules)
        .context("level catalog is inconsistent")?;
    let layout = parse_map(&manifest.map.rows, &manifest.legend)?;

    let mut players: Vec<StartingGold> = Vec::with_capacity(manifest.players.len());
    for record in manifest.players {
        if record.id.is_neutral() {
            bail!("player id 0 is reserved for unowned tiles");
        }
        if players.iter().any(|start| start.player == record.id) {
            bail!("level lists player {:?} more than once", record.id);
        }
        players.push(StartingGold {
            player: record.id,
            amount: record.gold,
        });
    }

    let script = manifest
        .script
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            resolve_step(record).with_context(|| format!("script step {index} is invalid"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Level {
        name: manifest.name,
        catalog,
        layout,
        players,
        script,
    })
}

fn parse_map(rows: &[String], legend: &BTreeMap<String, TileSeed>) -> Result<MapLayout> {
    let mut symbols = BTreeMap::new();
    for (key, seed) in legend {
        let mut chars = key.chars();
        let (Some(symbol), None) = (chars.next(), chars.next()) else {
            bail!("legend key `{key}` must be a single character");
        };
        let _ = symbols.insert(symbol, *seed);
    }

    let Some(first) = rows.first() else {
        bail!("level map has no rows");
    };
    let columns = first.chars().count();
    let width = u32::try_from(columns).context("level map is too wide")?;
    let height = u32::try_from(rows.len()).context("level map is too tall")?;

    let mut tiles = Vec::with_capacity(columns * rows.len());
    for (y, row) in rows.iter().enumerate() {
        if row.chars().count() != columns {
            bail!(
                "map row {y} has {} tiles; expected {columns}",
                row.chars().count()
            );
        }
        for (x, symbol) in row.chars().enumerate() {
            let seed = symbols
                .get(&symbol)
                .with_context(|| format!("unknown map symbol `{symbol}` at ({x}, {y})"))?;
            tiles.push(*seed);
        }
    }

    Ok(MapLayout {
        columns: width,
        rows: height,
        tiles,
    })
}

fn resolve_step(record: StepRecord) -> Result<Step> {
    Ok(match record {
        StepRecord::Drag { drag } => {
            let tool = match (drag.tool, drag.room) {
                (ToolName::Tag, None) => Tool::Tag,
                (ToolName::Untag, None) => Tool::Untag,
                (ToolName::Sell, None) => Tool::Sell,
                (ToolName::Build, Some(room)) => Tool::Build(room),
                (ToolName::Build, None) => bail!("build drags need a room"),
                (tool, Some(_)) => bail!("{tool:?} drags do not take a room"),
            };
            Step::Drag {
                player: drag.player,
                tool,
                from: drag.from,
                to: drag.to,
            }
        }
        StepRecord::Assign { assign } => {
            Step::Assign(ClaimAssignment::new(assign.player, assign.tile))
        }
        StepRecord::Release { release } => Step::Release(release),
        StepRecord::Path { path } => Step::Path {
            from: path.from,
            to: path.to,
        },
        StepRecord::Command(command) => Step::Command(command),
    })
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the dungeon simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. The read-only rule catalog records
//! ([`TerrainType`], [`RoomDefinition`], [`LevelRules`]) and the static map
//! layout ([`MapLayout`]) also live here so that loaders and the world agree
//! on a single vocabulary.

use std::{fmt, marker::PhantomData, time::Duration};

use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to the dungeon, Keeper.";

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        #[serde(with = "duration_millis")]
        dt: Duration,
    },
    /// Tags or untags every taggable tile inside the rectangle for a player.
    SelectTiles {
        /// Inclusive rectangle of tiles to update.
        area: SelectionRect,
        /// `true` to tag the tiles, `false` to clear the tag.
        select: bool,
        /// Player whose selection bit is updated.
        player: PlayerId,
    },
    /// Digs out a tile, converting it to its destroyed terrain.
    DigTile {
        /// Tile to dig.
        tile: TileCoord,
    },
    /// Overwrites the terrain and owner of a tile without legality checks.
    AlterTerrain {
        /// Tile to overwrite.
        tile: TileCoord,
        /// Terrain the tile should take.
        terrain: TerrainId,
        /// New owner; the neutral player leaves the current owner untouched.
        owner: PlayerId,
    },
    /// Claims a single tile for a player when the claim is legal.
    ClaimTile {
        /// Tile to claim.
        tile: TileCoord,
        /// Player claiming the tile.
        player: PlayerId,
    },
    /// Builds a room on every buildable tile inside the rectangle.
    Build {
        /// Inclusive rectangle of tiles to build on.
        area: SelectionRect,
        /// Player paying for and owning the room.
        player: PlayerId,
        /// Room type to construct.
        room: RoomId,
    },
    /// Sells every sellable room tile inside the rectangle.
    Sell {
        /// Inclusive rectangle of tiles to sell.
        area: SelectionRect,
        /// Player selling the tiles.
        player: PlayerId,
    },
    /// Applies one round of structural damage (or gold mining) to a solid tile.
    DamageTile {
        /// Tile receiving the damage.
        tile: TileCoord,
        /// Player applying the damage.
        player: PlayerId,
    },
    /// Applies one round of healing (repair, reinforcement or claiming) to a tile.
    HealTile {
        /// Tile receiving the healing.
        tile: TileCoord,
        /// Player applying the healing.
        player: PlayerId,
    },
    /// Continuous claim action: damages or heals depending on tile ownership.
    ApplyClaim {
        /// Tile being worked on.
        tile: TileCoord,
        /// Player performing the claim.
        player: PlayerId,
    },
    /// Applies room-wide claiming damage to the room instance covering a tile.
    DamageRoom {
        /// Any tile belonging to the targeted room instance.
        tile: TileCoord,
        /// Player attacking the room.
        player: PlayerId,
    },
    /// Deposits gold for a player, optionally at a preferred tile.
    AddGold {
        /// Player receiving the gold.
        player: PlayerId,
        /// Preferred drop point; `None` distributes across all storage rooms.
        #[serde(default)]
        tile: Option<TileCoord>,
        /// Amount of gold to deposit.
        amount: u32,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        #[serde(with = "duration_millis")]
        dt: Duration,
    },
    /// Visual or structural state of a single tile changed.
    TileChanged {
        /// Tile that changed.
        tile: TileCoord,
    },
    /// Tiles that must be redrawn after an operation, sorted and de-duplicated.
    TilesUpdated {
        /// Tiles marked dirty by the operation.
        tiles: Vec<TileCoord>,
    },
    /// Room instances whose wall geometry must be recomputed.
    RoomWallsInvalidated {
        /// Instances queued for wall recomputation.
        instances: Vec<RoomInstanceId>,
    },
    /// A new room instance was discovered from contiguous room tiles.
    RoomInstanceCreated {
        /// Identifier allocated to the instance.
        instance: RoomInstanceId,
        /// Room type of the instance.
        room: RoomId,
        /// Owner shared by every tile of the instance.
        owner: PlayerId,
        /// Member tiles in instance order.
        tiles: Vec<TileCoord>,
    },
    /// A room instance was discarded ahead of regeneration.
    RoomInstanceRemoved {
        /// Identifier of the discarded instance.
        instance: RoomInstanceId,
    },
    /// A room instance converted to a new owner in a single step.
    RoomClaimed {
        /// Instance that was attacked (discarded right after conversion).
        instance: RoomInstanceId,
        /// Player that now owns every tile of the room.
        player: PlayerId,
    },
    /// A terrain transition triggered a visual effect.
    TerrainEffect {
        /// Tile the effect plays on.
        tile: TileCoord,
        /// Effect identifier from the rule catalog.
        effect: EffectId,
    },
    /// Gold was extracted from a seam while damaging it.
    GoldMined {
        /// Tile the gold came from.
        tile: TileCoord,
        /// Player that mined the gold.
        player: PlayerId,
        /// Amount of gold extracted.
        amount: u32,
    },
    /// A player's gold total was credited.
    PlayerGoldCredited {
        /// Player that received the credit.
        player: PlayerId,
        /// Amount credited.
        amount: u32,
    },
    /// Gold could not be placed into any storage room and is left loose.
    GoldLeftOver {
        /// Player the gold belongs to.
        player: PlayerId,
        /// Tile the gold was destined for, when known.
        tile: Option<TileCoord>,
        /// Amount of gold that found no storage.
        amount: u32,
    },
    /// Result of an `AddGold` command.
    GoldDeposited {
        /// Player the deposit was made for.
        player: PlayerId,
        /// Amount requested by the command.
        requested: u32,
        /// Amount that did not fit into any room.
        leftover: u32,
    },
}

/// Identifier of a player. `0` is the neutral player.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(u8);

impl PlayerId {
    /// The neutral owner assigned to unclaimed tiles.
    pub const NEUTRAL: Self = Self(0);

    /// Creates a new player identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// Reports whether this is the neutral owner.
    #[must_use]
    pub const fn is_neutral(&self) -> bool {
        self.0 == 0
    }
}

/// Identifier of a terrain type in the rule catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TerrainId(u16);

impl TerrainId {
    /// Creates a new terrain identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }
}

/// Identifier of a room type in the rule catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(u16);

impl RoomId {
    /// Creates a new room identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }
}

/// Identifier allocated by the world to a room instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomInstanceId(u32);

impl RoomInstanceId {
    /// Creates a new room instance identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a visual effect in the rule catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectId(u16);

impl EffectId {
    /// Creates a new effect identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }
}

/// Location of a single map tile expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    x: u32,
    y: u32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Computes the Manhattan distance between two tile coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: TileCoord) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// Rectangular selection spanning two inclusive corner tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "SelectionCorners")]
pub struct SelectionRect {
    start: TileCoord,
    end: TileCoord,
}

impl SelectionRect {
    /// Creates a selection from two arbitrary corners.
    ///
    /// The corners are normalised so that `start` is the upper-left and
    /// `end` the lower-right tile regardless of drag direction.
    #[must_use]
    pub fn new(first: TileCoord, second: TileCoord) -> Self {
        Self {
            start: TileCoord::new(first.x.min(second.x), first.y.min(second.y)),
            end: TileCoord::new(first.x.max(second.x), first.y.max(second.y)),
        }
    }

    /// Selection covering a single tile.
    #[must_use]
    pub const fn single(tile: TileCoord) -> Self {
        Self {
            start: tile,
            end: tile,
        }
    }

    /// Upper-left corner of the selection.
    #[must_use]
    pub const fn start(&self) -> TileCoord {
        self.start
    }

    /// Lower-right corner of the selection (inclusive).
    #[must_use]
    pub const fn end(&self) -> TileCoord {
        self.end
    }

    /// Reports whether the selection covers the provided tile.
    #[must_use]
    pub fn contains(&self, tile: TileCoord) -> bool {
        (self.start.x..=self.end.x).contains(&tile.x)
            && (self.start.y..=self.end.y).contains(&tile.y)
    }

    /// Iterates over every covered tile, column by column.
    pub fn tiles(&self) -> impl Iterator<Item = TileCoord> {
        let (start, end) = (self.start, self.end);
        (start.x..=end.x).flat_map(move |x| (start.y..=end.y).map(move |y| TileCoord::new(x, y)))
    }
}

#[derive(Deserialize)]
struct SelectionCorners {
    start: TileCoord,
    end: TileCoord,
}

impl From<SelectionCorners> for SelectionRect {
    fn from(corners: SelectionCorners) -> Self {
        Self::new(corners.start, corners.end)
    }
}

/// Individual flag that can be stored inside a [`FlagSet`].
pub trait Flag: Copy + 'static {
    /// Every flag of the family in declaration order.
    const ALL: &'static [Self];

    /// Bit position reserved for the flag.
    fn bit(self) -> u32;
}

/// Compact set of flags from a single family.
///
/// Serialises as a list of flag names so catalog files stay readable.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(
    from = "Vec<F>",
    into = "Vec<F>",
    bound(
        serialize = "F: Flag + Serialize",
        deserialize = "F: Flag + Deserialize<'de>"
    )
)]
pub struct FlagSet<F: Flag> {
    bits: u32,
    marker: PhantomData<F>,
}

impl<F: Flag> FlagSet<F> {
    /// Creates an empty flag set.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            bits: 0,
            marker: PhantomData,
        }
    }

    /// Returns a copy of the set with the provided flag added.
    #[must_use]
    pub fn with(mut self, flag: F) -> Self {
        self.insert(flag);
        self
    }

    /// Adds a flag to the set.
    pub fn insert(&mut self, flag: F) {
        self.bits |= 1 << flag.bit();
    }

    /// Reports whether the flag is present.
    #[must_use]
    pub fn contains(&self, flag: F) -> bool {
        self.bits & (1 << flag.bit()) != 0
    }

    /// Reports whether no flag is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Iterates over the contained flags in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = F> + '_ {
        F::ALL.iter().copied().filter(|flag| self.contains(*flag))
    }
}

impl<F: Flag> Default for FlagSet<F> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<F: Flag> FromIterator<F> for FlagSet<F> {
    fn from_iter<I: IntoIterator<Item = F>>(iter: I) -> Self {
        let mut set = Self::empty();
        for flag in iter {
            set.insert(flag);
        }
        set
    }
}

impl<F: Flag> From<Vec<F>> for FlagSet<F> {
    fn from(flags: Vec<F>) -> Self {
        flags.into_iter().collect()
    }
}

impl<F: Flag> From<FlagSet<F>> for Vec<F> {
    fn from(set: FlagSet<F>) -> Self {
        set.iter().collect()
    }
}

impl<F: Flag + fmt::Debug> fmt::Debug for FlagSet<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Attributes of a terrain type that drive the legality of every mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TerrainFlag {
    /// Blocks movement; walls, rock and gold seams.
    Solid,
    /// Can carry a player owner.
    Ownable,
    /// Terrain belongs to a room type.
    Room,
    /// Open water.
    Water,
    /// Open lava.
    Lava,
    /// Cannot be dug out.
    Impenetrable,
    /// Can be tagged for digging.
    Taggable,
    /// Neighbouring rooms may raise walls against this terrain.
    AllowRoomWalls,
    /// Animates while damaged even when not destroyed.
    Decay,
}

impl Flag for TerrainFlag {
    const ALL: &'static [Self] = &[
        Self::Solid,
        Self::Ownable,
        Self::Room,
        Self::Water,
        Self::Lava,
        Self::Impenetrable,
        Self::Taggable,
        Self::AllowRoomWalls,
        Self::Decay,
    ];

    fn bit(self) -> u32 {
        self as u32
    }
}

/// Attributes of a room type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomFlag {
    /// Instances raise walls against adjacent wall terrain.
    HasWalls,
    /// Player-constructed room that may be sold back.
    Buildable,
    /// May be placed on owned, non-solid land.
    PlaceableOnLand,
    /// May be placed on water (bridges).
    PlaceableOnWater,
    /// May be placed on lava (bridges).
    PlaceableOnLava,
}

impl Flag for RoomFlag {
    const ALL: &'static [Self] = &[
        Self::HasWalls,
        Self::Buildable,
        Self::PlaceableOnLand,
        Self::PlaceableOnWater,
        Self::PlaceableOnLava,
    ];

    fn bit(self) -> u32 {
        self as u32
    }
}

/// Movement capabilities of a creature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreatureAbility {
    /// Crosses any non-solid terrain.
    CanFly,
    /// Walks on water.
    CanWalkOnWater,
    /// Walks on lava.
    CanWalkOnLava,
}

impl Flag for CreatureAbility {
    const ALL: &'static [Self] = &[Self::CanFly, Self::CanWalkOnWater, Self::CanWalkOnLava];

    fn bit(self) -> u32 {
        self as u32
    }
}

/// Flag set describing a terrain type.
pub type TerrainFlags = FlagSet<TerrainFlag>;

/// Flag set describing a room type.
pub type RoomFlags = FlagSet<RoomFlag>;

/// Flag set describing a creature's movement capabilities.
pub type CreatureAbilities = FlagSet<CreatureAbility>;

/// Capability profile consulted by accessibility queries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureProfile {
    /// Movement capabilities of the creature.
    #[serde(default)]
    pub abilities: CreatureAbilities,
}

impl CreatureProfile {
    /// Creates a profile with the provided abilities.
    #[must_use]
    pub const fn new(abilities: CreatureAbilities) -> Self {
        Self { abilities }
    }

    /// Reports whether the creature has the provided ability.
    #[must_use]
    pub fn can(&self, ability: CreatureAbility) -> bool {
        self.abilities.contains(ability)
    }
}

/// Liquid underneath a bridge, restored when the bridge is sold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeTerrain {
    /// Bridge spans water.
    Water,
    /// Bridge spans lava.
    Lava,
}

/// Immutable terrain rule record from the level catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainType {
    /// Identifier referenced by tiles.
    pub id: TerrainId,
    /// Human readable name.
    #[serde(default)]
    pub name: String,
    /// Attributes that drive mutation legality.
    #[serde(default)]
    pub flags: TerrainFlags,
    /// Gold credited when the terrain is dug; non-zero marks a gold seam.
    #[serde(default)]
    pub gold_value: u32,
    /// Maximum structural health.
    #[serde(default)]
    pub max_health: u32,
    /// Health a tile receives when converted to this terrain.
    #[serde(default)]
    pub starting_health: u32,
    /// Terrain left behind once the tile is destroyed.
    pub destroyed_terrain: TerrainId,
    /// Terrain the tile upgrades to when healed to full health.
    #[serde(default)]
    pub max_health_terrain: Option<TerrainId>,
    /// Effect played when the tile is destroyed.
    #[serde(default)]
    pub destroyed_effect: Option<EffectId>,
    /// Effect played when the tile reaches full health.
    #[serde(default)]
    pub max_health_effect: Option<EffectId>,
}

impl TerrainType {
    /// Reports whether the terrain carries the provided flag.
    #[must_use]
    pub fn has(&self, flag: TerrainFlag) -> bool {
        self.flags.contains(flag)
    }

    /// Reports whether tiles of this terrain may hold gold.
    #[must_use]
    pub const fn is_gold_seam(&self) -> bool {
        self.gold_value > 0
    }
}

/// Number of room tiles that count towards gold storage capacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessibleTiles {
    /// Every tile of the instance stores gold.
    AllTiles,
    /// A fixed number of tiles regardless of the instance size.
    Fixed(u32),
}

/// Gold storage policy of a room type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldStorage {
    /// Maximum gold stored on a single tile.
    pub gold_per_tile: u32,
    /// Number of tiles counted towards the room's capacity.
    pub accessible_tiles: AccessibleTiles,
}

/// Immutable room rule record from the level catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomDefinition {
    /// Identifier referenced by build commands.
    pub id: RoomId,
    /// Human readable name.
    #[serde(default)]
    pub name: String,
    /// Terrain every tile of the room carries.
    pub terrain: TerrainId,
    /// Room attributes.
    #[serde(default)]
    pub flags: RoomFlags,
    /// Gold storage policy, when the room stores gold.
    #[serde(default)]
    pub gold_storage: Option<GoldStorage>,
}

impl RoomDefinition {
    /// Reports whether the room carries the provided flag.
    #[must_use]
    pub fn has(&self, flag: RoomFlag) -> bool {
        self.flags.contains(flag)
    }
}

/// Per-action rates applied by damage and healing.
///
/// Rates are stored signed as level data provides them and are always applied
/// as absolute values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleRates {
    /// Damage dealt when digging one's own reinforced wall.
    pub dig_own_wall: i32,
    /// Damage dealt when digging an enemy reinforced wall.
    pub dig_enemy_wall: i32,
    /// Gold removed per strike from a gold seam.
    pub mine_gold: i32,
    /// Gold removed per strike from an impenetrable gem seam.
    pub gold_mined_from_gems: i32,
    /// Damage dealt to plain rock.
    pub dig_rock: i32,
    /// Healing applied to one's own wall.
    pub repair_wall: i32,
    /// Healing applied while claiming an enemy wall.
    pub claim_tile: i32,
    /// Healing applied while reinforcing an unowned wall.
    pub reinforce_wall: i32,
    /// Healing applied to floor tiles.
    pub repair_tile: i32,
    /// Room damage applied to neutral rooms.
    pub convert_room: i32,
    /// Room damage applied to enemy rooms.
    pub attack_room: i32,
}

impl Default for RuleRates {
    fn default() -> Self {
        Self {
            dig_own_wall: 100,
            dig_enemy_wall: 5,
            mine_gold: 25,
            gold_mined_from_gems: 10,
            dig_rock: 10,
            repair_wall: 20,
            claim_tile: 10,
            reinforce_wall: 10,
            repair_tile: 10,
            convert_room: 40,
            attack_room: 20,
        }
    }
}

/// Level-wide rule values that complete the terrain and room records.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRules {
    /// Canonical water terrain restored under sold water bridges.
    pub water: TerrainId,
    /// Canonical lava terrain restored under sold lava bridges.
    pub lava: TerrainId,
    /// Player credited with gold from dug-out terrain.
    pub dig_gold_recipient: PlayerId,
    /// Damage and healing rates.
    #[serde(default)]
    pub rates: RuleRates,
}

/// Static state of a single tile at level load time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSeed {
    /// Terrain the tile starts with.
    pub terrain: TerrainId,
    /// Initial owner.
    #[serde(default)]
    pub owner: PlayerId,
    /// Gold contained in the tile; only valid on gold seams.
    #[serde(default)]
    pub gold: u32,
    /// Liquid underneath the tile, if it is a bridge.
    #[serde(default)]
    pub bridge: Option<BridgeTerrain>,
}

impl TileSeed {
    /// Creates an unowned, goldless seed for the provided terrain.
    #[must_use]
    pub const fn new(terrain: TerrainId) -> Self {
        Self {
            terrain,
            owner: PlayerId::NEUTRAL,
            gold: 0,
            bridge: None,
        }
    }

    /// Returns a copy of the seed owned by the provided player.
    #[must_use]
    pub const fn owned_by(mut self, owner: PlayerId) -> Self {
        self.owner = owner;
        self
    }

    /// Returns a copy of the seed holding the provided gold.
    #[must_use]
    pub const fn with_gold(mut self, gold: u32) -> Self {
        self.gold = gold;
        self
    }
}

/// Static map layout in row-major order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapLayout {
    /// Number of tile columns.
    pub columns: u32,
    /// Number of tile rows.
    pub rows: u32,
    /// Tile seeds; `tiles[y * columns + x]` describes tile `(x, y)`.
    pub tiles: Vec<TileSeed>,
}

impl MapLayout {
    /// Creates a layout where every tile starts from the same seed.
    #[must_use]
    pub fn filled(columns: u32, rows: u32, seed: TileSeed) -> Self {
        let count = usize::try_from(u64::from(columns) * u64::from(rows)).unwrap_or(0);
        Self {
            columns,
            rows,
            tiles: vec![seed; count],
        }
    }

    /// Replaces the seed of a single tile; out-of-bounds tiles are ignored.
    pub fn set(&mut self, tile: TileCoord, seed: TileSeed) {
        if tile.x() >= self.columns || tile.y() >= self.rows {
            return;
        }
        let index = tile.y() as usize * self.columns as usize + tile.x() as usize;
        if let Some(slot) = self.tiles.get_mut(index) {
            *slot = seed;
        }
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(
        value: &Duration,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

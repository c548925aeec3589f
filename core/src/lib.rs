#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Skirmish engine.
//!
//! This crate defines the message surface that connects the authoritative
//! board, the pure systems, and the command-line adapter. Systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and broadcasts [`Event`] values
//! describing what actually happened. Every tie-break in the simulation
//! (turn order, movement goals, attack targets) resolves by *reading order*,
//! which is the derived ordering of [`Position`].

use serde::{Deserialize, Serialize};

/// Hit points assigned to every unit when a board is constructed.
pub const DEFAULT_HIT_POINTS: HitPoints = HitPoints::new(200);

/// Attack power units fight with unless overridden at construction.
pub const DEFAULT_ATTACK_POWER: AttackPower = AttackPower::new(3);

/// Location of a single grid cell expressed as row and column coordinates.
///
/// The field order matters: deriving `Ord` with `row` ahead of `col` makes
/// the natural ordering of positions *reading order* (top-to-bottom, then
/// left-to-right), the universal tie-break rule of the simulation. Turn
/// order, movement-goal selection, and attack-target selection all compare
/// positions through this one ordering.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Position {
    row: u32,
    col: u32,
}

impl Position {
    /// Creates a new grid position.
    #[must_use]
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Zero-based row index of the position.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based column index of the position.
    #[must_use]
    pub const fn col(&self) -> u32 {
        self.col
    }

    /// Yields the orthogonally adjacent positions in reading order.
    ///
    /// Positions above row 0 or left of column 0 are not yielded; the border
    /// of any valid map is wall, so the omission is indistinguishable from
    /// the implicit wall beyond the map edge. No diagonal neighbors exist in
    /// this simulation.
    #[must_use]
    pub fn neighbors(self) -> NeighborIter {
        let mut neighbors = NeighborIter::default();

        if let Some(row) = self.row.checked_sub(1) {
            neighbors.push(Position::new(row, self.col));
        }
        if let Some(col) = self.col.checked_sub(1) {
            neighbors.push(Position::new(self.row, col));
        }
        neighbors.push(Position::new(self.row, self.col + 1));
        neighbors.push(Position::new(self.row + 1, self.col));

        neighbors
    }

    /// Reports whether `other` is orthogonally adjacent to this position.
    #[must_use]
    pub fn is_adjacent_to(self, other: Position) -> bool {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col) == 1
    }
}

/// Fixed-capacity iterator over the orthogonal neighbors of a position.
#[derive(Clone, Copy, Debug, Default)]
pub struct NeighborIter {
    buffer: [Option<Position>; 4],
    len: usize,
    cursor: usize,
}

impl NeighborIter {
    fn push(&mut self, position: Position) {
        if self.len < self.buffer.len() {
            self.buffer[self.len] = Some(position);
            self.len += 1;
        }
    }
}

impl Iterator for NeighborIter {
    type Item = Position;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.len {
            return None;
        }

        let value = self.buffer[self.cursor];
        self.cursor += 1;
        value
    }
}

/// One of the two opposing sides. A unit's faction never changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    /// The side whose attack power the flawless-victory sweep raises.
    Elf,
    /// The side that always fights at the default attack power.
    Goblin,
}

impl Faction {
    /// Returns the opposing faction.
    #[must_use]
    pub const fn foe(self) -> Faction {
        match self {
            Self::Elf => Self::Goblin,
            Self::Goblin => Self::Elf,
        }
    }

    /// Map glyph used for this faction in the text format.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Elf => 'E',
            Self::Goblin => 'G',
        }
    }
}

/// Unique identifier assigned to a unit by the board.
///
/// Identifiers address registry entries; they never participate in
/// tie-breaking, since no two live units ever share a position.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
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

/// Remaining vitality of a unit. A unit is alive iff its hit points are
/// nonzero.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct HitPoints(u32);

impl HitPoints {
    /// Creates a hit-point value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric hit-point value.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Hit points remaining after absorbing a blow of the given power.
    ///
    /// Saturates at zero; overkill damage and exactly-lethal damage are
    /// indistinguishable, matching the simulation's death threshold.
    #[must_use]
    pub const fn minus(self, power: AttackPower) -> HitPoints {
        HitPoints(self.0.saturating_sub(power.get()))
    }

    /// Reports whether the unit carrying these hit points is dead.
    #[must_use]
    pub const fn is_depleted(&self) -> bool {
        self.0 == 0
    }
}

/// Damage a unit deals with a single strike.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct AttackPower(u32);

impl AttackPower {
    /// Creates an attack-power value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric attack-power value.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// The next candidate power, one point stronger.
    #[must_use]
    pub const fn stronger(self) -> AttackPower {
        AttackPower(self.0 + 1)
    }
}

/// Commands that express all permissible board mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Requests that a unit advance one step into an adjacent open cell.
    MoveUnit {
        /// Identifier of the unit attempting to move.
        unit: UnitId,
        /// Destination cell, which must be open, free, and adjacent.
        to: Position,
    },
    /// Requests that a unit strike an adjacent enemy.
    Strike {
        /// Identifier of the attacking unit.
        attacker: UnitId,
        /// Identifier of the defending unit.
        target: UnitId,
    },
}

/// Events broadcast by the board after executing commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that a unit moved between two cells.
    UnitMoved {
        /// Identifier of the unit that moved.
        unit: UnitId,
        /// Cell the unit occupied before moving.
        from: Position,
        /// Cell the unit occupies after the move.
        to: Position,
    },
    /// Confirms that a unit struck an enemy.
    UnitStruck {
        /// Identifier of the attacking unit.
        attacker: UnitId,
        /// Identifier of the defending unit.
        target: UnitId,
        /// Damage dealt by the blow.
        damage: AttackPower,
        /// Hit points the defender retains afterwards.
        remaining: HitPoints,
    },
    /// Announces that a unit died and its cell became open.
    UnitDied {
        /// Identifier of the unit that died.
        unit: UnitId,
        /// Faction the unit belonged to.
        faction: Faction,
        /// Cell the unit occupied when it died.
        position: Position,
    },
}

/// Immutable representation of a single unit's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    /// Unique identifier assigned to the unit.
    pub id: UnitId,
    /// Side the unit fights for.
    pub faction: Faction,
    /// Grid cell currently occupied by the unit.
    pub position: Position,
    /// Remaining hit points.
    pub hit_points: HitPoints,
    /// Damage the unit deals per strike.
    pub attack_power: AttackPower,
}

/// Read-only view of the live units, ordered by reading order of position.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnitView {
    snapshots: Vec<UnitSnapshot>,
}

impl UnitView {
    /// Creates a new unit view from the provided snapshots.
    ///
    /// Snapshots are sorted by reading order of their current position; the
    /// identifier only disambiguates should two snapshots of a stale capture
    /// ever coincide.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<UnitSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| (snapshot.position, snapshot.id));
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in reading order.
    pub fn iter(&self) -> impl Iterator<Item = &UnitSnapshot> {
        self.snapshots.iter()
    }

    /// Iterator over the captured snapshots of one faction, in reading order.
    pub fn of_faction(&self, faction: Faction) -> impl Iterator<Item = &UnitSnapshot> {
        self.snapshots
            .iter()
            .filter(move |snapshot| snapshot.faction == faction)
    }

    /// Reports whether the view contains any unit of the given faction.
    #[must_use]
    pub fn contains_faction(&self, faction: Faction) -> bool {
        self.of_faction(faction).next().is_some()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<UnitSnapshot> {
        self.snapshots
    }
}

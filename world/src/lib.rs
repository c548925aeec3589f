#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative board state for the Skirmish simulation.
//!
//! The [`Board`] owns the terrain grid, the unit registry, and a dense
//! occupancy grid. All mutation flows through [`apply`], which validates each
//! [`Command`] and keeps registry and occupancy consistent within a single
//! call: a move or a death can never leave the two disagreeing. Occupancy is
//! derived state; the terrain only ever answers open-or-wall.

use std::collections::VecDeque;

use skirmish_core::{
    AttackPower, Command, Event, Faction, HitPoints, Position, UnitId, UnitSnapshot,
    DEFAULT_ATTACK_POWER, DEFAULT_HIT_POINTS,
};
use thiserror::Error;

mod map;

pub use map::{parse_lines, MapError, MapLayout};

/// Content of a single terrain cell. Unit occupancy is tracked separately.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cell {
    /// Open cavern floor that units may stand on and move through.
    Open,
    /// Immovable wall; never changes for the lifetime of the board.
    Wall,
}

/// Rejections raised by [`apply`] when a command violates an invariant.
///
/// Every variant indicates a logic bug in the issuing system, not a
/// recoverable condition; callers are expected to abort the run.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    /// The referenced unit is not alive on this board.
    #[error("no living unit with id {0:?}")]
    UnknownUnit(UnitId),
    /// A move named a destination that is not orthogonally adjacent.
    #[error("unit {unit:?} cannot step from {from:?} to non-adjacent {to:?}")]
    MoveNotAdjacent {
        /// Unit that attempted the move.
        unit: UnitId,
        /// Position the unit currently occupies.
        from: Position,
        /// Requested destination.
        to: Position,
    },
    /// A move named a wall cell as its destination.
    #[error("unit {unit:?} cannot step into wall at {to:?}")]
    MoveIntoWall {
        /// Unit that attempted the move.
        unit: UnitId,
        /// Requested destination.
        to: Position,
    },
    /// A move named a cell already occupied by a living unit.
    #[error("unit {unit:?} cannot step into occupied cell {to:?}")]
    MoveIntoOccupied {
        /// Unit that attempted the move.
        unit: UnitId,
        /// Requested destination.
        to: Position,
    },
    /// A strike named two units of the same faction.
    #[error("unit {attacker:?} cannot strike ally {target:?}")]
    FriendlyFire {
        /// Unit that attempted the strike.
        attacker: UnitId,
        /// Intended target.
        target: UnitId,
    },
    /// A strike named a target that is not orthogonally adjacent.
    #[error("unit {attacker:?} cannot strike non-adjacent {target:?}")]
    StrikeNotAdjacent {
        /// Unit that attempted the strike.
        attacker: UnitId,
        /// Intended target.
        target: UnitId,
    },
}

/// Represents the authoritative Skirmish board state.
#[derive(Clone, Debug)]
pub struct Board {
    terrain: Terrain,
    units: Vec<Unit>,
    occupancy: OccupancyGrid,
}

impl Board {
    /// Builds a board from a parsed layout, assigning every unit the default
    /// hit points and its faction's attack power.
    ///
    /// Elves fight with `elf_power`; goblins always fight with the default.
    /// Construction performs the full malformed-input validation: both
    /// factions must be present, and every unit must be able to reach an
    /// opponent through non-wall terrain.
    pub fn new(layout: MapLayout, elf_power: AttackPower) -> Result<Self, MapError> {
        let width = layout.width();
        let height = layout.height();

        let mut units = Vec::with_capacity(layout.spawns().len());
        for (index, (faction, position)) in layout.spawns().iter().copied().enumerate() {
            let attack_power = match faction {
                Faction::Elf => elf_power,
                Faction::Goblin => DEFAULT_ATTACK_POWER,
            };
            units.push(Unit {
                id: UnitId::new(index as u32),
                faction,
                position,
                hit_points: DEFAULT_HIT_POINTS,
                attack_power,
            });
        }

        let terrain = Terrain {
            width,
            height,
            cells: layout.into_cells(),
        };
        let mut occupancy = OccupancyGrid::new(width, height);
        occupancy.fill_with(&units);

        let board = Self {
            terrain,
            units,
            occupancy,
        };
        board.validate_opposition()?;
        Ok(board)
    }

    /// Parses map text and builds a board with default attack powers.
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Result<Self, MapError> {
        Self::new(parse_lines(lines)?, DEFAULT_ATTACK_POWER)
    }

    /// Parses map text and builds a board with an overridden elf power.
    pub fn from_lines_with_elf_power<S: AsRef<str>>(
        lines: &[S],
        elf_power: AttackPower,
    ) -> Result<Self, MapError> {
        Self::new(parse_lines(lines)?, elf_power)
    }

    fn unit_index(&self, unit: UnitId) -> Option<usize> {
        self.units.iter().position(|entry| entry.id == unit)
    }

    /// Checks that both factions are present and that every unit shares a
    /// wall-bounded region with at least one opponent. Occupancy is ignored
    /// here: units shuffle around over time, walls do not.
    fn validate_opposition(&self) -> Result<(), MapError> {
        for faction in [Faction::Elf, Faction::Goblin] {
            if !self.units.iter().any(|unit| unit.faction == faction) {
                return Err(MapError::MissingFaction { faction });
            }
        }

        let regions = self.terrain.region_labels();
        for unit in &self.units {
            let Some(region) = self
                .terrain
                .index(unit.position)
                .and_then(|index| regions[index])
            else {
                continue;
            };
            let opposed = self.units.iter().any(|other| {
                other.faction == unit.faction.foe()
                    && self
                        .terrain
                        .index(other.position)
                        .and_then(|index| regions[index])
                        == Some(region)
            });
            if !opposed {
                return Err(MapError::UnreachableOpposition {
                    position: unit.position,
                });
            }
        }
        Ok(())
    }
}

/// Applies the provided command to the board, mutating state atomically.
///
/// On success the emitted events describe exactly what changed. On failure
/// the board is untouched; every error is an invariant violation that the
/// caller must treat as fatal.
pub fn apply(
    board: &mut Board,
    command: Command,
    out_events: &mut Vec<Event>,
) -> Result<(), CommandError> {
    match command {
        Command::MoveUnit { unit, to } => {
            let index = board
                .unit_index(unit)
                .ok_or(CommandError::UnknownUnit(unit))?;
            let from = board.units[index].position;
            if !from.is_adjacent_to(to) {
                return Err(CommandError::MoveNotAdjacent { unit, from, to });
            }
            if board.terrain.cell_at(to) != Cell::Open {
                return Err(CommandError::MoveIntoWall { unit, to });
            }
            if board.occupancy.occupant(to).is_some() {
                return Err(CommandError::MoveIntoOccupied { unit, to });
            }

            board.occupancy.vacate(from);
            board.occupancy.occupy(unit, to);
            board.units[index].position = to;
            out_events.push(Event::UnitMoved { unit, from, to });
            Ok(())
        }
        Command::Strike { attacker, target } => {
            let attacker_index = board
                .unit_index(attacker)
                .ok_or(CommandError::UnknownUnit(attacker))?;
            let target_index = board
                .unit_index(target)
                .ok_or(CommandError::UnknownUnit(target))?;

            let striker = board.units[attacker_index];
            let defender = board.units[target_index];
            if striker.faction == defender.faction {
                return Err(CommandError::FriendlyFire { attacker, target });
            }
            if !striker.position.is_adjacent_to(defender.position) {
                return Err(CommandError::StrikeNotAdjacent { attacker, target });
            }

            let damage = striker.attack_power;
            let remaining = defender.hit_points.minus(damage);
            board.units[target_index].hit_points = remaining;
            out_events.push(Event::UnitStruck {
                attacker,
                target,
                damage,
                remaining,
            });

            if remaining.is_depleted() {
                let fallen = board.units.remove(target_index);
                board.occupancy.vacate(fallen.position);
                out_events.push(Event::UnitDied {
                    unit: fallen.id,
                    faction: fallen.faction,
                    position: fallen.position,
                });
            }
            Ok(())
        }
    }
}

/// Query functions that provide read-only access to the board state.
pub mod query {
    use super::{Board, Cell};
    use skirmish_core::{Faction, Position, UnitId, UnitSnapshot, UnitView};

    /// Captures a read-only view of the living units in reading order.
    #[must_use]
    pub fn unit_view(board: &Board) -> UnitView {
        UnitView::from_snapshots(board.units.iter().map(|unit| unit.snapshot()).collect())
    }

    /// Retrieves a snapshot of the living unit with the given id, if any.
    #[must_use]
    pub fn unit(board: &Board, id: UnitId) -> Option<UnitSnapshot> {
        board
            .unit_index(id)
            .map(|index| board.units[index].snapshot())
    }

    /// Retrieves a snapshot of the living unit occupying a position, if any.
    #[must_use]
    pub fn unit_at(board: &Board, position: Position) -> Option<UnitSnapshot> {
        board
            .occupancy
            .occupant(position)
            .and_then(|id| unit(board, id))
    }

    /// Terrain content at the given position; out-of-map positions are wall.
    #[must_use]
    pub fn cell_at(board: &Board, position: Position) -> Cell {
        board.terrain.cell_at(position)
    }

    /// Reports whether a position is open terrain with no living occupant.
    #[must_use]
    pub fn is_open_and_free(board: &Board, position: Position) -> bool {
        board.terrain.cell_at(position) == Cell::Open
            && board.occupancy.occupant(position).is_none()
    }

    /// Width and height of the board in cells.
    #[must_use]
    pub fn dimensions(board: &Board) -> (u32, u32) {
        (board.terrain.width, board.terrain.height)
    }

    /// Number of living units fighting for the given faction.
    #[must_use]
    pub fn live_count(board: &Board, faction: Faction) -> usize {
        board
            .units
            .iter()
            .filter(|unit| unit.faction == faction)
            .count()
    }

    /// Sum of remaining hit points across the given faction.
    #[must_use]
    pub fn total_hit_points(board: &Board, faction: Faction) -> u32 {
        board
            .units
            .iter()
            .filter(|unit| unit.faction == faction)
            .map(|unit| unit.hit_points.get())
            .sum()
    }
}

/// Test-only hooks for constructing mid-battle situations.
///
/// Gated behind the `combat_scaffolding` feature so production systems can
/// never reach in and edit registry state directly.
#[cfg(feature = "combat_scaffolding")]
pub mod scaffolding {
    use super::Board;
    use skirmish_core::{HitPoints, UnitId};

    /// Overwrites a living unit's hit points, returning `false` when the
    /// unit does not exist.
    pub fn set_hit_points(board: &mut Board, unit: UnitId, hit_points: HitPoints) -> bool {
        match board.unit_index(unit) {
            Some(index) => {
                board.units[index].hit_points = hit_points;
                true
            }
            None => false,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Unit {
    id: UnitId,
    faction: Faction,
    position: Position,
    hit_points: HitPoints,
    attack_power: AttackPower,
}

impl Unit {
    fn snapshot(&self) -> UnitSnapshot {
        UnitSnapshot {
            id: self.id,
            faction: self.faction,
            position: self.position,
            hit_points: self.hit_points,
            attack_power: self.attack_power,
        }
    }
}

#[derive(Clone, Debug)]
struct Terrain {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
}

impl Terrain {
    fn cell_at(&self, position: Position) -> Cell {
        match self.index(position) {
            Some(index) => self.cells[index],
            None => Cell::Wall,
        }
    }

    fn index(&self, position: Position) -> Option<usize> {
        if position.col() < self.width && position.row() < self.height {
            let row = usize::try_from(position.row()).ok()?;
            let col = usize::try_from(position.col()).ok()?;
            let width = usize::try_from(self.width).ok()?;
            Some(row * width + col)
        } else {
            None
        }
    }

    /// Labels each open cell with the id of its wall-bounded region via
    /// flood fill. Wall cells stay unlabeled.
    fn region_labels(&self) -> Vec<Option<u32>> {
        let mut labels: Vec<Option<u32>> = vec![None; self.cells.len()];
        let mut next_label = 0u32;
        let mut queue = VecDeque::new();

        for row in 0..self.height {
            for col in 0..self.width {
                let seed = Position::new(row, col);
                let Some(seed_index) = self.index(seed) else {
                    continue;
                };
                if self.cells[seed_index] == Cell::Wall || labels[seed_index].is_some() {
                    continue;
                }

                labels[seed_index] = Some(next_label);
                queue.push_back(seed);
                while let Some(current) = queue.pop_front() {
                    for neighbor in current.neighbors() {
                        let Some(index) = self.index(neighbor) else {
                            continue;
                        };
                        if self.cells[index] == Cell::Wall || labels[index].is_some() {
                            continue;
                        }
                        labels[index] = Some(next_label);
                        queue.push_back(neighbor);
                    }
                }
                next_label += 1;
            }
        }

        labels
    }
}

#[derive(Clone, Debug)]
struct OccupancyGrid {
    width: u32,
    height: u32,
    cells: Vec<Option<UnitId>>,
}

impl OccupancyGrid {
    fn new(width: u32, height: u32) -> Self {
        let capacity_u64 = u64::from(width) * u64::from(height);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            width,
            height,
            cells: vec![None; capacity],
        }
    }

    fn fill_with(&mut self, units: &[Unit]) {
        self.cells.fill(None);
        for unit in units {
            if let Some(index) = self.index(unit.position) {
                self.cells[index] = Some(unit.id);
            }
        }
    }

    fn occupant(&self, position: Position) -> Option<UnitId> {
        self.index(position)
            .and_then(|index| self.cells.get(index).copied().flatten())
    }

    fn occupy(&mut self, unit: UnitId, position: Position) {
        if let Some(index) = self.index(position) {
            if let Some(slot) = self.cells.get_mut(index) {
                *slot = Some(unit);
            }
        }
    }

    fn vacate(&mut self, position: Position) {
        if let Some(index) = self.index(position) {
            if let Some(slot) = self.cells.get_mut(index) {
                *slot = None;
            }
        }
    }

    fn index(&self, position: Position) -> Option<usize> {
        if position.col() < self.width && position.row() < self.height {
            let row = usize::try_from(position.row()).ok()?;
            let col = usize::try_from(position.col()).ok()?;
            let width = usize::try_from(self.width).ok()?;
            Some(row * width + col)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUEL: [&str; 5] = [
        "#####",
        "#E.G#",
        "#...#",
        "#...#",
        "#####",
    ];

    fn duel_board() -> Board {
        Board::from_lines(&DUEL).expect("valid map")
    }

    fn id_at(board: &Board, row: u32, col: u32) -> UnitId {
        query::unit_at(board, Position::new(row, col))
            .expect("unit present")
            .id
    }

    #[test]
    fn construction_populates_registry_and_occupancy() {
        let board = duel_board();
        let view = query::unit_view(&board);
        let factions: Vec<Faction> = view.iter().map(|unit| unit.faction).collect();
        assert_eq!(factions, vec![Faction::Elf, Faction::Goblin]);
        assert!(query::is_open_and_free(&board, Position::new(2, 2)));
        assert!(!query::is_open_and_free(&board, Position::new(1, 1)));
        assert!(!query::is_open_and_free(&board, Position::new(0, 0)));
        assert_eq!(query::dimensions(&board), (5, 5));
    }

    #[test]
    fn elf_power_override_spares_goblins() {
        let board =
            Board::from_lines_with_elf_power(&DUEL, AttackPower::new(13)).expect("valid map");
        let view = query::unit_view(&board);
        for unit in view.iter() {
            match unit.faction {
                Faction::Elf => assert_eq!(unit.attack_power, AttackPower::new(13)),
                Faction::Goblin => assert_eq!(unit.attack_power, DEFAULT_ATTACK_POWER),
            }
        }
    }

    #[test]
    fn moves_update_registry_and_occupancy_together() {
        let mut board = duel_board();
        let elf = id_at(&board, 1, 1);
        let mut events = Vec::new();

        apply(
            &mut board,
            Command::MoveUnit {
                unit: elf,
                to: Position::new(2, 1),
            },
            &mut events,
        )
        .expect("legal move");

        assert_eq!(
            events,
            vec![Event::UnitMoved {
                unit: elf,
                from: Position::new(1, 1),
                to: Position::new(2, 1),
            }]
        );
        assert!(query::is_open_and_free(&board, Position::new(1, 1)));
        assert_eq!(query::unit_at(&board, Position::new(2, 1)).map(|u| u.id), Some(elf));
        assert_eq!(query::unit(&board, elf).map(|u| u.position), Some(Position::new(2, 1)));
    }

    #[test]
    fn illegal_moves_are_rejected_without_mutation() {
        let mut board = duel_board();
        let elf = id_at(&board, 1, 1);
        let goblin = id_at(&board, 1, 3);
        let mut events = Vec::new();

        let into_wall = apply(
            &mut board,
            Command::MoveUnit {
                unit: elf,
                to: Position::new(0, 1),
            },
            &mut events,
        );
        assert_eq!(
            into_wall,
            Err(CommandError::MoveIntoWall {
                unit: elf,
                to: Position::new(0, 1),
            })
        );

        let teleport = apply(
            &mut board,
            Command::MoveUnit {
                unit: elf,
                to: Position::new(3, 3),
            },
            &mut events,
        );
        assert_eq!(
            teleport,
            Err(CommandError::MoveNotAdjacent {
                unit: elf,
                from: Position::new(1, 1),
                to: Position::new(3, 3),
            })
        );

        let distant_strike = apply(
            &mut board,
            Command::Strike {
                attacker: elf,
                target: goblin,
            },
            &mut events,
        );
        assert_eq!(
            distant_strike,
            Err(CommandError::StrikeNotAdjacent {
                attacker: elf,
                target: goblin,
            })
        );

        assert!(events.is_empty());
        assert_eq!(query::unit(&board, elf).map(|u| u.position), Some(Position::new(1, 1)));
    }

    #[test]
    fn strikes_wound_and_lethal_damage_vacates_the_cell() {
        let mut board = Board::from_lines(&["####", "#EG#", "####"]).expect("valid map");
        let elf = id_at(&board, 1, 1);
        let goblin = id_at(&board, 1, 2);
        let mut events = Vec::new();

        apply(
            &mut board,
            Command::Strike {
                attacker: elf,
                target: goblin,
            },
            &mut events,
        )
        .expect("legal strike");
        assert_eq!(
            query::unit(&board, goblin).map(|u| u.hit_points),
            Some(HitPoints::new(197))
        );

        #[cfg(feature = "combat_scaffolding")]
        {
            assert!(scaffolding::set_hit_points(
                &mut board,
                goblin,
                HitPoints::new(2)
            ));
            events.clear();
            apply(
                &mut board,
                Command::Strike {
                    attacker: elf,
                    target: goblin,
                },
                &mut events,
            )
            .expect("legal strike");
            assert_eq!(
                events,
                vec![
                    Event::UnitStruck {
                        attacker: elf,
                        target: goblin,
                        damage: DEFAULT_ATTACK_POWER,
                        remaining: HitPoints::new(0),
                    },
                    Event::UnitDied {
                        unit: goblin,
                        faction: Faction::Goblin,
                        position: Position::new(1, 2),
                    },
                ]
            );
            assert!(query::unit(&board, goblin).is_none());
            assert!(query::is_open_and_free(&board, Position::new(1, 2)));
        }
    }

    #[test]
    fn friendly_fire_is_rejected() {
        let mut board = Board::from_lines(&["#####", "#EEG#", "#####"]).expect("valid map");
        let first = id_at(&board, 1, 1);
        let second = id_at(&board, 1, 2);
        let mut events = Vec::new();

        let result = apply(
            &mut board,
            Command::Strike {
                attacker: first,
                target: second,
            },
            &mut events,
        );
        assert_eq!(
            result,
            Err(CommandError::FriendlyFire {
                attacker: first,
                target: second,
            })
        );
    }

    #[test]
    fn construction_rejects_missing_faction() {
        let result = Board::from_lines(&["####", "#GG#", "####"]);
        assert_eq!(
            result.err(),
            Some(MapError::MissingFaction {
                faction: Faction::Elf
            })
        );
    }

    #[test]
    fn construction_rejects_walled_off_units() {
        let result = Board::from_lines(&["#####", "#E#G#", "#####"]);
        assert_eq!(
            result.err(),
            Some(MapError::UnreachableOpposition {
                position: Position::new(1, 1),
            })
        );
    }
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-round turn orchestration for the combat simulation.
//!
//! [`TurnEngine::play_round`] freezes the acting order at round start and
//! walks each live unit through the turn protocol: combat-readiness check,
//! adjacent-foe acquisition, movement toward the nearest in-range cell, and
//! the strike. All board mutation is issued as [`Command`] values through
//! [`skirmish_world::apply`], so the registry and the occupancy grid can
//! never drift apart mid-round. Rejected commands indicate a planning bug
//! and abort the round as [`EngineError`].

use skirmish_core::{Command, Event, Faction, Position, UnitId};
use skirmish_system_pathfinding::{first_step, DistanceField};
use skirmish_world::{self as world, query, Board, CommandError};
use thiserror::Error;

/// How a round of combat concluded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundOutcome {
    /// Every scheduled unit took (or was dead for) its turn.
    Completed {
        /// Number of moves and strikes executed during the round.
        actions: u32,
    },
    /// A unit found no living foe anywhere; the round was aborted mid-way
    /// and must not be counted.
    CombatEnded,
}

/// Failures that abort a round. Each one is a logic-bug signal, never a
/// state the simulation may continue from.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// The board rejected a planned command.
    #[error("board rejected a planned command: {0}")]
    Command(#[from] CommandError),
    /// A goal chosen from the distance field yielded no first step. The
    /// goal was reachable when selected, so this cannot happen unless the
    /// field and the selection disagree.
    #[error("no first step from {origin:?} toward reachable goal {goal:?}")]
    PathInvariant {
        /// Acting unit's position when the goal was chosen.
        origin: Position,
        /// The chosen movement goal.
        goal: Position,
    },
}

/// Round orchestrator; reuses its pathfinding buffers across turns.
#[derive(Debug, Default)]
pub struct TurnEngine {
    field: DistanceField,
    order: Vec<UnitId>,
    in_range: Vec<Position>,
}

impl TurnEngine {
    /// Creates a new engine with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Plays one round of combat.
    ///
    /// The acting order is the reading order of unit positions at the
    /// moment this function is entered; units that die mid-round are
    /// skipped, and units that move do not act twice.
    pub fn play_round(
        &mut self,
        board: &mut Board,
        out_events: &mut Vec<Event>,
    ) -> Result<RoundOutcome, EngineError> {
        self.order.clear();
        self.order
            .extend(query::unit_view(board).iter().map(|unit| unit.id));

        let mut actions = 0u32;
        for index in 0..self.order.len() {
            let unit_id = self.order[index];
            let Some(actor) = query::unit(board, unit_id) else {
                // Died earlier this round.
                continue;
            };

            if query::live_count(board, actor.faction.foe()) == 0 {
                return Ok(RoundOutcome::CombatEnded);
            }

            let mut position = actor.position;
            if best_adjacent_foe(board, actor.faction, position).is_none() {
                if let Some(step) = self.plan_step(board, actor.faction, position)? {
                    world::apply(
                        board,
                        Command::MoveUnit {
                            unit: unit_id,
                            to: step,
                        },
                        out_events,
                    )?;
                    position = step;
                    actions += 1;
                }
            }

            if let Some(target) = best_adjacent_foe(board, actor.faction, position) {
                world::apply(
                    board,
                    Command::Strike {
                        attacker: unit_id,
                        target,
                    },
                    out_events,
                )?;
                actions += 1;
            }
        }

        Ok(RoundOutcome::Completed { actions })
    }

    /// Chooses the one-cell step for a unit with no adjacent foe.
    ///
    /// The goal is the reachable in-range cell minimizing (distance,
    /// reading order); distances are computed from the unit's pre-move
    /// position. Returns `Ok(None)` when no in-range cell is reachable.
    fn plan_step(
        &mut self,
        board: &Board,
        faction: Faction,
        origin: Position,
    ) -> Result<Option<Position>, EngineError> {
        self.in_range.clear();
        let view = query::unit_view(board);
        for foe in view.of_faction(faction.foe()) {
            for cell in foe.position.neighbors() {
                if query::is_open_and_free(board, cell) {
                    self.in_range.push(cell);
                }
            }
        }
        self.in_range.sort_unstable();
        self.in_range.dedup();
        if self.in_range.is_empty() {
            return Ok(None);
        }

        let (width, height) = query::dimensions(board);
        self.field.rebuild_with(width, height, origin, |cell| {
            !query::is_open_and_free(board, cell)
        });

        let goal = self
            .in_range
            .iter()
            .copied()
            .filter_map(|cell| self.field.distance(cell).map(|distance| (distance, cell)))
            .min()
            .map(|(_, cell)| cell);
        let Some(goal) = goal else {
            return Ok(None);
        };

        let step = first_step(origin, goal, &self.field)
            .ok_or(EngineError::PathInvariant { origin, goal })?;
        Ok(Some(step))
    }
}

/// Selects the strike target among foes adjacent to `position`: fewest hit
/// points first, reading order of position on ties.
fn best_adjacent_foe(board: &Board, faction: Faction, position: Position) -> Option<UnitId> {
    position
        .neighbors()
        .filter_map(|cell| query::unit_at(board, cell))
        .filter(|unit| unit.faction == faction.foe())
        .min_by_key(|unit| (unit.hit_points, unit.position))
        .map(|unit| unit.id)
}

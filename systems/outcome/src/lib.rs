#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Combat termination, scoring, and the flawless-victory power sweep.
//!
//! [`run_combat`] drives [`TurnEngine`] rounds until one faction is
//! eliminated and reduces the final board to a [`CombatReport`].
//! [`run_until_flawless`] reruns the whole simulation on freshly built
//! boards, raising the elves' attack power one point at a time from the
//! default, until the elves win without losing a single unit. Attempts are
//! made in increasing power order, so the reported power is minimal.

use serde::{Deserialize, Serialize};
use skirmish_core::{AttackPower, Event, Faction, DEFAULT_ATTACK_POWER};
use skirmish_system_turn_engine::{EngineError, RoundOutcome, TurnEngine};
use skirmish_world::{query, Board, MapError};
use thiserror::Error;

/// Failures that end a simulation without a scored outcome.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum CombatError {
    /// A round aborted on an invariant violation.
    #[error(transparent)]
    Engine(#[from] EngineError),
    /// A sweep attempt failed to construct its board.
    #[error(transparent)]
    Map(#[from] MapError),
    /// A full round passed in which no unit could move or strike while both
    /// factions survive. Nothing on the board can ever change again, so the
    /// scenario is unwinnable rather than unfinished.
    #[error("combat stalled: a full round passed with no unit able to move or strike")]
    Stalemate,
}

/// Final accounting of one simulation run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatReport {
    /// Rounds that ran to completion before combat ended. The round whose
    /// combat-readiness check aborted is not counted.
    pub completed_rounds: u32,
    /// Faction with surviving units.
    pub winner: Faction,
    /// Sum of hit points across the survivors.
    pub remaining_hit_points: u32,
    /// Elves present at the start that did not survive.
    pub elf_losses: u32,
    /// Goblins present at the start that did not survive.
    pub goblin_losses: u32,
}

impl CombatReport {
    /// The battle score: completed rounds times remaining hit points.
    #[must_use]
    pub const fn score(&self) -> u32 {
        self.completed_rounds * self.remaining_hit_points
    }

    /// Reports whether the given faction won without a single loss.
    #[must_use]
    pub fn is_flawless_for(&self, faction: Faction) -> bool {
        let losses = match faction {
            Faction::Elf => self.elf_losses,
            Faction::Goblin => self.goblin_losses,
        };
        self.winner == faction && losses == 0
    }
}

/// Outcome of the attack-power sweep.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlawlessReport {
    /// The minimal elf attack power that produced a loss-free victory.
    pub power: AttackPower,
    /// The report of the winning attempt.
    pub report: CombatReport,
}

/// Runs the simulation on the given board until one faction is eliminated.
///
/// The board is consumed as working state; afterwards it holds the final
/// battlefield, which callers may render for debugging.
pub fn run_combat(board: &mut Board) -> Result<CombatReport, CombatError> {
    let initial_elves = query::live_count(board, Faction::Elf) as u32;
    let initial_goblins = query::live_count(board, Faction::Goblin) as u32;

    let mut engine = TurnEngine::new();
    let mut events: Vec<Event> = Vec::new();
    let mut completed_rounds = 0u32;
    loop {
        events.clear();
        match engine.play_round(board, &mut events)? {
            RoundOutcome::CombatEnded => break,
            RoundOutcome::Completed { actions: 0 } => return Err(CombatError::Stalemate),
            RoundOutcome::Completed { .. } => completed_rounds += 1,
        }
    }

    let winner = if query::live_count(board, Faction::Elf) > 0 {
        Faction::Elf
    } else {
        Faction::Goblin
    };
    let report = CombatReport {
        completed_rounds,
        winner,
        remaining_hit_points: query::total_hit_points(board, winner),
        elf_losses: initial_elves - query::live_count(board, Faction::Elf) as u32,
        goblin_losses: initial_goblins - query::live_count(board, Faction::Goblin) as u32,
    };
    log::debug!(
        "combat ended after {} rounds: {:?} win with {} hit points remaining",
        report.completed_rounds,
        report.winner,
        report.remaining_hit_points
    );
    Ok(report)
}

/// Searches for the minimal elf attack power yielding a flawless victory.
///
/// `build` constructs a brand-new board for each candidate power; no state
/// is carried between attempts. The search starts one point above the
/// default power and loops unbounded upward, which terminates for any board
/// where sufficiently strong elves kill before taking lethal return damage.
pub fn run_until_flawless<F>(mut build: F) -> Result<FlawlessReport, CombatError>
where
    F: FnMut(AttackPower) -> Result<Board, MapError>,
{
    let mut power = DEFAULT_ATTACK_POWER.stronger();
    loop {
        let mut board = build(power)?;
        let report = run_combat(&mut board)?;
        log::debug!(
            "elf power {}: {:?} win, score {}, elf losses {}",
            power.get(),
            report.winner,
            report.score(),
            report.elf_losses
        );
        if report.is_flawless_for(Faction::Elf) {
            return Ok(FlawlessReport { power, report });
        }
        power = power.stronger();
    }
}

//! Round-protocol scenarios against reference boards.

use skirmish_core::{Event, Faction, HitPoints, Position, UnitId};
use skirmish_system_turn_engine::{RoundOutcome, TurnEngine};
use skirmish_world::{query, scaffolding, Board};

const REFERENCE: [&str; 7] = [
    "#######",
    "#.G...#",
    "#...EG#",
    "#.#.#G#",
    "#..G#E#",
    "#.....#",
    "#######",
];

fn id_at(board: &Board, row: u32, col: u32) -> UnitId {
    query::unit_at(board, Position::new(row, col))
        .expect("unit present")
        .id
}

fn roster(board: &Board) -> Vec<(Position, Faction, u32)> {
    query::unit_view(board)
        .iter()
        .map(|unit| (unit.position, unit.faction, unit.hit_points.get()))
        .collect()
}

#[test]
fn two_rounds_of_the_reference_board_match_the_published_trace() {
    let mut board = Board::from_lines(&REFERENCE).expect("valid map");
    let mut engine = TurnEngine::new();
    let mut events = Vec::new();

    let first = engine.play_round(&mut board, &mut events).expect("round");
    assert!(matches!(first, RoundOutcome::Completed { .. }));
    assert_eq!(
        roster(&board),
        vec![
            (Position::new(1, 3), Faction::Goblin, 200),
            (Position::new(2, 4), Faction::Elf, 197),
            (Position::new(2, 5), Faction::Goblin, 197),
            (Position::new(3, 3), Faction::Goblin, 200),
            (Position::new(3, 5), Faction::Goblin, 197),
            (Position::new(4, 5), Faction::Elf, 197),
        ]
    );

    let second = engine.play_round(&mut board, &mut events).expect("round");
    assert!(matches!(second, RoundOutcome::Completed { .. }));
    assert_eq!(
        roster(&board),
        vec![
            (Position::new(1, 4), Faction::Goblin, 200),
            (Position::new(2, 3), Faction::Goblin, 200),
            (Position::new(2, 4), Faction::Elf, 188),
            (Position::new(2, 5), Faction::Goblin, 194),
            (Position::new(3, 5), Faction::Goblin, 194),
            (Position::new(4, 5), Faction::Elf, 194),
        ]
    );
}

#[test]
fn adjacent_units_attack_without_moving_and_prefer_wounded_targets() {
    let mut board = Board::from_lines(&["#####", "#GEG#", "#####"]).expect("valid map");
    let elf = id_at(&board, 1, 2);
    let right = id_at(&board, 1, 3);
    assert!(scaffolding::set_hit_points(
        &mut board,
        right,
        HitPoints::new(50)
    ));

    let mut engine = TurnEngine::new();
    let mut events = Vec::new();
    let outcome = engine.play_round(&mut board, &mut events).expect("round");
    assert_eq!(outcome, RoundOutcome::Completed { actions: 3 });

    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::UnitMoved { .. })));
    let elf_target = events.iter().find_map(|event| match event {
        Event::UnitStruck {
            attacker, target, ..
        } if *attacker == elf => Some(*target),
        _ => None,
    });
    assert_eq!(elf_target, Some(right), "fewest hit points wins the strike");
}

#[test]
fn hit_point_ties_resolve_by_reading_order() {
    let mut board = Board::from_lines(&["#####", "#GEG#", "#####"]).expect("valid map");
    let elf = id_at(&board, 1, 2);
    let left = id_at(&board, 1, 1);

    let mut engine = TurnEngine::new();
    let mut events = Vec::new();
    let _ = engine.play_round(&mut board, &mut events).expect("round");

    let elf_target = events.iter().find_map(|event| match event {
        Event::UnitStruck {
            attacker, target, ..
        } if *attacker == elf => Some(*target),
        _ => None,
    });
    assert_eq!(elf_target, Some(left));
}

#[test]
fn a_death_opens_the_cell_for_later_units_in_the_same_round() {
    let mut board = Board::from_lines(&["######", "#EG.G#", "######"]).expect("valid map");
    let doomed = id_at(&board, 1, 2);
    let far_goblin = id_at(&board, 1, 4);
    assert!(scaffolding::set_hit_points(
        &mut board,
        doomed,
        HitPoints::new(3)
    ));

    let mut engine = TurnEngine::new();
    let mut events = Vec::new();
    let _ = engine.play_round(&mut board, &mut events).expect("round");

    assert!(events.iter().any(|event| matches!(
        event,
        Event::UnitDied { unit, .. } if *unit == doomed
    )));
    // The surviving goblin pathed through the space the death opened.
    assert_eq!(
        query::unit(&board, far_goblin).map(|unit| unit.position),
        Some(Position::new(1, 3))
    );
}

#[test]
fn a_round_without_living_foes_is_aborted_as_combat_ended() {
    let mut board = Board::from_lines(&["####", "#EG#", "####"]).expect("valid map");
    let goblin = id_at(&board, 1, 2);
    assert!(scaffolding::set_hit_points(
        &mut board,
        goblin,
        HitPoints::new(3)
    ));

    let mut engine = TurnEngine::new();
    let mut events = Vec::new();
    let first = engine.play_round(&mut board, &mut events).expect("round");
    assert_eq!(first, RoundOutcome::Completed { actions: 1 });
    assert_eq!(query::live_count(&board, Faction::Goblin), 0);

    let second = engine.play_round(&mut board, &mut events).expect("round");
    assert_eq!(second, RoundOutcome::CombatEnded);
}

#[test]
fn replaying_the_same_board_yields_identical_event_logs() {
    let run = || {
        let mut board = Board::from_lines(&REFERENCE).expect("valid map");
        let mut engine = TurnEngine::new();
        let mut events = Vec::new();
        loop {
            match engine.play_round(&mut board, &mut events).expect("round") {
                RoundOutcome::Completed { .. } => {}
                RoundOutcome::CombatEnded => break,
            }
        }
        events
    };

    let first = run();
    let second = run();
    assert_eq!(first, second, "replay diverged between runs");
    assert!(!first.is_empty());
}

//! Text rendering of a battlefield for debugging output.

use skirmish_core::Position;
use skirmish_world::{query, Board, Cell};

/// Renders the board in the map text format, one row per line, with a
/// sidebar listing each row's units as `G(200)`-style hit-point tags.
pub(crate) fn battlefield(board: &Board) -> String {
    let (width, height) = query::dimensions(board);
    let mut out = String::new();
    for row in 0..height {
        let mut sidebar: Vec<String> = Vec::new();
        for col in 0..width {
            let position = Position::new(row, col);
            let glyph = match query::unit_at(board, position) {
                Some(unit) => {
                    sidebar.push(format!("{}({})", unit.faction.glyph(), unit.hit_points.get()));
                    unit.faction.glyph()
                }
                None => match query::cell_at(board, position) {
                    Cell::Open => '.',
                    Cell::Wall => '#',
                },
            };
            out.push(glyph);
        }
        if !sidebar.is_empty() {
            out.push_str("   ");
            out.push_str(&sidebar.join(", "));
        }
        out.push('\n');
    }
    out
}

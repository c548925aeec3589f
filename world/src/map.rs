//! Parsing for the rectangular `.#EG` map-text format.
//!
//! The parser is a thin boundary collaborator: it turns text into a
//! [`MapLayout`] that [`Board::new`](crate::Board::new) consumes, and it
//! rejects malformed input immediately instead of defaulting anything.
//! Blank lines are skipped and surrounding whitespace is trimmed; positions
//! beyond a ragged line's end are treated as wall, matching the implicit
//! wall surrounding the map.

use skirmish_core::{Faction, Position};
use thiserror::Error;

use crate::Cell;

/// Failures surfaced while turning map text into a board.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum MapError {
    /// The input contained no non-blank lines.
    #[error("map contains no cells")]
    EmptyMap,
    /// The input contained a character outside the `.#EG` alphabet.
    #[error("unrecognized map glyph {glyph:?} at {position:?}")]
    UnknownGlyph {
        /// The offending character.
        glyph: char,
        /// Where it appeared.
        position: Position,
    },
    /// One faction has no units, so combat can never take place.
    #[error("no {faction:?} units on the map")]
    MissingFaction {
        /// The absent faction.
        faction: Faction,
    },
    /// A unit is walled off from every opponent and could never fight.
    #[error("unit at {position:?} can never reach an opponent")]
    UnreachableOpposition {
        /// Starting position of the isolated unit.
        position: Position,
    },
}

/// Parsed map: terrain cells in row-major order plus unit starting spawns.
#[derive(Clone, Debug)]
pub struct MapLayout {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
    spawns: Vec<(Faction, Position)>,
}

impl MapLayout {
    /// Width of the map in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the map in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Faction and starting position of every unit, in reading order.
    #[must_use]
    pub fn spawns(&self) -> &[(Faction, Position)] {
        &self.spawns
    }

    pub(crate) fn into_cells(self) -> Vec<Cell> {
        self.cells
    }
}

/// Parses map text into a [`MapLayout`].
pub fn parse_lines<S: AsRef<str>>(lines: &[S]) -> Result<MapLayout, MapError> {
    let rows: Vec<&str> = lines
        .iter()
        .map(|line| line.as_ref().trim())
        .filter(|line| !line.is_empty())
        .collect();
    if rows.is_empty() {
        return Err(MapError::EmptyMap);
    }

    let width = rows
        .iter()
        .map(|row| row.chars().count())
        .max()
        .unwrap_or(0) as u32;
    let height = rows.len() as u32;

    let mut cells = vec![Cell::Wall; (width as usize) * rows.len()];
    let mut spawns = Vec::new();

    for (row_index, row) in rows.iter().enumerate() {
        for (col_index, glyph) in row.chars().enumerate() {
            let position = Position::new(row_index as u32, col_index as u32);
            let cell = match glyph {
                '.' => Cell::Open,
                '#' => Cell::Wall,
                'E' => {
                    spawns.push((Faction::Elf, position));
                    Cell::Open
                }
                'G' => {
                    spawns.push((Faction::Goblin, position));
                    Cell::Open
                }
                _ => return Err(MapError::UnknownGlyph { glyph, position }),
            };
            cells[row_index * width as usize + col_index] = cell;
        }
    }

    Ok(MapLayout {
        width,
        height,
        cells,
        spawns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_glyphs_and_records_spawns_in_reading_order() {
        let layout = parse_lines(&["#####", "#E.G#", "#####"]).expect("valid map");
        assert_eq!(layout.width(), 5);
        assert_eq!(layout.height(), 3);
        assert_eq!(
            layout.spawns(),
            &[
                (Faction::Elf, Position::new(1, 1)),
                (Faction::Goblin, Position::new(1, 3)),
            ]
        );
    }

    #[test]
    fn blank_lines_and_padding_are_ignored() {
        let layout = parse_lines(&["", "  #####  ", "#E.G#", "", "#####", "   "])
            .expect("valid map");
        assert_eq!(layout.height(), 3);
    }

    #[test]
    fn short_lines_fall_back_to_wall() {
        let layout = parse_lines(&["#####", "#E.G#", "###"]).expect("valid map");
        let width = layout.width() as usize;
        let cells = layout.into_cells();
        assert_eq!(cells[2 * width + 4], Cell::Wall);
    }

    #[test]
    fn unknown_glyphs_are_rejected_with_their_position() {
        let result = parse_lines(&["#####", "#E?G#", "#####"]);
        assert_eq!(
            result.err(),
            Some(MapError::UnknownGlyph {
                glyph: '?',
                position: Position::new(1, 2),
            })
        );
    }

    #[test]
    fn empty_input_is_rejected() {
        let no_lines: [&str; 0] = [];
        assert_eq!(parse_lines(&no_lines).err(), Some(MapError::EmptyMap));
        assert_eq!(parse_lines(&["", "   "]).err(), Some(MapError::EmptyMap));
    }
}

use std::fmt;

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

use super::{
    FIELD_HEIGHT, FIELD_WIDTH,
    piece::{Piece, PieceKind},
};

/// Number of rows at the top of the field that count as the danger zone.
const DANGER_ZONE_ROWS: usize = 4;

/// A single cell of the playing field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    #[default]
    Empty,
    /// Cell filled by a locked (or active) piece of the given kind.
    Occupied(PieceKind),
}

impl Cell {
    #[must_use]
    pub const fn is_empty(self) -> bool {
        matches!(self, Cell::Empty)
    }

    #[must_use]
    pub const fn kind(self) -> Option<PieceKind> {
        match self {
            Cell::Empty => None,
            Cell::Occupied(kind) => Some(kind),
        }
    }

    /// Numeric value of the cell: `0` when empty, otherwise the colour id.
    #[must_use]
    pub const fn value(self) -> u8 {
        match self {
            Cell::Empty => 0,
            Cell::Occupied(kind) => kind.color_id(),
        }
    }

    #[must_use]
    pub const fn from_value(value: u8) -> Option<Self> {
        if value == 0 {
            return Some(Cell::Empty);
        }
        match PieceKind::from_color_id(value) {
            Some(kind) => Some(Cell::Occupied(kind)),
            None => None,
        }
    }

    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::Occupied(kind) => kind.as_char(),
        }
    }

    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        if c == '.' {
            return Some(Cell::Empty);
        }
        match PieceKind::from_char(c) {
            Some(kind) => Some(Cell::Occupied(kind)),
            None => None,
        }
    }
}

pub type FieldRow = [Cell; FIELD_WIDTH];

/// Pre-clear indices of the rows removed by one [`Field::clear_lines`] call,
/// ordered bottom to top.
pub type ClearedRows = ArrayVec<usize, FIELD_HEIGHT>;

/// The 10×20 grid of settled cells.
///
/// Row 0 is the top of the field and row 19 the bottom. The active piece is
/// not part of the field until it locks.
///
/// # Collision Rules
///
/// A piece collides when any of its cells
///
/// - lies outside the columns `0..10`
/// - lies at or below row 20
/// - overlaps an occupied cell
///
/// Cells above row 0 are ignored, so pieces may hang partially above the field.
///
/// # Example
///
/// ```
/// use stackfall_engine::{Field, Piece, PieceKind};
///
/// let mut field = Field::EMPTY;
/// let piece = Piece::new(PieceKind::I).simulate_drop_position(&field);
/// field.lock_piece(&piece);
/// assert!(field.clear_lines().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    rows: [FieldRow; FIELD_HEIGHT],
}

impl Default for Field {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Field {
    pub const WIDTH: usize = FIELD_WIDTH;
    pub const HEIGHT: usize = FIELD_HEIGHT;

    pub const EMPTY: Self = Self {
        rows: [[Cell::Empty; FIELD_WIDTH]; FIELD_HEIGHT],
    };

    /// Returns the cell at `(x, y)`, or `None` outside the field.
    #[must_use]
    pub fn cell(&self, x: i32, y: i32) -> Option<Cell> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        self.rows.get(y)?.get(x).copied()
    }

    pub fn rows(&self) -> impl Iterator<Item = &FieldRow> {
        self.rows.iter()
    }

    #[must_use]
    pub fn is_colliding(&self, piece: &Piece) -> bool {
        piece.occupied_positions().any(|(x, y)| {
            let Ok(x) = usize::try_from(x) else {
                return true;
            };
            if x >= FIELD_WIDTH {
                return true;
            }
            let Ok(y) = usize::try_from(y) else {
                // Above the top edge
                return false;
            };
            y >= FIELD_HEIGHT || !self.rows[y][x].is_empty()
        })
    }

    /// Copies the piece's cells into the field.
    ///
    /// Cells outside the field are dropped.
    pub fn lock_piece(&mut self, piece: &Piece) {
        for (dx, dy, kind) in piece.shape().occupied_cells() {
            let x = piece.position().x() + dx;
            let y = piece.position().y() + dy;
            let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y)) else {
                continue;
            };
            if x < FIELD_WIDTH && y < FIELD_HEIGHT {
                self.rows[y][x] = Cell::Occupied(kind);
            }
        }
    }

    /// Removes every full row and shifts the rows above it down.
    ///
    /// Rows are scanned from the bottom; after a removal the same row index is
    /// examined again, since it now holds the row that was above. The returned
    /// indices refer to the field as it was before the call.
    pub fn clear_lines(&mut self) -> ClearedRows {
        let mut cleared = ClearedRows::new();
        let mut y = FIELD_HEIGHT;
        while y > 0 {
            let row = y - 1;
            if self.rows[row].iter().all(|cell| !cell.is_empty()) {
                cleared.push(row - cleared.len());
                self.rows[..=row].rotate_right(1);
                self.rows[0] = [Cell::Empty; FIELD_WIDTH];
            } else {
                y -= 1;
            }
        }
        cleared
    }

    /// Returns `true` when any cell in the top rows is occupied.
    #[must_use]
    pub fn is_in_danger_zone(&self) -> bool {
        self.rows[..DANGER_ZONE_ROWS]
            .iter()
            .flatten()
            .any(|cell| !cell.is_empty())
    }

    /// Number of occupied cells.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.rows
            .iter()
            .flatten()
            .filter(|cell| !cell.is_empty())
            .count()
    }

    /// Builds a field from rows of text, aligned to the bottom of the field.
    ///
    /// Each row must be exactly ten characters, using `.` for empty cells and
    /// the piece letters for occupied ones.
    ///
    /// ```
    /// use stackfall_engine::{Cell, Field, PieceKind};
    ///
    /// let field = Field::from_rows(&["IIII......"]).unwrap();
    /// assert_eq!(field.cell(0, 19), Some(Cell::Occupied(PieceKind::I)));
    /// ```
    pub fn from_rows<S>(rows: &[S]) -> Result<Self, ParseFieldError>
    where
        S: AsRef<str>,
    {
        if rows.len() > FIELD_HEIGHT {
            return Err(ParseFieldError::TooManyRows { count: rows.len() });
        }
        let mut field = Self::EMPTY;
        let offset = FIELD_HEIGHT - rows.len();
        for (i, text) in rows.iter().enumerate() {
            let text = text.as_ref();
            let row = &mut field.rows[offset + i];
            let mut chars = text.chars();
            for cell in row.iter_mut() {
                let c = chars
                    .next()
                    .ok_or(ParseFieldError::RowWidth { row: i })?;
                *cell = Cell::from_char(c).ok_or(ParseFieldError::InvalidCell { row: i, c })?;
            }
            if chars.next().is_some() {
                return Err(ParseFieldError::RowWidth { row: i });
            }
        }
        Ok(field)
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ParseFieldError {
    #[display("field has {count} rows, at most 20 allowed")]
    TooManyRows { count: usize },
    #[display("row {row} must be exactly 10 cells wide")]
    RowWidth { row: usize },
    #[display("row {row} has invalid cell '{c}'")]
    InvalidCell { row: usize, c: char },
}

fn row_string(row: &FieldRow) -> String {
    row.iter().map(|cell| cell.as_char()).collect()
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", row_string(row))?;
        }
        Ok(())
    }
}

impl Serialize for Field {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.rows.iter().map(row_string))
    }
}

impl<'de> Deserialize<'de> for Field {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let rows = Vec::<String>::deserialize(deserializer)?;
        Self::from_rows(&rows).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::piece::{PiecePosition, PieceRotation};

    fn piece_at(kind: PieceKind, x: i32, y: i32) -> Piece {
        Piece::from_parts(kind, PieceRotation::default(), PiecePosition::new(x, y))
    }

    #[test]
    fn test_empty_field() {
        let field = Field::EMPTY;
        assert_eq!(field.rows().count(), Field::HEIGHT);
        assert!(field.rows().all(|row| row.iter().all(|c| c.is_empty())));
        assert_eq!(field.occupied_count(), 0);
        assert!(!field.is_in_danger_zone());
    }

    #[test]
    fn test_cell_out_of_bounds() {
        let field = Field::EMPTY;
        assert_eq!(field.cell(0, 0), Some(Cell::Empty));
        assert_eq!(field.cell(-1, 0), None);
        assert_eq!(field.cell(10, 0), None);
        assert_eq!(field.cell(0, 20), None);
    }

    #[test]
    fn test_collision_with_walls_and_floor() {
        let field = Field::EMPTY;
        // T spawn shape spans columns x..x+3
        assert!(!field.is_colliding(&piece_at(PieceKind::T, 0, 5)));
        assert!(field.is_colliding(&piece_at(PieceKind::T, -1, 5)));
        assert!(!field.is_colliding(&piece_at(PieceKind::T, 7, 5)));
        assert!(field.is_colliding(&piece_at(PieceKind::T, 8, 5)));
        assert!(!field.is_colliding(&piece_at(PieceKind::T, 3, 18)));
        assert!(field.is_colliding(&piece_at(PieceKind::T, 3, 19)));
    }

    #[test]
    fn test_cells_above_field_do_not_collide() {
        let field = Field::EMPTY;
        assert!(!field.is_colliding(&piece_at(PieceKind::T, 3, -1)));
        assert!(!field.is_colliding(&piece_at(PieceKind::T, 3, -5)));
        // Out of column range still collides above the field
        assert!(field.is_colliding(&piece_at(PieceKind::T, -1, -5)));
    }

    #[test]
    fn test_collision_with_occupied_cell() {
        let field = Field::from_rows(&["....Z....."]).unwrap();
        assert!(field.is_colliding(&piece_at(PieceKind::T, 3, 18)));
        assert!(!field.is_colliding(&piece_at(PieceKind::T, 5, 18)));
    }

    #[test]
    fn test_lock_piece() {
        let mut field = Field::EMPTY;
        field.lock_piece(&piece_at(PieceKind::T, 3, 18));
        assert_eq!(field.cell(4, 18), Some(Cell::Occupied(PieceKind::T)));
        assert_eq!(field.cell(3, 19), Some(Cell::Occupied(PieceKind::T)));
        assert_eq!(field.cell(4, 19), Some(Cell::Occupied(PieceKind::T)));
        assert_eq!(field.cell(5, 19), Some(Cell::Occupied(PieceKind::T)));
        assert_eq!(field.occupied_count(), 4);
    }

    #[test]
    fn test_lock_piece_drops_cells_above_field() {
        let mut field = Field::EMPTY;
        // T at y = -1: the nub is at row -1, the bar at row 0
        field.lock_piece(&piece_at(PieceKind::T, 3, -1));
        assert_eq!(field.occupied_count(), 3);
        assert!(field.is_in_danger_zone());
    }

    #[test]
    fn test_clear_single_line() {
        let mut field = Field::from_rows(&["...T......", "IIIIIIIIII"]).unwrap();
        let cleared = field.clear_lines();
        assert_eq!(cleared.as_slice(), &[19]);
        assert_eq!(field, Field::from_rows(&["...T......"]).unwrap());
    }

    #[test]
    fn test_clear_multiple_consecutive_lines() {
        let mut field = Field::from_rows(&[
            "O.........",
            "IIIIIIIIII",
            "IIIIIIIIII",
            "IIIIIIIIII",
        ])
        .unwrap();
        let cleared = field.clear_lines();
        assert_eq!(cleared.as_slice(), &[19, 18, 17]);
        assert_eq!(field, Field::from_rows(&["O........."]).unwrap());
    }

    #[test]
    fn test_clear_non_adjacent_lines() {
        let mut field = Field::from_rows(&[
            "IIIIIIIIII",
            "L.........",
            "IIIIIIIIII",
            "J.........",
        ])
        .unwrap();
        let cleared = field.clear_lines();
        assert_eq!(cleared.as_slice(), &[18, 16]);
        assert_eq!(
            field,
            Field::from_rows(&["L.........", "J........."]).unwrap()
        );
    }

    #[test]
    fn test_clear_lines_with_partial_line() {
        let mut field = Field::from_rows(&["IIIIIIIII."]).unwrap();
        assert!(field.clear_lines().is_empty());
        assert_eq!(field.occupied_count(), 9);
    }

    #[test]
    fn test_danger_zone() {
        let mut rows = vec![".........."; 17];
        rows[0] = "....S.....";
        let field = Field::from_rows(&rows).unwrap();
        // Row 3 is the lowest danger row
        assert_eq!(field.cell(4, 3), Some(Cell::Occupied(PieceKind::S)));
        assert!(field.is_in_danger_zone());

        let mut rows = vec![".........."; 16];
        rows[0] = "....S.....";
        let field = Field::from_rows(&rows).unwrap();
        assert!(!field.is_in_danger_zone());
    }

    #[test]
    fn test_from_rows_errors() {
        assert!(matches!(
            Field::from_rows(&["....."]),
            Err(ParseFieldError::RowWidth { row: 0 })
        ));
        assert!(matches!(
            Field::from_rows(&["...........", "IIIIIIIIII"]),
            Err(ParseFieldError::RowWidth { row: 0 })
        ));
        assert!(matches!(
            Field::from_rows(&["..........", "IIIIIIIIIX"]),
            Err(ParseFieldError::InvalidCell { row: 1, c: 'X' })
        ));
        assert!(matches!(
            Field::from_rows(&[".........."; 21]),
            Err(ParseFieldError::TooManyRows { count: 21 })
        ));
    }

    #[test]
    fn test_cell_values() {
        assert_eq!(Cell::Empty.value(), 0);
        assert_eq!(Cell::Occupied(PieceKind::I).value(), 7);
        for value in 0..=7 {
            assert_eq!(Cell::from_value(value).map(Cell::value), Some(value));
        }
        assert_eq!(Cell::from_value(8), None);
    }

    #[test]
    fn test_field_serialization() {
        let field = Field::from_rows(&["..T.......", "ZZTT.OO..I"]).unwrap();
        let value = serde_json::to_value(&field).unwrap();
        let rows = value.as_array().unwrap();
        assert_eq!(rows.len(), Field::HEIGHT);
        assert_eq!(rows[18], "..T.......");
        assert_eq!(rows[19], "ZZTT.OO..I");

        let deserialized: Field = serde_json::from_value(value).unwrap();
        assert_eq!(deserialized, field);
    }
}

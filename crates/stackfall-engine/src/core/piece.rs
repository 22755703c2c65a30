use std::{fmt, str::FromStr};

use rand::{Rng, distr::StandardUniform, prelude::Distribution};
use serde::{Deserialize, Serialize};

use super::field::{Cell, Field};

pub(super) const PIECE_SPAWN_X: i32 = 3;
pub(super) const PIECE_SPAWN_Y: i32 = -1;

/// Horizontal offsets tried in order when a rotated piece collides.
///
/// There are no vertical kicks.
pub const KICK_OFFSETS: [i32; 5] = [0, 1, -1, 2, -2];

const MAX_SHAPE_SIZE: usize = 4;

/// The piece under player control.
///
/// A piece is a value: moving or rotating it returns a new `Piece`, and the
/// field decides whether the new placement is valid.
///
/// # Coordinate System
///
/// - Position is the top-left corner of the shape matrix, in field cells
/// - X increases rightward, Y increases downward
/// - Y may be negative while the piece is above the visible field
///
/// # Example
///
/// ```
/// use stackfall_engine::{Field, Piece, PieceKind};
///
/// let field = Field::EMPTY;
/// let piece = Piece::new(PieceKind::T);
/// let moved = piece.right();
/// assert!(!field.is_colliding(&moved));
///
/// let rotated = moved.kicked_rotation(&field).unwrap();
/// assert_eq!(rotated.rotation().quarter_turns(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    kind: PieceKind,
    rotation: PieceRotation,
    shape: Shape,
    position: PiecePosition,
}

impl Piece {
    /// Creates a piece in spawn orientation at the spawn position.
    #[must_use]
    pub fn new(kind: PieceKind) -> Self {
        Self {
            kind,
            rotation: PieceRotation::default(),
            shape: kind.spawn_shape(),
            position: PiecePosition::SPAWN_POSITION,
        }
    }

    /// Builds a piece from its kind, rotation state and position.
    ///
    /// The O piece never leaves its spawn orientation, so its rotation is ignored.
    #[must_use]
    pub fn from_parts(kind: PieceKind, rotation: PieceRotation, position: PiecePosition) -> Self {
        let mut piece = Self {
            position,
            ..Self::new(kind)
        };
        if kind != PieceKind::O {
            for _ in 0..rotation.quarter_turns() {
                piece = piece.rotated_clockwise();
            }
        }
        piece
    }

    #[must_use]
    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    #[must_use]
    pub fn rotation(&self) -> PieceRotation {
        self.rotation
    }

    #[must_use]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    #[must_use]
    pub fn position(&self) -> PiecePosition {
        self.position
    }

    /// Returns the field coordinates of every occupied cell of the piece.
    pub fn occupied_positions(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.shape
            .occupied_cells()
            .map(move |(dx, dy, _)| (self.position.x + dx, self.position.y + dy))
    }

    #[must_use]
    pub fn shifted(&self, dx: i32, dy: i32) -> Self {
        Self {
            position: PiecePosition::new(self.position.x + dx, self.position.y + dy),
            ..*self
        }
    }

    #[must_use]
    pub fn left(&self) -> Self {
        self.shifted(-1, 0)
    }

    #[must_use]
    pub fn right(&self) -> Self {
        self.shifted(1, 0)
    }

    #[must_use]
    pub fn down(&self) -> Self {
        self.shifted(0, 1)
    }

    /// Returns the piece with its shape rotated 90° clockwise, at the same position.
    ///
    /// This is the raw matrix transform; it does not special-case the O piece.
    #[must_use]
    pub fn rotated_clockwise(&self) -> Self {
        Self {
            rotation: self.rotation.rotated_right(),
            shape: self.shape.rotated_clockwise(),
            ..*self
        }
    }

    /// Rotates clockwise, trying each of [`KICK_OFFSETS`] until a placement fits.
    ///
    /// The O piece is rotation-invariant and is returned unchanged. Returns `None`
    /// when every kick collides.
    #[must_use]
    pub fn kicked_rotation(&self, field: &Field) -> Option<Self> {
        if self.kind == PieceKind::O {
            return Some(*self);
        }
        let rotated = self.rotated_clockwise();
        KICK_OFFSETS
            .iter()
            .map(|&dx| rotated.shifted(dx, 0))
            .find(|piece| !field.is_colliding(piece))
    }

    /// Returns the lowest placement reachable by moving straight down.
    ///
    /// Used for hard drop and for the ghost piece. The piece itself is not modified.
    #[must_use]
    pub fn simulate_drop_position(&self, field: &Field) -> Self {
        let mut dropped = *self;
        loop {
            let next = dropped.down();
            if field.is_colliding(&next) {
                return dropped;
            }
            dropped = next;
        }
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format: "kind#rotation@x,y" (e.g., "S#1@4,-1")
        write!(
            f,
            "{}#{}@{},{}",
            self.kind.as_char(),
            self.rotation.0,
            self.position.x,
            self.position.y
        )
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ParsePieceError {
    #[display("expected format 'kind#rotation@x,y'")]
    Format,
    #[display("invalid piece kind")]
    Kind,
    #[display("rotation must be 0-3")]
    Rotation,
    #[display("invalid coordinate")]
    Coordinate,
}

impl FromStr for Piece {
    type Err = ParsePieceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, rest) = s.split_once('#').ok_or(ParsePieceError::Format)?;
        let (rotation, position) = rest.split_once('@').ok_or(ParsePieceError::Format)?;
        let (x, y) = position.split_once(',').ok_or(ParsePieceError::Format)?;

        let mut chars = kind.chars();
        let kind = match (chars.next(), chars.next()) {
            (Some(c), None) => PieceKind::from_char(c).ok_or(ParsePieceError::Kind)?,
            _ => return Err(ParsePieceError::Kind),
        };
        let rotation = rotation
            .parse::<u8>()
            .ok()
            .filter(|r| *r < 4)
            .ok_or(ParsePieceError::Rotation)?;
        let x = x.parse().map_err(|_| ParsePieceError::Coordinate)?;
        let y = y.parse().map_err(|_| ParsePieceError::Coordinate)?;

        Ok(Self::from_parts(
            kind,
            PieceRotation(rotation),
            PiecePosition::new(x, y),
        ))
    }
}

impl Serialize for Piece {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Piece {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse()
            .map_err(|e| serde::de::Error::custom(format!("invalid piece '{s}': {e}")))
    }
}

/// Top-left corner of a piece's shape matrix, in field cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct PiecePosition {
    x: i32,
    y: i32,
}

impl PiecePosition {
    pub const SPAWN_POSITION: Self = Self::new(PIECE_SPAWN_X, PIECE_SPAWN_Y);

    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub const fn x(self) -> i32 {
        self.x
    }

    #[must_use]
    pub const fn y(self) -> i32 {
        self.y
    }
}

/// Rotation state of a piece, counted in clockwise quarter turns from spawn.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PieceRotation(u8);

impl PieceRotation {
    #[must_use]
    pub fn rotated_right(self) -> Self {
        PieceRotation((self.0 + 1) % 4)
    }

    #[must_use]
    pub const fn quarter_turns(self) -> u8 {
        self.0
    }
}

/// The seven piece types.
///
/// The discriminant is the colour id stored in field cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[repr(u8)]
pub enum PieceKind {
    /// O-piece.
    O = 1,
    /// T-piece.
    T = 2,
    /// S-piece.
    S = 3,
    /// Z-piece.
    Z = 4,
    /// L-piece.
    L = 5,
    /// J-piece.
    J = 6,
    /// I-piece.
    I = 7,
}

impl Distribution<PieceKind> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceKind {
        PieceKind::ALL[rng.random_range(0..PieceKind::LEN)]
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl PieceKind {
    /// Number of piece types (7).
    pub const LEN: usize = 7;

    /// All piece kinds, ordered by colour id.
    pub const ALL: [Self; Self::LEN] = [
        PieceKind::O,
        PieceKind::T,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::L,
        PieceKind::J,
        PieceKind::I,
    ];

    /// Colour id of this piece (`1..=7`).
    #[must_use]
    pub const fn color_id(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn from_color_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(PieceKind::O),
            2 => Some(PieceKind::T),
            3 => Some(PieceKind::S),
            4 => Some(PieceKind::Z),
            5 => Some(PieceKind::L),
            6 => Some(PieceKind::J),
            7 => Some(PieceKind::I),
            _ => None,
        }
    }

    /// Zero-based index, for per-kind tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize - 1
    }

    /// Points awarded for locking this piece, before the difficulty multiplier.
    #[must_use]
    pub const fn base_score(self) -> u32 {
        match self {
            PieceKind::O => 10,
            PieceKind::T => 40,
            PieceKind::S | PieceKind::Z => 20,
            PieceKind::L | PieceKind::J => 30,
            PieceKind::I => 50,
        }
    }

    /// Shape matrix in spawn orientation.
    #[must_use]
    pub const fn spawn_shape(self) -> Shape {
        SPAWN_SHAPES[self.index()]
    }

    /// Returns the single character representation of this piece kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use stackfall_engine::PieceKind;
    ///
    /// assert_eq!(PieceKind::I.as_char(), 'I');
    /// assert_eq!(PieceKind::T.as_char(), 'T');
    /// ```
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            PieceKind::O => 'O',
            PieceKind::T => 'T',
            PieceKind::S => 'S',
            PieceKind::Z => 'Z',
            PieceKind::L => 'L',
            PieceKind::J => 'J',
            PieceKind::I => 'I',
        }
    }

    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'O' => Some(PieceKind::O),
            'T' => Some(PieceKind::T),
            'S' => Some(PieceKind::S),
            'Z' => Some(PieceKind::Z),
            'L' => Some(PieceKind::L),
            'J' => Some(PieceKind::J),
            'I' => Some(PieceKind::I),
            _ => None,
        }
    }
}

/// Square cell matrix of a piece in one orientation.
///
/// Six pieces use a 3×3 matrix and the I piece a 4×4 one. Cells outside
/// `size × size` are always empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    size: usize,
    cells: [[Cell; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE],
}

impl Shape {
    const fn new(size: usize, cells: [[Cell; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE]) -> Self {
        Self { size, cells }
    }

    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Returns the cell at `(x, y)` in shape-local coordinates.
    #[must_use]
    pub fn cell(&self, x: usize, y: usize) -> Cell {
        if x < self.size && y < self.size {
            self.cells[y][x]
        } else {
            Cell::Empty
        }
    }

    /// Iterates over the `size` rows of the matrix.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        let size = self.size;
        self.cells[..size].iter().map(move |row| &row[..size])
    }

    /// Returns `(dx, dy, kind)` for every occupied cell.
    pub fn occupied_cells(&self) -> impl Iterator<Item = (i32, i32, PieceKind)> + '_ {
        self.rows().zip(0..).flat_map(|(row, dy)| {
            row.iter()
                .zip(0..)
                .filter_map(move |(cell, dx)| cell.kind().map(|kind| (dx, dy, kind)))
        })
    }

    /// Rotates the matrix 90° clockwise: `new[c][size-1-r] = old[r][c]`.
    #[must_use]
    pub const fn rotated_clockwise(&self) -> Self {
        let mut cells = [[Cell::Empty; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE];
        let size = self.size;
        let mut y = 0;
        while y < size {
            let mut x = 0;
            while x < size {
                cells[y][x] = self.cells[size - 1 - x][y];
                x += 1;
            }
            y += 1;
        }
        Self { size, cells }
    }
}

const SPAWN_SHAPES: [Shape; PieceKind::LEN] = {
    use Cell::Empty as E;
    const O: Cell = Cell::Occupied(PieceKind::O);
    const T: Cell = Cell::Occupied(PieceKind::T);
    const S: Cell = Cell::Occupied(PieceKind::S);
    const Z: Cell = Cell::Occupied(PieceKind::Z);
    const L: Cell = Cell::Occupied(PieceKind::L);
    const J: Cell = Cell::Occupied(PieceKind::J);
    const I: Cell = Cell::Occupied(PieceKind::I);
    const EEEE: [Cell; 4] = [E; 4];
    [
        // O-piece
        Shape::new(3, [EEEE, [E, O, O, E], [E, O, O, E], EEEE]),
        // T-piece
        Shape::new(3, [[E, T, E, E], [T, T, T, E], EEEE, EEEE]),
        // S-piece
        Shape::new(3, [[E, S, S, E], [S, S, E, E], EEEE, EEEE]),
        // Z-piece
        Shape::new(3, [[Z, Z, E, E], [E, Z, Z, E], EEEE, EEEE]),
        // L-piece
        Shape::new(3, [[E, E, L, E], [L, L, L, E], EEEE, EEEE]),
        // J-piece
        Shape::new(3, [[J, E, E, E], [J, J, J, E], EEEE, EEEE]),
        // I-piece
        Shape::new(4, [EEEE, [I, I, I, I], EEEE, EEEE]),
    ]
};

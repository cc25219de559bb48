//! Piece catalog: the seven tetromino shapes and colours, and how pieces are drawn.

use crate::board::BOARD_WIDTH;
use crate::theme::parse_hex;
use rand::Rng;
use rand::rngs::StdRng;
use ratatui::style::Color;
use thiserror::Error;

/// Tetromino kinds (I, J, L, O, S, T, Z).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TetrominoKind {
    I,
    J,
    L,
    O,
    S,
    T,
    Z,
}

impl TetrominoKind {
    pub const ALL: [Self; 7] = [Self::I, Self::J, Self::L, Self::O, Self::S, Self::T, Self::Z];

    /// Index into [`Self::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("shape has no rows or no columns")]
    Empty,
    #[error("row {row} has {len} cells, expected {expected}")]
    Ragged { row: usize, len: usize, expected: usize },
    #[error("cell ({x}, {y}) holds {value}; only 0 and 1 are allowed")]
    BadCell { x: usize, y: usize, value: u8 },
    #[error("shape occupies {0} cells, a tetromino needs 4")]
    CellCount(usize),
}

/// Rectangular 0/1 occupancy matrix, anchored at its top-left corner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    rows: usize,
    cols: usize,
    cells: Vec<bool>,
}

impl Shape {
    /// Build a shape from row slices; rejects empty, ragged and non-binary input.
    pub fn from_rows(rows: &[&[u8]]) -> Result<Self, ShapeError> {
        let expected = rows.first().map_or(0, |r| r.len());
        if rows.is_empty() || expected == 0 {
            return Err(ShapeError::Empty);
        }
        let mut cells = Vec::with_capacity(rows.len() * expected);
        for (y, row) in rows.iter().enumerate() {
            if row.len() != expected {
                return Err(ShapeError::Ragged {
                    row: y,
                    len: row.len(),
                    expected,
                });
            }
            for (x, &value) in row.iter().enumerate() {
                match value {
                    0 => cells.push(false),
                    1 => cells.push(true),
                    _ => return Err(ShapeError::BadCell { x, y, value }),
                }
            }
        }
        Ok(Self {
            rows: rows.len(),
            cols: expected,
            cells,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn is_filled(&self, x: usize, y: usize) -> bool {
        x < self.cols && y < self.rows && self.cells[y * self.cols + x]
    }

    /// Offsets `(dx, dy)` of every occupied cell, row-major.
    pub fn occupied(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, filled)| **filled)
            .map(|(i, _)| ((i % self.cols) as i32, (i / self.cols) as i32))
    }

    /// Clockwise quarter turn: transpose, then reverse each row.
    pub fn rotated(&self) -> Self {
        let (rows, cols) = (self.cols, self.rows);
        let mut cells = Vec::with_capacity(self.cells.len());
        for y in 0..rows {
            for x in 0..cols {
                cells.push(self.is_filled(y, self.rows - 1 - x));
            }
        }
        Self { rows, cols, cells }
    }
}

/// Board coordinates of a shape's top-left anchor. `y` may be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// A live piece. Transitions build a new value instead of editing this one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub kind: TetrominoKind,
    pub shape: Shape,
    pub color: Color,
    pub position: Position,
}

impl Piece {
    pub fn at(&self, position: Position) -> Self {
        Self {
            position,
            ..self.clone()
        }
    }

    pub fn with_shape(&self, shape: Shape) -> Self {
        Self {
            shape,
            ..self.clone()
        }
    }

    /// Board coordinates of every occupied cell.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        let Position { x, y } = self.position;
        self.shape.occupied().map(move |(dx, dy)| (x + dx, y + dy))
    }
}

struct PieceDef {
    kind: TetrominoKind,
    rows: &'static [&'static [u8]],
    color: &'static str,
}

const DEFINITIONS: [PieceDef; 7] = [
    PieceDef {
        kind: TetrominoKind::I,
        rows: &[&[0, 0, 0, 0], &[1, 1, 1, 1], &[0, 0, 0, 0], &[0, 0, 0, 0]],
        color: "#06b6d4", // cyan-500
    },
    PieceDef {
        kind: TetrominoKind::J,
        rows: &[&[1, 0, 0], &[1, 1, 1], &[0, 0, 0]],
        color: "#3b82f6", // blue-500
    },
    PieceDef {
        kind: TetrominoKind::L,
        rows: &[&[0, 0, 1], &[1, 1, 1], &[0, 0, 0]],
        color: "#f97316", // orange-500
    },
    PieceDef {
        kind: TetrominoKind::O,
        rows: &[&[1, 1], &[1, 1]],
        color: "#eab308", // yellow-500
    },
    PieceDef {
        kind: TetrominoKind::S,
        rows: &[&[0, 1, 1], &[1, 1, 0], &[0, 0, 0]],
        color: "#22c55e", // green-500
    },
    PieceDef {
        kind: TetrominoKind::T,
        rows: &[&[0, 1, 0], &[1, 1, 1], &[0, 0, 0]],
        color: "#a855f7", // purple-500
    },
    PieceDef {
        kind: TetrominoKind::Z,
        rows: &[&[1, 1, 0], &[0, 1, 1], &[0, 0, 0]],
        color: "#ef4444", // red-500
    },
];

/// Spawn anchor: horizontal centre, top row.
pub const SPAWN_POSITION: Position = Position::new(BOARD_WIDTH as i32 / 2 - 1, 0);

/// Validated shapes and colours for the seven kinds, indexed by [`TetrominoKind::index`].
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<(Shape, Color)>,
}

impl Catalog {
    /// The built-in set. Panics if the static definitions are malformed.
    pub fn standard() -> Self {
        let entries = DEFINITIONS
            .iter()
            .enumerate()
            .map(|(i, def)| {
                assert_eq!(def.kind.index(), i, "catalog order must follow TetrominoKind::ALL");
                let shape = Shape::from_rows(def.rows)
                    .and_then(|s| {
                        let n = s.occupied().count();
                        if n == 4 { Ok(s) } else { Err(ShapeError::CellCount(n)) }
                    })
                    .unwrap_or_else(|e| panic!("bad {:?} definition: {e}", def.kind));
                let color = parse_hex(def.color)
                    .unwrap_or_else(|e| panic!("bad {:?} colour: {e}", def.kind));
                (shape, color)
            })
            .collect();
        Self { entries }
    }

    #[cfg(test)]
    pub fn shape(&self, kind: TetrominoKind) -> &Shape {
        &self.entries[kind.index()].0
    }

    #[cfg(test)]
    pub fn color(&self, kind: TetrominoKind) -> Color {
        self.entries[kind.index()].1
    }

    /// New piece of `kind` at the spawn position.
    pub fn spawn(&self, kind: TetrominoKind) -> Piece {
        let (shape, color) = &self.entries[kind.index()];
        Piece {
            kind,
            shape: shape.clone(),
            color: *color,
            position: SPAWN_POSITION,
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// Where the next piece kind comes from. Swappable so games can be replayed or scripted.
pub trait PieceSource: std::fmt::Debug {
    fn next_kind(&mut self) -> TetrominoKind;
}

/// Independent uniform draws over the seven kinds.
#[derive(Debug)]
pub struct UniformSource<R = StdRng> {
    rng: R,
}

impl<R: Rng> UniformSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng + std::fmt::Debug> PieceSource for UniformSource<R> {
    fn next_kind(&mut self) -> TetrominoKind {
        TetrominoKind::ALL[self.rng.random_range(0..TetrominoKind::ALL.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_standard_catalog_is_valid() {
        let catalog = Catalog::standard();
        for kind in TetrominoKind::ALL {
            assert_eq!(catalog.shape(kind).occupied().count(), 4, "{kind:?}");
        }
        assert_eq!(catalog.color(TetrominoKind::I), Color::Rgb(0x06, 0xB6, 0xD4));
        assert_eq!(catalog.color(TetrominoKind::Z), Color::Rgb(0xEF, 0x44, 0x44));
    }

    #[test]
    fn test_spawn_is_centered_on_top_row() {
        let piece = Catalog::standard().spawn(TetrominoKind::T);
        assert_eq!(piece.position, Position::new(4, 0));
        assert_eq!(piece.kind, TetrominoKind::T);
    }

    #[test]
    fn test_from_rows_rejects_malformed() {
        assert_eq!(Shape::from_rows(&[]), Err(ShapeError::Empty));
        assert_eq!(Shape::from_rows(&[&[]]), Err(ShapeError::Empty));
        assert_eq!(
            Shape::from_rows(&[&[1, 1], &[1]]),
            Err(ShapeError::Ragged {
                row: 1,
                len: 1,
                expected: 2
            })
        );
        assert_eq!(
            Shape::from_rows(&[&[1, 2]]),
            Err(ShapeError::BadCell { x: 1, y: 0, value: 2 })
        );
    }

    #[test]
    fn test_rotate_clockwise() {
        let t = Catalog::standard().shape(TetrominoKind::T).clone();
        let expected = Shape::from_rows(&[&[0, 1, 0], &[0, 1, 1], &[0, 1, 0]]).unwrap();
        assert_eq!(t.rotated(), expected);
    }

    #[test]
    fn test_rotate_i_four_times_is_identity() {
        let i = Catalog::standard().shape(TetrominoKind::I).clone();
        let twice = i.rotated().rotated();
        assert_ne!(twice, i);
        assert_eq!(twice.rotated().rotated(), i);
    }

    #[test]
    fn test_rotate_rectangular_swaps_dimensions() {
        let bar = Shape::from_rows(&[&[1, 1, 1], &[0, 0, 1]]).unwrap();
        let turned = bar.rotated();
        assert_eq!((turned.rows(), turned.cols()), (3, 2));
        assert_eq!(
            turned,
            Shape::from_rows(&[&[0, 1], &[0, 1], &[1, 1]]).unwrap()
        );
    }

    #[test]
    fn test_piece_cells_follow_position() {
        let piece = Catalog::standard()
            .spawn(TetrominoKind::O)
            .at(Position::new(0, -1));
        let cells: Vec<_> = piece.cells().collect();
        assert_eq!(cells, vec![(0, -1), (1, -1), (0, 0), (1, 0)]);
    }

    #[test]
    fn test_uniform_source_is_reproducible_and_covers_all_kinds() {
        let mut a = UniformSource::new(StdRng::seed_from_u64(7));
        let mut b = UniformSource::new(StdRng::seed_from_u64(7));
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            let k = a.next_kind();
            assert_eq!(k, b.next_kind());
            seen.insert(k);
        }
        assert_eq!(seen.len(), 7);
    }
}

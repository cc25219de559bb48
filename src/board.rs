//! Board model: settled cells, collision and row compaction.

use crate::piece::{Position, Shape};
use ratatui::style::Color;
use std::collections::VecDeque;

pub const BOARD_WIDTH: usize = 10;
pub const BOARD_HEIGHT: usize = 20;

/// Single cell: either empty or filled with the colour of the piece that settled there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Filled(Color),
}

impl Cell {
    #[inline]
    pub fn is_filled(self) -> bool {
        matches!(self, Self::Filled(_))
    }
}

/// Fixed 10×20 grid. y=0 is top; rows are stored [0..height].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    rows: VecDeque<Vec<Cell>>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        let rows = (0..BOARD_HEIGHT).map(|_| empty_row()).collect();
        Self { rows }
    }

    #[inline]
    pub fn width(&self) -> usize {
        BOARD_WIDTH
    }

    #[inline]
    pub fn height(&self) -> usize {
        BOARD_HEIGHT
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<Cell> {
        self.rows.get(y).and_then(|row| row.get(x)).copied()
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if let Some(slot) = self.rows.get_mut(y).and_then(|row| row.get_mut(x)) {
            *slot = cell;
        }
    }

    pub fn row(&self, y: usize) -> Option<&[Cell]> {
        self.rows.get(y).map(Vec::as_slice)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(Vec::as_slice)
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.rows.iter().flatten().all(|c| !c.is_filled())
    }

    /// True if `shape` anchored at `at` leaves the board or overlaps a settled cell.
    /// Cells above the top edge only collide with the side walls.
    pub fn collides(&self, shape: &Shape, at: Position) -> bool {
        shape.occupied().any(|(dx, dy)| {
            let (x, y) = (at.x + dx, at.y + dy);
            if x < 0 || x >= self.width() as i32 || y >= self.height() as i32 {
                return true;
            }
            y >= 0 && self.get(x as usize, y as usize).is_some_and(Cell::is_filled)
        })
    }

    /// Remove every complete row, scanning bottom to top, and push empty rows in at the top.
    /// The row that slides into a cleared slot is checked again before moving up.
    /// Returns the indices at which rows were removed, in scan order.
    pub fn clear_full_rows(&mut self) -> Vec<usize> {
        let mut cleared = Vec::new();
        let mut y = self.height();
        while y > 0 {
            let row = y - 1;
            if self.row(row).is_some_and(|r| r.iter().all(|c| c.is_filled())) {
                self.rows.remove(row);
                self.rows.push_front(empty_row());
                cleared.push(row);
            } else {
                y -= 1;
            }
        }
        cleared
    }
}

fn empty_row() -> Vec<Cell> {
    vec![Cell::Empty; BOARD_WIDTH]
}

use crate::packing::prelude::*;

/// Scratch cell states used while simulating square placement.
pub const CELL_OUTSIDE: u8 = 0;
pub const CELL_EMPTY: u8 = 1;
pub const CELL_ANCHOR: u8 = 2;
pub const CELL_FILLED: u8 = 3;

/// An immutable rectangular grid of 0/1 cells: 0 is a wall, 1 is interior.
#[derive(Clone, Debug)]
pub struct Puzzle {
    cells: Vec<u8>,
    pub height: usize,
    pub width: usize,
    pub sum: u32,
}

impl Puzzle {
    /// Builds a puzzle from a row-major 2-D array of 0/1 bytes.
    pub fn new(rows: &[Vec<u8>]) -> Result<Puzzle> {
        let height = rows.len();
        if height == 0 {
            return Err(anyhow!("puzzle has no rows"));
        }
        let width = rows[0].len();
        if width == 0 || rows.iter().any(|r| r.len() != width) {
            return Err(anyhow!("puzzle rows must be nonempty and equal length"));
        }

        let mut cells = Vec::with_capacity(height * width);
        let mut sum = 0u32;
        for row in rows {
            for &cell in row {
                if cell > 1 {
                    return Err(anyhow!("puzzle cell must be 0 or 1, got {cell}"));
                }
                sum += cell as u32;
                cells.push(cell);
            }
        }

        Ok(Puzzle { cells, height, width, sum })
    }

    /// Cell value at (row, col), engine use only - callers are expected to
    /// stay in bounds.
    #[inline]
    pub(crate) fn get_unchecked(&self, row: usize, col: usize) -> u8 {
        unsafe { *self.cells.get_unchecked(row * self.width + col) }
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<u8> {
        if row < self.height && col < self.width {
            Some(self.get_unchecked(row, col))
        } else {
            None
        }
    }
}

/// A reusable H×W byte buffer used to simulate drawing squares. Overwritten
/// at the start of each scoring call; never needs zeroing between calls.
#[derive(Clone, Debug)]
pub struct Scratch {
    cells: Vec<u8>,
    width: usize,
    height: usize,
}

impl Scratch {
    /// Allocates a scratch grid shaped like `puzzle`. Contents are
    /// uninitialized until `reset_from` is called.
    pub fn new(puzzle: &Puzzle) -> Scratch {
        Scratch {
            cells: vec![CELL_OUTSIDE; puzzle.height * puzzle.width],
            width: puzzle.width,
            height: puzzle.height,
        }
    }

    /// Copies the puzzle into scratch bytewise, discarding whatever was left
    /// behind by the previous scoring call.
    #[inline]
    pub(crate) fn reset_from(&mut self, puzzle: &Puzzle) {
        self.cells.copy_from_slice(&puzzle.cells);
    }

    #[inline]
    pub(crate) fn get_unchecked(&self, row: usize, col: usize) -> u8 {
        unsafe { *self.cells.get_unchecked(row * self.width + col) }
    }

    #[inline]
    pub(crate) fn set_unchecked(&mut self, row: usize, col: usize, value: u8) {
        unsafe { *self.cells.get_unchecked_mut(row * self.width + col) = value }
    }

    pub(crate) fn height(&self) -> usize {
        self.height
    }

    pub(crate) fn width(&self) -> usize {
        self.width
    }
}

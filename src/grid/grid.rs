//! Grid: a fixed-size 2D array of styled cells.
//!
//! Cells are stored contiguously in row-major order. Dimensions are fixed
//! at construction; a resize means building a new grid. Every coordinate
//! access is bounds-checked and out-of-bounds writes are ignored.

use super::cell::Cell;

/// A grid of cells.
///
/// Access is in row-major order: `index = y * width + x`.
#[derive(Clone, PartialEq, Eq)]
pub struct Grid {
    cells: Vec<Cell>,
    width: usize,
    height: usize,
}

impl Grid {
    /// Create a grid with every cell blank.
    ///
    /// A zero dimension yields an empty grid that ignores all writes.
    pub fn new(width: usize, height: usize) -> Self {
        let (width, height) = if width == 0 || height == 0 {
            (0, 0)
        } else {
            (width, height)
        };
        Self {
            cells: vec![Cell::EMPTY; width * height],
            width,
            height,
        }
    }

    /// Grid width in columns.
    #[inline]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Grid height in rows.
    #[inline]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Total number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the grid has no cells.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The underlying cell slice.
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Convert (x, y) coordinates to a linear index.
    ///
    /// Returns `None` if coordinates are out of bounds.
    #[inline]
    pub const fn index_of(&self, x: usize, y: usize) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y * self.width + x)
        } else {
            None
        }
    }

    /// Get the cell at (x, y).
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<&Cell> {
        self.index_of(x, y).map(|i| &self.cells[i])
    }

    /// Get a mutable cell at (x, y).
    #[inline]
    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut Cell> {
        self.index_of(x, y).map(|i| &mut self.cells[i])
    }

    /// Set a cell at (x, y).
    ///
    /// Returns `false` (and changes nothing) if coordinates are out of bounds.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, cell: Cell) -> bool {
        if let Some(idx) = self.index_of(x, y) {
            self.cells[idx] = cell;
            true
        } else {
            false
        }
    }

    /// A row as a slice, if in bounds.
    #[inline]
    pub fn row(&self, y: usize) -> Option<&[Cell]> {
        if y < self.height {
            let start = y * self.width;
            Some(&self.cells[start..start + self.width])
        } else {
            None
        }
    }

    /// Iterate over rows.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        // chunks(0) panics; an empty grid has no rows anyway.
        self.cells.chunks(self.width.max(1))
    }

    /// Reset every cell to blank.
    pub fn clear(&mut self) {
        self.cells.fill(Cell::EMPTY);
    }

    /// Reset every cell of row `y` to blank.
    pub fn clear_line(&mut self, y: usize) {
        self.clear_span(y, 0, self.width);
    }

    /// Reset row `y` from column `x` (inclusive) to the end of the line.
    pub fn clear_line_from(&mut self, x: usize, y: usize) {
        self.clear_span(y, x, self.width);
    }

    /// Reset row `y` from the start of the line through column `x` (inclusive).
    pub fn clear_line_through(&mut self, x: usize, y: usize) {
        self.clear_span(y, 0, x.saturating_add(1));
    }

    /// Blank columns `start..end` of row `y`, clamped to the grid.
    fn clear_span(&mut self, y: usize, start: usize, end: usize) {
        if y >= self.height {
            return;
        }
        let end = end.min(self.width);
        if start >= end {
            return;
        }
        let row = y * self.width;
        self.cells[row + start..row + end].fill(Cell::EMPTY);
    }

    /// The characters of row `y` as a string (trailing blanks kept).
    pub fn line_text(&self, y: usize) -> Option<String> {
        self.row(y).map(|row| row.iter().map(Cell::ch).collect())
    }
}

impl std::fmt::Debug for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grid")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

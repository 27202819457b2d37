//! Diff engine: find the rectangles that differ between two grids.
//!
//! Output is row-granular. Each region is one row high and covers a
//! maximal run of differing columns, so no two regions in the same row
//! touch. Grids of different dimensions are invalidated as a whole.

use super::Grid;

/// A rectangle of cells reported as changed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Region {
    /// X coordinate (column) of the top-left corner.
    pub x: usize,
    /// Y coordinate (row) of the top-left corner.
    pub y: usize,
    /// Width in columns.
    pub width: usize,
    /// Height in rows.
    pub height: usize,
}

impl Region {
    /// Create a new region.
    #[inline]
    pub const fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self { x, y, width, height }
    }

    /// A region covering a whole grid.
    #[inline]
    pub const fn covering(grid: &Grid) -> Self {
        Self::new(0, 0, grid.width(), grid.height())
    }

    /// Number of cells covered.
    #[inline]
    pub const fn area(&self) -> usize {
        self.width * self.height
    }

    /// Whether the region covers no cells.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> usize {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> usize {
        self.y.saturating_add(self.height)
    }

    /// Check if a point is inside the region.
    #[inline]
    pub const fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

impl std::fmt::Debug for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Region({}, {} {}x{})", self.x, self.y, self.width, self.height)
    }
}

/// Compare `previous` against `next` and return the changed regions.
///
/// If the dimensions differ, the result is a single region covering `next`.
/// Otherwise every region is one row high and spans a maximal run of
/// columns whose cells differ structurally.
pub fn diff(previous: &Grid, next: &Grid) -> Vec<Region> {
    if previous.width() != next.width() || previous.height() != next.height() {
        return vec![Region::covering(next)];
    }

    let mut regions = Vec::new();
    for (y, (old_row, new_row)) in previous.rows().zip(next.rows()).enumerate() {
        diff_row(y, old_row, new_row, &mut regions);
    }
    regions
}

/// Append the differing runs of one row.
fn diff_row(y: usize, old_row: &[super::Cell], new_row: &[super::Cell], out: &mut Vec<Region>) {
    let mut run_start: Option<usize> = None;

    for (x, (a, b)) in old_row.iter().zip(new_row).enumerate() {
        match (a != b, run_start) {
            (true, None) => run_start = Some(x),
            (false, Some(start)) => {
                out.push(Region::new(start, y, x - start, 1));
                run_start = None;
            }
            _ => {}
        }
    }

    if let Some(start) = run_start {
        out.push(Region::new(start, y, new_row.len() - start, 1));
    }
}

impl Grid {
    /// Regions where `next` differs from `self`. See [`diff`].
    pub fn diff(&self, next: &Self) -> Vec<Region> {
        diff(self, next)
    }
}

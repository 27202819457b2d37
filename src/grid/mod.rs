//! Grid module: the display model the parser writes and the diff engine reads.
//!
//! This module contains:
//! - [`Cell`]: one character position with resolved style
//! - [`Color`] / [`Rgb`]: explicit or theme-default colors
//! - [`Modifiers`]: text style bitflags
//! - [`Grid`]: a fixed-size, bounds-checked array of cells
//! - [`diff`]: row-granular changed-region computation

mod cell;
#[allow(clippy::module_inception)]
mod grid;
pub mod diff;

pub use cell::{Cell, Color, Modifiers, Rgb};
pub use diff::{diff, Region};
pub use grid::Grid;

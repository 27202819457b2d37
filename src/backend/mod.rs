//! Backends: the output surface and event source a program drives.
//!
//! A backend is opened once with the validated configuration and a
//! [`ProgramHandle`] it can use to feed input into the program from its own
//! threads. Afterwards the run loop hands it a grid plus the dirty regions
//! for every rendered frame.
//!
//! - [`HeadlessBackend`]: records frames in memory, for tests and tools
//! - [`TerminalBackend`]: crossterm front end

mod headless;
pub mod terminal;

pub use headless::{FrameLog, HeadlessBackend, PresentedFrame};
pub use terminal::TerminalBackend;

use crate::error::{BackendError, RenderError};
use crate::grid::{Grid, Region};
use crate::runtime::{ProgramConfig, ProgramHandle};

/// Viewport size in grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Viewport {
    /// Columns.
    pub columns: usize,
    /// Rows.
    pub rows: usize,
}

impl Viewport {
    /// Create a viewport.
    pub const fn new(columns: usize, rows: usize) -> Self {
        Self { columns, rows }
    }

    /// Whether the viewport has no cells.
    pub const fn is_empty(&self) -> bool {
        self.columns == 0 || self.rows == 0
    }
}

/// An output surface plus its input source.
pub trait Backend {
    /// Acquire the surface and start delivering input through `handle`.
    ///
    /// Returns the initial viewport.
    fn open<C: Send + 'static>(
        &mut self,
        config: &ProgramConfig,
        handle: ProgramHandle<C>,
    ) -> Result<Viewport, BackendError>;

    /// Draw a frame. Only `regions` changed since the previous frame.
    ///
    /// An error skips this frame; the program keeps running.
    fn present(&mut self, grid: &Grid, regions: &[Region]) -> Result<(), RenderError>;

    /// Release the surface. Called exactly once after a successful `open`.
    fn close(&mut self);
}

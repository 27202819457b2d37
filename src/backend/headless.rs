//! Headless backend: keeps presented frames in memory.
//!
//! Used by the integration tests and by tools that want a program's output
//! without a terminal. The viewport is the configured pixel size divided by
//! a fixed cell size, the way a windowed front end would size its grid.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{BackendError, RenderError};
use crate::grid::{Grid, Region};
use crate::runtime::{CellSize, ProgramConfig, ProgramHandle};

use super::{Backend, Viewport};

/// Default cell size in pixels.
pub const DEFAULT_CELL: CellSize = CellSize::new(8, 16);

/// One successfully presented frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentedFrame {
    /// The full grid.
    pub grid: Grid,
    /// Regions reported dirty.
    pub regions: Vec<Region>,
}

#[derive(Default)]
struct LogState {
    frames: Vec<PresentedFrame>,
    title: Option<String>,
    opened: usize,
    closed: usize,
    failed: usize,
}

/// Shared record of what a [`HeadlessBackend`] was asked to do.
///
/// Clone it before handing the backend to a program, then inspect it from
/// the test thread.
#[derive(Clone, Default)]
pub struct FrameLog {
    state: Arc<(Mutex<LogState>, Condvar)>,
}

impl FrameLog {
    fn lock(&self) -> MutexGuard<'_, LogState> {
        self.state.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, f: impl FnOnce(&mut LogState)) {
        f(&mut self.lock());
        self.state.1.notify_all();
    }

    /// All presented frames, oldest first.
    pub fn frames(&self) -> Vec<PresentedFrame> {
        self.lock().frames.clone()
    }

    /// Number of presented frames.
    pub fn len(&self) -> usize {
        self.lock().frames.len()
    }

    /// Whether nothing has been presented.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The most recent frame.
    pub fn last(&self) -> Option<PresentedFrame> {
        self.lock().frames.last().cloned()
    }

    /// Title the backend was opened with.
    pub fn title(&self) -> Option<String> {
        self.lock().title.clone()
    }

    /// How many times the backend was opened.
    pub fn opened(&self) -> usize {
        self.lock().opened
    }

    /// How many times the backend was closed.
    pub fn closed(&self) -> usize {
        self.lock().closed
    }

    /// How many presents failed on purpose.
    pub fn failed_presents(&self) -> usize {
        self.lock().failed
    }

    /// Block until `done` holds for the presented frames or `timeout` passes.
    pub fn wait_until(
        &self,
        timeout: Duration,
        mut done: impl FnMut(&[PresentedFrame]) -> bool,
    ) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock();
        loop {
            if done(&state.frames) {
                return true;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            state = self
                .state
                .1
                .wait_timeout(state, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }
}

impl std::fmt::Debug for FrameLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("FrameLog")
            .field("frames", &state.frames.len())
            .field("opened", &state.opened)
            .field("closed", &state.closed)
            .finish_non_exhaustive()
    }
}

/// A backend that renders into a [`FrameLog`].
#[derive(Debug, Clone)]
pub struct HeadlessBackend {
    cell: CellSize,
    log: FrameLog,
    fail_presents: usize,
    refuse_open: bool,
}

impl HeadlessBackend {
    /// A backend with the default cell size.
    pub fn new() -> Self {
        Self {
            cell: DEFAULT_CELL,
            log: FrameLog::default(),
            fail_presents: 0,
            refuse_open: false,
        }
    }

    /// Use a different cell size (builder pattern).
    #[must_use]
    pub const fn with_cell_size(mut self, cell: CellSize) -> Self {
        self.cell = cell;
        self
    }

    /// Fail the next `count` presents with a render error (builder pattern).
    #[must_use]
    pub const fn fail_presents(mut self, count: usize) -> Self {
        self.fail_presents = count;
        self
    }

    /// Make `open` fail (builder pattern).
    #[must_use]
    pub const fn refuse_open(mut self) -> Self {
        self.refuse_open = true;
        self
    }

    /// A handle on the frame record.
    pub fn log(&self) -> FrameLog {
        self.log.clone()
    }

    /// Viewport for a pixel size.
    pub fn viewport_for(&self, width: u32, height: u32) -> Viewport {
        let columns = if self.cell.width == 0 { 0 } else { width / self.cell.width };
        let rows = if self.cell.height == 0 { 0 } else { height / self.cell.height };
        Viewport::new(columns as usize, rows as usize)
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for HeadlessBackend {
    fn open<C: Send + 'static>(
        &mut self,
        config: &ProgramConfig,
        _handle: ProgramHandle<C>,
    ) -> Result<Viewport, BackendError> {
        if self.refuse_open {
            return Err(BackendError::Unavailable {
                message: "headless backend configured to refuse".to_string(),
            });
        }
        let viewport = self.viewport_for(config.width, config.height);
        debug!(columns = viewport.columns, rows = viewport.rows, "headless backend opened");
        let title = config.title.clone();
        self.log.update(|state| {
            state.opened += 1;
            state.title = Some(title);
        });
        Ok(viewport)
    }

    fn present(&mut self, grid: &Grid, regions: &[Region]) -> Result<(), RenderError> {
        if self.fail_presents > 0 {
            self.fail_presents -= 1;
            self.log.update(|state| state.failed += 1);
            return Err(RenderError::NoSurface);
        }
        if let Some(bad) = regions
            .iter()
            .find(|r| r.right() > grid.width() || r.bottom() > grid.height())
        {
            return Err(RenderError::Dimensions {
                width: bad.right(),
                height: bad.bottom(),
            });
        }
        let frame = PresentedFrame {
            grid: grid.clone(),
            regions: regions.to_vec(),
        };
        self.log.update(|state| state.frames.push(frame));
        Ok(())
    }

    fn close(&mut self) {
        self.log.update(|state| state.closed += 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Cell;

    #[test]
    fn viewport_from_pixels() {
        let backend = HeadlessBackend::new();
        assert_eq!(backend.viewport_for(800, 600), Viewport::new(100, 37));
        let backend = backend.with_cell_size(CellSize::new(10, 20));
        assert_eq!(backend.viewport_for(95, 40), Viewport::new(9, 2));
        let backend = backend.with_cell_size(CellSize::new(0, 20));
        assert!(backend.viewport_for(95, 40).is_empty());
    }

    #[test]
    fn present_records_frames() {
        let mut backend = HeadlessBackend::new();
        let log = backend.log();
        let mut grid = Grid::new(4, 2);
        grid.set(1, 1, Cell::new('x'));
        backend
            .present(&grid, &[Region::new(1, 1, 1, 1)])
            .unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log.last().map(|f| f.regions), Some(vec![Region::new(1, 1, 1, 1)]));
    }

    #[test]
    fn failing_presents_are_counted() {
        let mut backend = HeadlessBackend::new().fail_presents(1);
        let log = backend.log();
        let grid = Grid::new(2, 2);
        assert!(backend.present(&grid, &[]).is_err());
        assert!(backend.present(&grid, &[]).is_ok());
        assert_eq!(log.failed_presents(), 1);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn out_of_bounds_region_is_rejected() {
        let mut backend = HeadlessBackend::new();
        let grid = Grid::new(2, 2);
        let err = backend.present(&grid, &[Region::new(1, 0, 5, 1)]).unwrap_err();
        assert!(matches!(err, RenderError::Dimensions { .. }));
    }

    #[test]
    fn wait_until_times_out() {
        let log = FrameLog::default();
        assert!(!log.wait_until(Duration::from_millis(10), |frames| !frames.is_empty()));
        assert!(log.wait_until(Duration::from_millis(10), <[PresentedFrame]>::is_empty));
    }
}

//! Terminal backend built on crossterm.
//!
//! The grid is drawn into the alternate screen with truecolor escapes and
//! input is read by a dedicated thread. The configured pixel size and font
//! do not apply here: the viewport is the terminal's own size in cells.

mod input;
mod output;

pub use input::{dispatch, translate, translate_key, translate_mouse, Input, InputActor};
pub use output::{EncodeStats, Encoder};

use std::io::{self, Stdout, Write};
use std::time::Duration;

use crossterm::{
    cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen, SetTitle},
};
use tracing::{debug, warn};

use crate::error::{BackendError, RenderError};
use crate::grid::{Grid, Region};
use crate::runtime::{ProgramConfig, ProgramHandle};

use super::{Backend, Viewport};

/// Terminal backend options.
#[derive(Debug, Clone)]
pub struct TerminalConfig {
    /// How long the input thread waits for an event before checking for
    /// shutdown.
    pub input_poll_timeout: Duration,
    /// Report mouse events.
    pub enable_mouse: bool,
    /// Draw in the alternate screen buffer.
    pub alternate_screen: bool,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            input_poll_timeout: Duration::from_millis(10),
            enable_mouse: true,
            alternate_screen: true,
        }
    }
}

/// Crossterm front end.
pub struct TerminalBackend {
    config: TerminalConfig,
    stdout: Stdout,
    encoder: Encoder,
    input: Option<InputActor>,
    active: bool,
}

impl TerminalBackend {
    /// A backend with default options.
    pub fn new() -> Self {
        Self::with_config(TerminalConfig::default())
    }

    /// A backend with custom options.
    pub fn with_config(config: TerminalConfig) -> Self {
        Self {
            config,
            stdout: io::stdout(),
            encoder: Encoder::new(),
            input: None,
            active: false,
        }
    }

    fn setup(&mut self, title: &str) -> io::Result<Viewport> {
        let (columns, rows) = terminal::size()?;
        terminal::enable_raw_mode()?;
        self.active = true;

        if self.config.alternate_screen {
            execute!(self.stdout, EnterAlternateScreen)?;
        }
        if self.config.enable_mouse {
            execute!(self.stdout, EnableMouseCapture)?;
        }
        execute!(self.stdout, cursor::Hide, SetTitle(title))?;
        self.encoder = Encoder::new();

        Ok(Viewport::new(usize::from(columns), usize::from(rows)))
    }

    fn restore(&mut self) {
        if let Some(actor) = self.input.take() {
            actor.join();
        }
        if !self.active {
            return;
        }
        self.active = false;

        let mut results = vec![execute!(self.stdout, cursor::Show)];
        if self.config.enable_mouse {
            results.push(execute!(self.stdout, DisableMouseCapture));
        }
        if self.config.alternate_screen {
            results.push(execute!(self.stdout, LeaveAlternateScreen));
        }
        results.push(terminal::disable_raw_mode());
        for err in results.into_iter().filter_map(Result::err) {
            warn!(error = %err, "failed to restore terminal");
        }
    }
}

impl Default for TerminalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for TerminalBackend {
    fn open<C: Send + 'static>(
        &mut self,
        config: &ProgramConfig,
        handle: ProgramHandle<C>,
    ) -> Result<Viewport, BackendError> {
        let viewport = match self.setup(&config.title) {
            Ok(viewport) => viewport,
            Err(err) => {
                self.restore();
                return Err(err.into());
            }
        };
        match InputActor::spawn(handle, self.config.input_poll_timeout) {
            Ok(actor) => self.input = Some(actor),
            Err(err) => {
                self.restore();
                return Err(err.into());
            }
        }
        debug!(columns = viewport.columns, rows = viewport.rows, "terminal opened");
        Ok(viewport)
    }

    fn present(&mut self, grid: &Grid, regions: &[Region]) -> Result<(), RenderError> {
        if !self.active {
            return Err(RenderError::NoSurface);
        }
        self.encoder.encode(grid, regions);
        self.encoder.finish();
        self.encoder.flush_to(&mut self.stdout)?;
        Ok(())
    }

    fn close(&mut self) {
        self.restore();
        let _ = self.stdout.flush();
        debug!("terminal restored");
    }
}

impl Drop for TerminalBackend {
    fn drop(&mut self) {
        self.restore();
    }
}

impl std::fmt::Debug for TerminalBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalBackend")
            .field("config", &self.config)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;

    #[test]
    fn test_present_before_open_fails() {
        let mut backend = TerminalBackend::new();
        let err = backend.present(&Grid::new(1, 1), &[]).unwrap_err();
        assert!(matches!(err, RenderError::NoSurface));
    }

    #[test]
    fn test_close_without_open_is_harmless() {
        let mut backend = TerminalBackend::with_config(TerminalConfig {
            enable_mouse: false,
            ..TerminalConfig::default()
        });
        backend.close();
        backend.close();
    }
}

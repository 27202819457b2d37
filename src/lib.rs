//! # BubbleGum
//!
//! A message-driven UI runtime: state, event, new state.
//!
//! An application is a [`Model`] with three functions. `init` runs once,
//! `update` applies one [`Msg`] and may return a [`Cmd`] for side effects,
//! and `view` renders the state as text with ANSI styling. The runtime
//! turns that text into a cell [`Grid`], diffs it against the previous
//! frame and hands only the changed [`Region`]s to a [`Backend`].
//!
//! ## Core Concepts
//!
//! - **Serialized updates**: the run loop owns the model; nothing else touches it
//! - **Commands**: work and timers run on executor threads and report back as messages
//! - **Fault isolation**: an error or panic in model code ends the program cleanly
//! - **Dirty regions**: row-granular diffing, so unchanged cells are never redrawn
//! - **Coalesced motion**: pointer movement is applied at most once per tick
//!
//! ## Example
//!
//! ```rust,no_run
//! use bubblegum::{Cmd, KeyKind, Model, ModelError, Msg, Program, TerminalBackend};
//!
//! struct Counter(u32);
//!
//! impl Model for Counter {
//!     type Custom = ();
//!
//!     fn update(&mut self, msg: Msg<()>) -> Result<Option<Cmd<()>>, ModelError> {
//!         match msg {
//!             Msg::Key(key) if key.kind == KeyKind::CtrlC => return Ok(Some(Cmd::quit())),
//!             Msg::Key(_) => self.0 += 1,
//!             _ => {}
//!         }
//!         Ok(None)
//!     }
//!
//!     fn view(&self) -> Result<String, ModelError> {
//!         Ok(format!("\x1b[1mkeys pressed:\x1b[0m {}", self.0))
//!     }
//! }
//!
//! let model = Program::new(Counter(0), TerminalBackend::new()).run()?;
//! println!("{} keys", model.0);
//! # Ok::<(), bubblegum::ProgramError>(())
//! ```
//!
//! The parser can also be used on its own:
//!
//! ```rust
//! use bubblegum::ansi::Parser;
//! use bubblegum::Modifiers;
//!
//! let mut parser = Parser::new(10, 2);
//! parser.feed("\x1b[1mhi");
//! let grid = parser.finish();
//! assert_eq!(grid.get(0, 0).map(|c| c.ch()), Some('h'));
//! assert!(grid.get(1, 0).is_some_and(|c| c.modifiers().contains(Modifiers::BOLD)));
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod ansi;
pub mod atlas;
pub mod backend;
pub mod error;
pub mod grid;
pub mod logging;
pub mod runtime;

// Re-exports for convenience
pub use backend::{Backend, FrameLog, HeadlessBackend, TerminalBackend, Viewport};
pub use error::{
    AtlasError, BackendError, CommandError, ConfigError, Fault, ModelError, ProgramError,
    RenderError,
};
pub use grid::{Cell, Color, Grid, Modifiers, Region, Rgb};
pub use logging::{LogConfig, LogFormat, Logger};
pub use runtime::{
    CancelToken, Cmd, Command, Executor, KeyKind, KeyMsg, Model, MouseButton, MouseKind,
    MouseMsg, Msg, Phase, Program, ProgramConfig, ProgramHandle, WindowSize,
};

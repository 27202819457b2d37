//! Runtime: the Model/Update/View loop and everything that feeds it.
//!
//! - **Program**: owns the model, runs the tick loop, renders frames
//! - **Executor**: runs commands and timers on worker threads
//! - **Handle**: thread-safe entry point for input and custom messages
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   send / motion / resize   ┌──────────────┐
//! │   Backend    │ ─────────────────────────▶ │              │
//! │ input thread │                            │   Program    │
//! └──────────────┘                            │  (run loop)  │
//!                                             │              │
//! ┌──────────────┐          Msg               │  update/view │
//! │   Executor   │ ─────────────────────────▶ │              │
//! │ cmd / timers │ ◀───────────────────────── │              │
//! └──────────────┘          Cmd               └──────┬───────┘
//!                                                    │ Grid + Regions
//!                                                    ▼
//!                                             ┌──────────────┐
//!                                             │   Backend    │
//!                                             │   present    │
//!                                             └──────────────┘
//! ```

mod cancel;
mod command;
mod config;
mod executor;
mod fault;
mod messages;
mod program;

pub use cancel::CancelToken;
pub use command::{Cmd, Command, CommandResult, EveryFn, OnceFn};
pub use config::{ProgramConfig, DEFAULT_CHANNEL_CAPACITY};
pub use executor::{Executor, ExecutorStats, MIN_INTERVAL};
pub use fault::isolate;
pub use messages::{
    CellSize, ErrorMsg, KeyKind, KeyMsg, MouseButton, MouseKind, MouseMsg, Msg, ScrollAxis,
    WindowSize,
};
pub use program::{Model, Phase, Program, ProgramHandle};

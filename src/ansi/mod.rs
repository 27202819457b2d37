//! ANSI module: turn styled terminal text into a [`Grid`](crate::grid::Grid).
//!
//! Recognized control sequences are SGR (`m`), cursor positioning
//! (`H`/`f`, `A`-`D`) and erase (`J`, `K`). Everything else is consumed
//! and ignored.

pub mod palette;
mod parser;

pub use parser::{parse, Parser, MAX_SEQUENCE_LEN};

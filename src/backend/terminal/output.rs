//! ANSI encoder: turns dirty grid regions into terminal output.
//!
//! The encoder remembers what it last told the terminal (cursor position,
//! colors, modifiers) and emits only the escape sequences needed to change
//! that state. A frame is accumulated in one buffer and written with a
//! single `write_all`.
//!
//! The grid holds one cell per character, while a terminal draws a wide
//! glyph over two columns. The cell to the right of a wide glyph is hidden
//! and never written. When a wide glyph is replaced by a narrow one, the
//! cell it used to hide is written again.

use std::io::Write;

use unicode_width::UnicodeWidthChar;

use crate::grid::{Cell, Color, Grid, Modifiers, Region};

/// Terminal state as last emitted. `None` means unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct TermState {
    cursor: Option<(usize, usize)>,
    fg: Option<Color>,
    bg: Option<Color>,
    modifiers: Option<Modifiers>,
}

/// Counters for one encoded frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeStats {
    /// Cells written.
    pub cells: usize,
    /// Cursor moves emitted.
    pub cursor_moves: usize,
    /// Color sequences emitted.
    pub color_changes: usize,
}

/// Incremental ANSI encoder.
#[derive(Debug, Clone)]
pub struct Encoder {
    state: TermState,
    size: Option<(usize, usize)>,
    /// Cells last written with a double-width glyph.
    wide: Vec<bool>,
    data: Vec<u8>,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    /// An encoder that assumes nothing about the terminal.
    pub fn new() -> Self {
        Self {
            state: TermState::default(),
            size: None,
            wide: Vec::new(),
            data: Vec::with_capacity(4096),
        }
    }

    /// Forget the terminal state (after a clear or anything unknown).
    pub fn reset(&mut self) {
        self.state = TermState::default();
    }

    /// Bytes produced since the last flush.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Encode `regions` of `grid`.
    ///
    /// When the grid size differs from the previous frame the screen is
    /// cleared and the whole grid is written.
    pub fn encode(&mut self, grid: &Grid, regions: &[Region]) -> EncodeStats {
        let mut stats = EncodeStats::default();
        let size = (grid.width(), grid.height());

        if self.size != Some(size) {
            self.size = Some(size);
            self.wide = vec![false; grid.len()];
            self.reset();
            self.data.extend_from_slice(b"\x1b[0m\x1b[2J");
            self.encode_region(grid, Region::covering(grid), &mut stats);
            return stats;
        }

        for region in regions {
            self.encode_region(grid, *region, &mut stats);
        }
        stats
    }

    fn encode_region(&mut self, grid: &Grid, region: Region, stats: &mut EncodeStats) {
        let x_end = region.right().min(grid.width());
        let y_end = region.bottom().min(grid.height());

        for y in region.y..y_end {
            for x in region.x..x_end {
                let narrowed = self.encode_cell(grid, x, y, stats);
                // The column it covered is outside this region; repaint it.
                if narrowed && x + 1 == x_end {
                    self.encode_cell(grid, x + 1, y, stats);
                }
            }
        }
    }

    /// Write one cell unless a wide glyph to its left hides it.
    ///
    /// Returns `true` if the cell held a wide glyph before and a narrow one now.
    fn encode_cell(&mut self, grid: &Grid, x: usize, y: usize, stats: &mut EncodeStats) -> bool {
        let Some((cell, index)) = grid.get(x, y).zip(grid.index_of(x, y)) else {
            return false;
        };
        if x > 0 && grid.get(x - 1, y).is_some_and(|left| is_wide(left.ch())) {
            return false;
        }
        if self.state.cursor != Some((x, y)) {
            self.move_to(x, y);
            stats.cursor_moves += 1;
        }
        self.style(cell, stats);
        self.put(cell, grid.width());
        stats.cells += 1;

        let wide = is_wide(cell.ch());
        let was_wide = self.wide.get(index).copied().unwrap_or(false);
        if let Some(slot) = self.wide.get_mut(index) {
            *slot = wide;
        }
        was_wide && !wide
    }

    fn move_to(&mut self, x: usize, y: usize) {
        let (row, col) = (y + 1, x + 1);
        if row == 1 && col == 1 {
            self.data.extend_from_slice(b"\x1b[H");
        } else if col == 1 {
            let _ = write!(self.data, "\x1b[{row}H");
        } else {
            let _ = write!(self.data, "\x1b[{row};{col}H");
        }
        self.state.cursor = Some((x, y));
    }

    fn style(&mut self, cell: &Cell, stats: &mut EncodeStats) {
        let want = cell.modifiers();
        let have = self.state.modifiers.unwrap_or_else(Modifiers::empty);

        // Turning a modifier off takes a full reset, which also drops colors.
        if self.state.modifiers.is_none() || !have.difference(want).is_empty() {
            self.data.extend_from_slice(b"\x1b[0m");
            self.state.fg = None;
            self.state.bg = None;
            self.state.modifiers = Some(Modifiers::empty());
        }

        if self.state.fg != Some(cell.fg()) {
            emit_color(&mut self.data, cell.fg(), Layer::Foreground);
            self.state.fg = Some(cell.fg());
            stats.color_changes += 1;
        }
        if self.state.bg != Some(cell.bg()) {
            emit_color(&mut self.data, cell.bg(), Layer::Background);
            self.state.bg = Some(cell.bg());
            stats.color_changes += 1;
        }

        let have = self.state.modifiers.unwrap_or_else(Modifiers::empty);
        let added = want.difference(have);
        if !added.is_empty() {
            emit_modifiers(&mut self.data, added);
        }
        self.state.modifiers = Some(want);
    }

    fn put(&mut self, cell: &Cell, width: usize) {
        let mut utf8 = [0u8; 4];
        self.data
            .extend_from_slice(cell.ch().encode_utf8(&mut utf8).as_bytes());

        let advance = cell.ch().width().unwrap_or(1).max(1);
        self.state.cursor = self.state.cursor.and_then(|(x, y)| {
            let next = x + advance;
            // At the right margin the terminal's wrap behavior varies.
            (next < width).then_some((next, y))
        });
    }

    /// Reset attributes at the end of a frame so stray output stays plain.
    pub fn finish(&mut self) {
        self.data.extend_from_slice(b"\x1b[0m");
        self.state.fg = None;
        self.state.bg = None;
        self.state.modifiers = Some(Modifiers::empty());
    }

    /// Write the accumulated bytes in one call and clear the buffer.
    pub fn flush_to<W: Write>(&mut self, writer: &mut W) -> std::io::Result<()> {
        let result = writer.write_all(&self.data).and_then(|()| writer.flush());
        self.data.clear();
        if result.is_err() {
            self.reset();
        }
        result
    }
}

fn is_wide(ch: char) -> bool {
    ch.width() == Some(2)
}

#[derive(Clone, Copy)]
enum Layer {
    Foreground,
    Background,
}

fn emit_color(out: &mut Vec<u8>, color: Color, layer: Layer) {
    match (color, layer) {
        (Color::Default, Layer::Foreground) => out.extend_from_slice(b"\x1b[39m"),
        (Color::Default, Layer::Background) => out.extend_from_slice(b"\x1b[49m"),
        (Color::Rgb(c), Layer::Foreground) => {
            let _ = write!(out, "\x1b[38;2;{};{};{}m", c.r, c.g, c.b);
        }
        (Color::Rgb(c), Layer::Background) => {
            let _ = write!(out, "\x1b[48;2;{};{};{}m", c.r, c.g, c.b);
        }
    }
}

fn emit_modifiers(out: &mut Vec<u8>, modifiers: Modifiers) {
    if modifiers.contains(Modifiers::BOLD) {
        out.extend_from_slice(b"\x1b[1m");
    }
    if modifiers.contains(Modifiers::ITALIC) {
        out.extend_from_slice(b"\x1b[3m");
    }
    if modifiers.contains(Modifiers::UNDERLINE) {
        out.extend_from_slice(b"\x1b[4m");
    }
    if modifiers.contains(Modifiers::STRIKETHROUGH) {
        out.extend_from_slice(b"\x1b[9m");
    }
}

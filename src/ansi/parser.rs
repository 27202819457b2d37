//! Escape-sequence parser: styled text in, [`Grid`] out.
//!
//! The parser is a two-state machine over Unicode codepoints. In the normal
//! state plain characters are written at the cursor with the current style.
//! `ESC [` switches to collecting a control sequence, which ends at the
//! first ASCII letter. Input may be fed in several chunks; a sequence left
//! open when [`Parser::finish`] is called is discarded.

use crate::grid::{Cell, Color, Grid, Modifiers, Rgb};

use super::palette::{ansi16, ansi256};

/// Longest control sequence body (in codepoints) the parser will buffer.
///
/// Longer sequences are still consumed up to their terminator but have no
/// effect.
pub const MAX_SEQUENCE_LEN: usize = 64;

const ESC: char = '\x1b';
const TAB_STOP: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Normal,
    /// Saw `ESC`, waiting for `[`.
    Escape,
    /// Inside `ESC [ ... `, collecting parameters.
    Sequence { body: String, len: usize },
}

/// Streaming ANSI parser writing into an owned grid.
///
/// # Example
/// ```
/// use bubblegum::ansi::Parser;
/// let mut parser = Parser::new(10, 2);
/// parser.feed("\x1b[1mHi");
/// let grid = parser.finish();
/// assert!(grid.get(0, 0).unwrap().is_bold());
/// ```
#[derive(Debug, Clone)]
pub struct Parser {
    grid: Grid,
    x: usize,
    y: usize,
    fg: Color,
    bg: Color,
    modifiers: Modifiers,
    state: State,
}

impl Parser {
    /// Create a parser over a blank `width` x `height` grid.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            grid: Grid::new(width, height),
            x: 0,
            y: 0,
            fg: Color::Default,
            bg: Color::Default,
            modifiers: Modifiers::empty(),
            state: State::Normal,
        }
    }

    /// Current cursor position as `(column, row)`.
    ///
    /// The cursor may sit outside the grid; writes there are dropped.
    pub const fn cursor(&self) -> (usize, usize) {
        (self.x, self.y)
    }

    /// The grid as written so far.
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Consume more input.
    pub fn feed(&mut self, input: &str) {
        for ch in input.chars() {
            self.advance(ch);
        }
    }

    /// Finish parsing and return the grid.
    ///
    /// Any unterminated escape sequence is dropped without effect.
    pub fn finish(self) -> Grid {
        self.grid
    }

    fn advance(&mut self, ch: char) {
        match std::mem::replace(&mut self.state, State::Normal) {
            State::Normal => {
                if ch == ESC {
                    self.state = State::Escape;
                } else {
                    self.print(ch);
                }
            }
            State::Escape => {
                if ch == '[' {
                    self.state = State::Sequence {
                        body: String::new(),
                        len: 0,
                    };
                } else {
                    // A lone ESC is dropped and the character is handled normally.
                    self.advance(ch);
                }
            }
            State::Sequence { mut body, len } => {
                if ch.is_ascii_alphabetic() {
                    if len <= MAX_SEQUENCE_LEN {
                        self.dispatch(ch, &body);
                    }
                } else {
                    if len < MAX_SEQUENCE_LEN {
                        body.push(ch);
                    }
                    self.state = State::Sequence {
                        body,
                        len: len.saturating_add(1),
                    };
                }
            }
        }
    }

    fn print(&mut self, ch: char) {
        match ch {
            '\n' => {
                self.x = 0;
                self.y = self.y.saturating_add(1);
            }
            '\r' => self.x = 0,
            '\t' => self.x = (self.x / TAB_STOP + 1).saturating_mul(TAB_STOP),
            c if c.is_control() => return,
            c => {
                let cell = Cell::new(c)
                    .with_fg(self.fg)
                    .with_bg(self.bg)
                    .with_modifiers(self.modifiers);
                self.grid.set(self.x, self.y, cell);
                self.x = self.x.saturating_add(1);
            }
        }

        if self.x >= self.grid.width() {
            self.x = 0;
            self.y = self.y.saturating_add(1);
        }
    }

    fn dispatch(&mut self, command: char, params: &str) {
        match command {
            'm' => self.select_graphic_rendition(params),
            'H' | 'f' => self.move_to(params),
            'A' => self.y = self.y.saturating_sub(count(params)),
            'B' => self.y = self.y.saturating_add(count(params)),
            'C' => self.x = self.x.saturating_add(count(params)),
            'D' => self.x = self.x.saturating_sub(count(params)),
            'J' => self.erase_display(mode(params)),
            'K' => self.erase_line(mode(params)),
            _ => {}
        }
    }

    fn move_to(&mut self, params: &str) {
        let coords = split_params(params);
        self.y = one_based(coords.first().copied().unwrap_or(0));
        self.x = one_based(coords.get(1).copied().unwrap_or(0));
    }

    fn erase_display(&mut self, mode: i64) {
        match mode {
            0 => {
                self.grid.clear_line_from(self.x, self.y);
                for y in self.y.saturating_add(1)..self.grid.height() {
                    self.grid.clear_line(y);
                }
            }
            1 => {
                for y in 0..self.y.min(self.grid.height()) {
                    self.grid.clear_line(y);
                }
                self.grid.clear_line_through(self.x, self.y);
            }
            2 | 3 => self.grid.clear(),
            _ => {}
        }
    }

    fn erase_line(&mut self, mode: i64) {
        match mode {
            0 => self.grid.clear_line_from(self.x, self.y),
            1 => self.grid.clear_line_through(self.x, self.y),
            2 => self.grid.clear_line(self.y),
            _ => {}
        }
    }

    fn select_graphic_rendition(&mut self, params: &str) {
        let codes = split_params(params);
        let mut i = 0;
        while i < codes.len() {
            match codes[i] {
                0 => {
                    self.fg = Color::Default;
                    self.bg = Color::Default;
                    self.modifiers = Modifiers::empty();
                }
                1 => self.modifiers.insert(Modifiers::BOLD),
                3 => self.modifiers.insert(Modifiers::ITALIC),
                4 => self.modifiers.insert(Modifiers::UNDERLINE),
                9 => self.modifiers.insert(Modifiers::STRIKETHROUGH),
                22 => self.modifiers.remove(Modifiers::BOLD),
                23 => self.modifiers.remove(Modifiers::ITALIC),
                24 => self.modifiers.remove(Modifiers::UNDERLINE),
                29 => self.modifiers.remove(Modifiers::STRIKETHROUGH),
                code @ 30..=37 => self.fg = ansi16(code - 30),
                38 => {
                    if let Some((color, used)) = extended_color(&codes[i + 1..]) {
                        self.fg = color;
                        i += used;
                    }
                }
                39 => self.fg = Color::Default,
                code @ 40..=47 => self.bg = ansi16(code - 40),
                48 => {
                    if let Some((color, used)) = extended_color(&codes[i + 1..]) {
                        self.bg = color;
                        i += used;
                    }
                }
                49 => self.bg = Color::Default,
                code @ 90..=97 => self.fg = ansi16(code - 90 + 8),
                code @ 100..=107 => self.bg = ansi16(code - 100 + 8),
                _ => {}
            }
            i += 1;
        }
    }
}

/// Parse `input` into a fresh `width` x `height` grid.
pub fn parse(input: &str, width: usize, height: usize) -> Grid {
    let mut parser = Parser::new(width, height);
    parser.feed(input);
    parser.finish()
}

/// Split a `;`-separated parameter list. Empty parts count as 0 and
/// non-numeric parts are skipped. An empty list is a single 0.
fn split_params(params: &str) -> Vec<i64> {
    params
        .split(';')
        .filter_map(|part| {
            if part.is_empty() {
                Some(0)
            } else {
                part.parse().ok()
            }
        })
        .collect()
}

/// `5;n` or `2;r;g;b` following a 38/48 code. Returns the color and the
/// number of parameters consumed.
fn extended_color(args: &[i64]) -> Option<(Color, usize)> {
    match args {
        [5, n, ..] => Some((ansi256(*n), 2)),
        [2, r, g, b, ..] => Some((Color::Rgb(Rgb::new(channel(*r), channel(*g), channel(*b))), 4)),
        _ => None,
    }
}

fn channel(value: i64) -> u8 {
    u8::try_from(value.clamp(0, 255)).unwrap_or(u8::MAX)
}

/// Relative cursor move distance: default 1, non-positive treated as 1.
fn count(params: &str) -> usize {
    params
        .parse::<usize>()
        .ok()
        .filter(|n| *n > 0)
        .unwrap_or(1)
}

/// Erase mode: default 0.
fn mode(params: &str) -> i64 {
    params.parse().unwrap_or(0)
}

/// Convert a 1-based coordinate to 0-based, clamped at 0.
fn one_based(value: i64) -> usize {
    usize::try_from(value.saturating_sub(1)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(grid: &Grid, y: usize) -> String {
        grid.line_text(y).unwrap_or_default()
    }

    #[test]
    fn test_parse_basic_text() {
        let grid = parse("Hello, World!", 20, 5);
        assert_eq!(text(&grid, 0), "Hello, World!       ");
        assert_eq!(grid.get(0, 0).map(Cell::ch), Some('H'));
        for y in 1..5 {
            for x in 0..20 {
                assert_eq!(grid.get(x, y), Some(&Cell::EMPTY));
            }
        }
    }

    #[test]
    fn test_parse_sgr_color_and_reset() {
        let grid = parse("\x1b[31mRed\x1b[0mX", 10, 1);
        let first = grid.get(0, 0).copied().unwrap_or_default();
        assert_eq!(first.fg(), Color::rgb(128, 0, 0));
        assert!(!first.fg().is_default());
        assert!(grid.get(3, 0).is_some_and(|c| c.fg().is_default()));
        assert_eq!(grid.get(3, 0).map(Cell::ch), Some('X'));
    }

    #[test]
    fn test_parse_styles_set_and_unset() {
        let grid = parse("\x1b[1;3;4;9ma\x1b[22;23mb\x1b[24;29mc", 5, 1);
        let a = grid.get(0, 0).copied().unwrap_or_default();
        assert!(a.is_bold() && a.is_italic() && a.is_underline() && a.is_strikethrough());
        let b = grid.get(1, 0).copied().unwrap_or_default();
        assert!(!b.is_bold() && !b.is_italic() && b.is_underline() && b.is_strikethrough());
        let c = grid.get(2, 0).copied().unwrap_or_default();
        assert!(c.modifiers().is_empty());
    }

    #[test]
    fn test_parse_bright_and_background() {
        let grid = parse("\x1b[91;104ma\x1b[39;49mb", 5, 1);
        let a = grid.get(0, 0).copied().unwrap_or_default();
        assert_eq!(a.fg(), Color::rgb(255, 0, 0));
        assert_eq!(a.bg(), Color::rgb(0, 0, 255));
        let b = grid.get(1, 0).copied().unwrap_or_default();
        assert!(b.fg().is_default() && b.bg().is_default());
    }

    #[test]
    fn test_parse_extended_colors() {
        let grid = parse("\x1b[38;5;196;48;2;1;2;3mx\x1b[38;2;300;-4;7my", 5, 1);
        let x = grid.get(0, 0).copied().unwrap_or_default();
        assert_eq!(x.fg(), Color::rgb(255, 0, 0));
        assert_eq!(x.bg(), Color::rgb(1, 2, 3));
        let y = grid.get(1, 0).copied().unwrap_or_default();
        assert_eq!(y.fg(), Color::rgb(255, 0, 7));
    }

    #[test]
    fn test_incomplete_extended_color_is_ignored() {
        let grid = parse("\x1b[38;5mx", 5, 1);
        assert!(grid.get(0, 0).is_some_and(|c| c.fg().is_default()));
    }

    #[test]
    fn test_empty_sgr_resets() {
        let grid = parse("\x1b[1;31m\x1b[mx", 5, 1);
        assert_eq!(grid.get(0, 0), Some(&Cell::new('x')));
    }

    #[test]
    fn test_cursor_position_is_one_based() {
        let grid = parse("\x1b[2;3HX\x1b[HY", 5, 3);
        assert_eq!(grid.get(2, 1).map(Cell::ch), Some('X'));
        assert_eq!(grid.get(0, 0).map(Cell::ch), Some('Y'));

        let grid = parse("\x1b[0;0fZ", 5, 3);
        assert_eq!(grid.get(0, 0).map(Cell::ch), Some('Z'));
    }

    #[test]
    fn test_relative_moves_clamp_at_zero() {
        let mut parser = Parser::new(20, 20);
        parser.feed("\x1b[5A\x1b[5D");
        assert_eq!(parser.cursor(), (0, 0));
        parser.feed("\x1b[3B\x1b[4C");
        assert_eq!(parser.cursor(), (4, 3));
        parser.feed("\x1b[A\x1b[0D\x1b[-2C");
        assert_eq!(parser.cursor(), (4, 2));
    }

    #[test]
    fn test_erase_line_modes() {
        let mut parser = Parser::new(5, 1);
        parser.feed("abcde\x1b[1;3H\x1b[K");
        assert_eq!(text(parser.grid(), 0), "ab   ");

        let mut parser = Parser::new(5, 1);
        parser.feed("abcde\x1b[1;3H\x1b[1K");
        assert_eq!(text(parser.grid(), 0), "   de");

        let mut parser = Parser::new(5, 1);
        parser.feed("abcde\x1b[1;3H\x1b[2K");
        assert_eq!(text(parser.grid(), 0), "     ");
    }

    #[test]
    fn test_erase_display_modes() {
        // Fills all three rows through soft wrap.
        let fill = "abcdefghi";

        let grid = parse(&format!("{fill}\x1b[2;2H\x1b[J"), 3, 3);
        assert_eq!([text(&grid, 0), text(&grid, 1), text(&grid, 2)], ["abc", "d  ", "   "]);

        let grid = parse(&format!("{fill}\x1b[2;2H\x1b[1J"), 3, 3);
        assert_eq!([text(&grid, 0), text(&grid, 1), text(&grid, 2)], ["   ", "  f", "ghi"]);

        let grid = parse(&format!("{fill}\x1b[3J"), 3, 3);
        assert!(grid.cells().iter().all(|c| *c == Cell::EMPTY));
    }

    #[test]
    fn test_tab_and_wrap() {
        let mut parser = Parser::new(20, 3);
        parser.feed("ab\tc");
        assert_eq!(parser.grid().get(8, 0).map(Cell::ch), Some('c'));

        let grid = parse("abcdef", 4, 2);
        assert_eq!(text(&grid, 0), "abcd");
        assert_eq!(text(&grid, 1), "ef  ");
    }

    #[test]
    fn test_carriage_return_and_newline() {
        let grid = parse("xyz\rA\nB", 4, 2);
        assert_eq!(text(&grid, 0), "Ayz ");
        assert_eq!(text(&grid, 1), "B   ");
    }

    #[test]
    fn test_writes_past_bottom_are_dropped() {
        let grid = parse("a\nb\nc\nd", 2, 2);
        assert_eq!(text(&grid, 0), "a ");
        assert_eq!(text(&grid, 1), "b ");
    }

    #[test]
    fn test_unterminated_sequence_is_discarded() {
        let mut parser = Parser::new(5, 1);
        parser.feed("a\x1b[31");
        let cursor = parser.cursor();
        let grid = parser.finish();
        assert_eq!(cursor, (1, 0));
        assert_eq!(text(&grid, 0), "a    ");
    }

    #[test]
    fn test_sequence_split_across_feeds() {
        let mut parser = Parser::new(5, 1);
        parser.feed("\x1b");
        parser.feed("[3");
        parser.feed("1mR");
        assert_eq!(parser.grid().get(0, 0).map(|c| c.fg()), Some(Color::rgb(128, 0, 0)));
    }

    #[test]
    fn test_overlong_sequence_has_no_effect() {
        let params = "1;".repeat(MAX_SEQUENCE_LEN);
        let grid = parse(&format!("\x1b[{params}31mx"), 5, 1);
        assert_eq!(grid.get(0, 0), Some(&Cell::new('x')));
    }

    #[test]
    fn test_lone_escape_and_controls_are_skipped() {
        let grid = parse("a\x1bb\x07c", 5, 1);
        assert_eq!(text(&grid, 0), "abc  ");
    }

    #[test]
    fn test_unknown_terminator_is_ignored() {
        let grid = parse("\x1b[?25lok", 5, 1);
        assert_eq!(text(&grid, 0), "ok   ");
    }

    #[test]
    fn test_split_params() {
        assert_eq!(split_params(""), vec![0]);
        assert_eq!(split_params("1;;x;4"), vec![1, 0, 4]);
    }
}

//! Message types flowing into a model's `update`.
//!
//! Built-in events are closed variants of [`Msg`]; application events ride
//! in [`Msg::User`] so `update` can match exhaustively.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::error::Fault;

/// A message delivered to [`Model::update`](super::Model::update).
#[derive(Debug, Clone)]
pub enum Msg<C> {
    /// Keyboard input.
    Key(KeyMsg),
    /// Pointer input, in grid cells.
    Mouse(MouseMsg),
    /// The viewport changed size, in grid cells.
    Resize(WindowSize),
    /// Stop the program.
    Quit,
    /// A command failed.
    Error(ErrorMsg),
    /// A timer fired.
    Tick(Instant),
    /// An application-defined message.
    User(C),
}

impl<C> Msg<C> {
    /// Whether this is the quit signal.
    pub const fn is_quit(&self) -> bool {
        matches!(self, Self::Quit)
    }

    /// A short name for log fields.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Key(_) => "key",
            Self::Mouse(_) => "mouse",
            Self::Resize(_) => "resize",
            Self::Quit => "quit",
            Self::Error(_) => "error",
            Self::Tick(_) => "tick",
            Self::User(_) => "user",
        }
    }
}

/// Which key was pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    /// Printable characters, carried in [`KeyMsg::runes`].
    Runes,
    /// Enter / Return.
    Enter,
    /// Backspace.
    Backspace,
    /// Tab.
    Tab,
    /// Escape.
    Esc,
    /// Arrow up.
    Up,
    /// Arrow down.
    Down,
    /// Arrow left.
    Left,
    /// Arrow right.
    Right,
    /// Home.
    Home,
    /// End.
    End,
    /// Page up.
    PageUp,
    /// Page down.
    PageDown,
    /// Delete.
    Delete,
    /// Insert.
    Insert,
    /// Function key F1 through F12.
    F(u8),
    /// Ctrl+C.
    CtrlC,
    /// Ctrl+D.
    CtrlD,
    /// Ctrl+L.
    CtrlL,
    /// Ctrl+Z.
    CtrlZ,
}

/// A keyboard event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMsg {
    /// Key kind.
    pub kind: KeyKind,
    /// Characters typed, for [`KeyKind::Runes`].
    pub runes: Vec<char>,
    /// Alt was held.
    pub alt: bool,
}

impl KeyMsg {
    /// A non-character key.
    pub const fn new(kind: KeyKind) -> Self {
        Self {
            kind,
            runes: Vec::new(),
            alt: false,
        }
    }

    /// A single typed character.
    pub fn rune(ch: char) -> Self {
        Self {
            kind: KeyKind::Runes,
            runes: vec![ch],
            alt: false,
        }
    }

    /// Same key with Alt held (builder pattern).
    #[must_use]
    pub fn with_alt(mut self, alt: bool) -> Self {
        self.alt = alt;
        self
    }
}

impl fmt::Display for KeyMsg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind == KeyKind::Runes {
            let text: String = self.runes.iter().collect();
            write!(f, "KeyMsg{{Runes: {text:?}, Alt: {}}}", self.alt)
        } else {
            write!(f, "KeyMsg{{Kind: {:?}, Alt: {}}}", self.kind, self.alt)
        }
    }
}

/// What the pointer did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseKind {
    /// Button pressed.
    Press,
    /// Button released.
    Release,
    /// Pointer moved.
    Motion,
    /// Scroll wheel.
    Wheel,
}

/// Which button was involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MouseButton {
    /// No button (motion).
    #[default]
    None,
    /// Left button.
    Left,
    /// Middle button.
    Middle,
    /// Right button.
    Right,
    /// Wheel scrolled up.
    WheelUp,
    /// Wheel scrolled down.
    WheelDown,
    /// Wheel scrolled left.
    WheelLeft,
    /// Wheel scrolled right.
    WheelRight,
}

impl MouseButton {
    /// Map a Linux input event code (`BTN_LEFT` = 272 ...) to a button.
    pub const fn from_linux_code(code: u32) -> Self {
        match code {
            272 => Self::Left,
            273 => Self::Right,
            274 => Self::Middle,
            _ => Self::None,
        }
    }
}

/// Scroll axis reported by a windowed front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAxis {
    /// Up/down.
    Vertical,
    /// Left/right.
    Horizontal,
}

/// A pointer event in grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MouseMsg {
    /// Column.
    pub x: usize,
    /// Row.
    pub y: usize,
    /// Event kind.
    pub kind: MouseKind,
    /// Button involved.
    pub button: MouseButton,
}

impl MouseMsg {
    /// A pointer event at a cell.
    pub const fn new(x: usize, y: usize, kind: MouseKind, button: MouseButton) -> Self {
        Self { x, y, kind, button }
    }

    /// A pointer event at a pixel position, converted to cells.
    pub fn from_pixels(
        px: f32,
        py: f32,
        cell: CellSize,
        kind: MouseKind,
        button: MouseButton,
    ) -> Self {
        let (x, y) = cell.to_cell(px, py);
        Self::new(x, y, kind, button)
    }

    /// A scroll event at a pixel position. Negative `value` scrolls up (or left).
    pub fn scroll(px: f32, py: f32, axis: ScrollAxis, value: f32, cell: CellSize) -> Self {
        let button = match (axis, value < 0.0) {
            (ScrollAxis::Vertical, true) => MouseButton::WheelUp,
            (ScrollAxis::Vertical, false) => MouseButton::WheelDown,
            (ScrollAxis::Horizontal, true) => MouseButton::WheelLeft,
            (ScrollAxis::Horizontal, false) => MouseButton::WheelRight,
        };
        Self::from_pixels(px, py, cell, MouseKind::Wheel, button)
    }
}

impl fmt::Display for MouseMsg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MouseMsg{{X: {}, Y: {}, Kind: {:?}, Button: {:?}}}",
            self.x, self.y, self.kind, self.button
        )
    }
}

/// Pixel size of one grid cell, for front ends that receive pixel input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSize {
    /// Cell width in pixels.
    pub width: u32,
    /// Cell height in pixels.
    pub height: u32,
}

impl CellSize {
    /// Create a cell size.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Convert a pixel position to a cell position. Negative positions map
    /// to 0; a zero-sized cell maps everything to 0.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn to_cell(self, px: f32, py: f32) -> (usize, usize) {
        let axis = |p: f32, size: u32| {
            if size == 0 || p.is_nan() {
                0
            } else {
                (p / size as f32).max(0.0) as usize
            }
        };
        (axis(px, self.width), axis(py, self.height))
    }
}

/// The viewport size in grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WindowSize {
    /// Columns.
    pub width: usize,
    /// Rows.
    pub height: usize,
}

impl fmt::Display for WindowSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WindowSize{{Width: {}, Height: {}}}", self.width, self.height)
    }
}

/// A command failure delivered to the model.
#[derive(Debug, Clone)]
pub struct ErrorMsg(Arc<Fault>);

impl ErrorMsg {
    /// Wrap a fault.
    pub fn new(fault: Fault) -> Self {
        Self(Arc::new(fault))
    }

    /// The underlying fault.
    pub fn fault(&self) -> &Fault {
        &self.0
    }
}

impl fmt::Display for ErrorMsg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Fault> for ErrorMsg {
    fn from(fault: Fault) -> Self {
        Self::new(fault)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_display() {
        let key = KeyMsg::rune('q').with_alt(true);
        assert_eq!(key.to_string(), "KeyMsg{Runes: \"q\", Alt: true}");
        assert_eq!(KeyMsg::new(KeyKind::Enter).to_string(), "KeyMsg{Kind: Enter, Alt: false}");
    }

    #[test]
    fn pixel_to_cell() {
        let cell = CellSize::new(8, 16);
        assert_eq!(cell.to_cell(17.5, 40.0), (2, 2));
        assert_eq!(cell.to_cell(-5.0, 3.0), (0, 0));
        assert_eq!(CellSize::new(0, 16).to_cell(100.0, 100.0), (0, 6));
    }

    #[test]
    fn scroll_direction() {
        let cell = CellSize::new(10, 10);
        let up = MouseMsg::scroll(15.0, 25.0, ScrollAxis::Vertical, -1.0, cell);
        assert_eq!(up, MouseMsg::new(1, 2, MouseKind::Wheel, MouseButton::WheelUp));
        let right = MouseMsg::scroll(0.0, 0.0, ScrollAxis::Horizontal, 2.0, cell);
        assert_eq!(right.button, MouseButton::WheelRight);
    }

    #[test]
    fn linux_button_codes() {
        assert_eq!(MouseButton::from_linux_code(272), MouseButton::Left);
        assert_eq!(MouseButton::from_linux_code(273), MouseButton::Right);
        assert_eq!(MouseButton::from_linux_code(274), MouseButton::Middle);
        assert_eq!(MouseButton::from_linux_code(1), MouseButton::None);
    }

    #[test]
    fn msg_kind_names() {
        let quit: Msg<()> = Msg::Quit;
        assert!(quit.is_quit());
        assert_eq!(Msg::User(3).kind(), "user");
        let err: Msg<()> = Msg::Error(Fault::Panicked("x".into()).into());
        assert_eq!(err.kind(), "error");
    }
}

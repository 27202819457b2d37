//! Cell: one character position in the display grid.
//!
//! A cell stores a single codepoint, its foreground and background
//! [`Color`], and the four style [`Modifiers`] the parser understands.
//! Colors may be left as [`Color::Default`] so the renderer can resolve
//! them against the active theme instead of baking a value at parse time.

use bitflags::bitflags;

/// True-color RGB representation.
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rgb {
    /// Red channel (0-255)
    pub r: u8,
    /// Green channel (0-255)
    pub g: u8,
    /// Blue channel (0-255)
    pub b: u8,
}

impl Rgb {
    /// Create a new RGB color.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Black (0, 0, 0)
    pub const BLACK: Self = Self::new(0, 0, 0);
    /// White (255, 255, 255)
    pub const WHITE: Self = Self::new(255, 255, 255);

    /// Create from a 24-bit hex color (e.g., 0xFF5500).
    #[inline]
    pub const fn from_u32(hex: u32) -> Self {
        Self::new(
            ((hex >> 16) & 0xFF) as u8,
            ((hex >> 8) & 0xFF) as u8,
            (hex & 0xFF) as u8,
        )
    }
}

impl std::fmt::Debug for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl From<(u8, u8, u8)> for Rgb {
    #[inline]
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::new(r, g, b)
    }
}

impl From<u32> for Rgb {
    #[inline]
    fn from(hex: u32) -> Self {
        Self::from_u32(hex)
    }
}

/// A cell color: an explicit RGB triple or the theme default.
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Color {
    /// Resolved by the renderer against its theme.
    #[default]
    Default,
    /// An explicit color.
    Rgb(Rgb),
}

impl Color {
    /// Create an explicit color.
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::Rgb(Rgb::new(r, g, b))
    }

    /// Whether this is the theme-default sentinel.
    #[inline]
    pub const fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }

    /// The explicit RGB value, if any.
    #[inline]
    pub const fn as_rgb(&self) -> Option<Rgb> {
        match self {
            Self::Default => None,
            Self::Rgb(rgb) => Some(*rgb),
        }
    }

    /// Resolve against a theme default.
    #[inline]
    pub const fn resolve(&self, default: Rgb) -> Rgb {
        match self {
            Self::Default => default,
            Self::Rgb(rgb) => *rgb,
        }
    }
}

impl std::fmt::Debug for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Default => f.write_str("default"),
            Self::Rgb(rgb) => rgb.fmt(f),
        }
    }
}

impl From<Rgb> for Color {
    #[inline]
    fn from(rgb: Rgb) -> Self {
        Self::Rgb(rgb)
    }
}

bitflags! {
    /// Text style modifiers.
    ///
    /// # Example
    /// ```
    /// use bubblegum::Modifiers;
    /// let style = Modifiers::BOLD | Modifiers::ITALIC;
    /// assert!(style.contains(Modifiers::BOLD));
    /// ```
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        /// Bold text
        const BOLD = 0b0000_0001;
        /// Italic text
        const ITALIC = 0b0000_0010;
        /// Underlined text
        const UNDERLINE = 0b0000_0100;
        /// Strikethrough text
        const STRIKETHROUGH = 0b0000_1000;
    }
}

impl std::fmt::Debug for Modifiers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        bitflags::parser::to_writer(self, f)
    }
}

/// A single grid cell.
///
/// Equality is structural: character, both colors and all modifiers.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
    modifiers: Modifiers,
}

impl Default for Cell {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Cell {
    /// A blank cell (space with default colors, no modifiers).
    pub const EMPTY: Self = Self {
        ch: ' ',
        fg: Color::Default,
        bg: Color::Default,
        modifiers: Modifiers::empty(),
    };

    /// Create a cell holding `ch` with default colors.
    #[inline]
    pub const fn new(ch: char) -> Self {
        Self {
            ch,
            fg: Color::Default,
            bg: Color::Default,
            modifiers: Modifiers::empty(),
        }
    }

    /// The stored codepoint.
    #[inline]
    pub const fn ch(&self) -> char {
        self.ch
    }

    /// Foreground color.
    #[inline]
    pub const fn fg(&self) -> Color {
        self.fg
    }

    /// Background color.
    #[inline]
    pub const fn bg(&self) -> Color {
        self.bg
    }

    /// Style modifiers.
    #[inline]
    pub const fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Whether the cell is bold.
    #[inline]
    pub const fn is_bold(&self) -> bool {
        self.modifiers.contains(Modifiers::BOLD)
    }

    /// Whether the cell is italic.
    #[inline]
    pub const fn is_italic(&self) -> bool {
        self.modifiers.contains(Modifiers::ITALIC)
    }

    /// Whether the cell is underlined.
    #[inline]
    pub const fn is_underline(&self) -> bool {
        self.modifiers.contains(Modifiers::UNDERLINE)
    }

    /// Whether the cell is struck through.
    #[inline]
    pub const fn is_strikethrough(&self) -> bool {
        self.modifiers.contains(Modifiers::STRIKETHROUGH)
    }

    /// Set the foreground color (builder pattern).
    #[inline]
    #[must_use]
    pub fn with_fg(mut self, fg: impl Into<Color>) -> Self {
        self.fg = fg.into();
        self
    }

    /// Set the background color (builder pattern).
    #[inline]
    #[must_use]
    pub fn with_bg(mut self, bg: impl Into<Color>) -> Self {
        self.bg = bg.into();
        self
    }

    /// Set the modifiers (builder pattern).
    #[inline]
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Reset the cell to blank.
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::EMPTY;
    }
}

impl std::fmt::Debug for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cell")
            .field("ch", &self.ch)
            .field("fg", &self.fg)
            .field("bg", &self.bg)
            .field("modifiers", &self.modifiers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_from_tuple() {
        let rgb: Rgb = (255, 128, 0).into();
        assert_eq!(rgb, Rgb::new(255, 128, 0));
    }

    #[test]
    fn test_rgb_from_hex() {
        let rgb: Rgb = 0xFF8000.into();
        assert_eq!(rgb.r, 255);
        assert_eq!(rgb.g, 128);
        assert_eq!(rgb.b, 0);
    }

    #[test]
    fn test_color_default_resolution() {
        let fallback = Rgb::new(1, 2, 3);
        assert!(Color::Default.is_default());
        assert_eq!(Color::Default.resolve(fallback), fallback);
        assert_eq!(Color::rgb(9, 9, 9).resolve(fallback), Rgb::new(9, 9, 9));
        assert_eq!(Color::rgb(9, 9, 9).as_rgb(), Some(Rgb::new(9, 9, 9)));
    }

    #[test]
    fn test_empty_cell() {
        let cell = Cell::default();
        assert_eq!(cell.ch(), ' ');
        assert!(cell.fg().is_default());
        assert!(cell.bg().is_default());
        assert!(cell.modifiers().is_empty());
    }

    #[test]
    fn test_cell_equality_is_structural() {
        let a = Cell::new('A').with_fg(Rgb::new(255, 0, 0));
        let b = Cell::new('A').with_fg(Rgb::new(255, 0, 0));
        let c = Cell::new('A').with_fg(Rgb::new(0, 255, 0));
        let d = Cell::new('A')
            .with_fg(Rgb::new(255, 0, 0))
            .with_modifiers(Modifiers::UNDERLINE);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn test_cell_builder_pattern() {
        let cell = Cell::new('X')
            .with_fg(Rgb::new(255, 0, 0))
            .with_bg(Rgb::new(0, 0, 255))
            .with_modifiers(Modifiers::BOLD | Modifiers::STRIKETHROUGH);

        assert_eq!(cell.fg(), Color::rgb(255, 0, 0));
        assert_eq!(cell.bg(), Color::rgb(0, 0, 255));
        assert!(cell.is_bold());
        assert!(cell.is_strikethrough());
        assert!(!cell.is_italic());
        assert!(!cell.is_underline());
    }

    #[test]
    fn test_cell_reset() {
        let mut cell = Cell::new('X').with_fg(Rgb::new(255, 0, 0));
        cell.reset();
        assert_eq!(cell, Cell::EMPTY);
    }
}

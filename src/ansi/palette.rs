//! Fixed color tables for SGR color codes.

use crate::grid::{Color, Rgb};

/// The 16 standard and bright colors, indexed 0-15.
pub const ANSI_16: [Rgb; 16] = [
    Rgb::new(0, 0, 0),
    Rgb::new(128, 0, 0),
    Rgb::new(0, 128, 0),
    Rgb::new(128, 128, 0),
    Rgb::new(0, 0, 128),
    Rgb::new(128, 0, 128),
    Rgb::new(0, 128, 128),
    Rgb::new(192, 192, 192),
    Rgb::new(128, 128, 128),
    Rgb::new(255, 0, 0),
    Rgb::new(0, 255, 0),
    Rgb::new(255, 255, 0),
    Rgb::new(0, 0, 255),
    Rgb::new(255, 0, 255),
    Rgb::new(0, 255, 255),
    Rgb::new(255, 255, 255),
];

/// Look up one of the 16 standard colors.
///
/// Out-of-range indices yield [`Color::Default`].
pub fn ansi16(index: i64) -> Color {
    usize::try_from(index)
        .ok()
        .and_then(|i| ANSI_16.get(i))
        .map_or(Color::Default, |rgb| Color::Rgb(*rgb))
}

/// Look up a color in the 256-color space.
///
/// 0-15 are [`ANSI_16`], 16-231 a 6x6x6 cube with steps of 51, and 232-255
/// a grayscale ramp starting at 8 in steps of 10. Anything else is
/// [`Color::Default`].
pub fn ansi256(index: i64) -> Color {
    let Ok(code) = u8::try_from(index) else {
        return Color::Default;
    };
    match code {
        0..=15 => ansi16(index),
        16..=231 => {
            let i = code - 16;
            Color::rgb((i / 36) * 51, ((i % 36) / 6) * 51, (i % 6) * 51)
        }
        232..=255 => {
            let gray = (code - 232) * 10 + 8;
            Color::rgb(gray, gray, gray)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ansi16_table() {
        assert_eq!(ansi16(1), Color::rgb(128, 0, 0));
        assert_eq!(ansi16(7), Color::rgb(192, 192, 192));
        assert_eq!(ansi16(8), Color::rgb(128, 128, 128));
        assert_eq!(ansi16(15), Color::rgb(255, 255, 255));
        assert_eq!(ansi16(16), Color::Default);
        assert_eq!(ansi16(-1), Color::Default);
    }

    #[test]
    fn test_ansi256_cube() {
        assert_eq!(ansi256(16), Color::rgb(0, 0, 0));
        assert_eq!(ansi256(196), Color::rgb(255, 0, 0));
        assert_eq!(ansi256(21), Color::rgb(0, 0, 255));
        assert_eq!(ansi256(231), Color::rgb(255, 255, 255));
    }

    #[test]
    fn test_ansi256_grayscale() {
        assert_eq!(ansi256(232), Color::rgb(8, 8, 8));
        assert_eq!(ansi256(255), Color::rgb(238, 238, 238));
    }

    #[test]
    fn test_ansi256_out_of_range() {
        assert_eq!(ansi256(256), Color::Default);
        assert_eq!(ansi256(-3), Color::Default);
        assert_eq!(ansi256(3), ansi16(3));
    }
}

//! A 4x6 pixel hex-digit font for placeholder glyphs.
//!
//! A placeholder is a 3x4 grid of digit boxes (12x24 pixels) filled
//! column-major with the character's codepoint in hex.

use crate::grid::Rgb;

/// Width of one digit box in pixels.
pub const DIGIT_WIDTH: usize = 4;
/// Height of one digit box in pixels. The last row is blank.
pub const DIGIT_HEIGHT: usize = 6;
/// Digit boxes per placeholder row.
pub const BOX_COLUMNS: usize = 3;
/// Digit boxes per placeholder column.
pub const BOX_ROWS: usize = 4;

// Five rows per digit, bit 3 is the leftmost pixel. Index 16 is the
// filler block for anything that is not a hex digit.
const DIGITS: [[u8; 5]; 17] = [
    [0b0100, 0b1010, 0b1010, 0b1010, 0b0100],
    [0b0010, 0b0110, 0b1010, 0b0010, 0b0010],
    [0b1100, 0b0010, 0b0010, 0b0100, 0b1110],
    [0b1100, 0b0010, 0b0100, 0b0010, 0b1100],
    [0b0100, 0b1000, 0b1110, 0b0100, 0b0100],
    [0b1110, 0b1000, 0b1100, 0b0010, 0b1100],
    [0b0110, 0b1000, 0b1100, 0b1010, 0b0100],
    [0b1110, 0b0010, 0b0100, 0b0100, 0b0100],
    [0b0100, 0b1010, 0b0100, 0b1010, 0b0100],
    [0b0100, 0b1010, 0b0110, 0b0010, 0b1100],
    [0b0100, 0b1010, 0b1010, 0b1110, 0b1010],
    [0b1100, 0b1010, 0b1100, 0b1010, 0b1100],
    [0b0100, 0b1010, 0b1000, 0b1010, 0b0100],
    [0b1100, 0b1010, 0b1010, 0b1010, 0b1100],
    [0b1110, 0b1000, 0b1110, 0b1000, 0b1110],
    [0b1110, 0b1000, 0b1110, 0b1000, 0b1000],
    [0b1110, 0b1110, 0b1110, 0b1110, 0b1110],
];

/// Whether pixel `(x, y)` of `digit`'s box is lit.
pub fn lit(digit: char, x: usize, y: usize) -> bool {
    if x >= DIGIT_WIDTH || y >= DIGIT_HEIGHT - 1 {
        return false;
    }
    let index = digit.to_digit(16).map_or(16, |d| d as usize);
    DIGITS[index][y] & (0b1000 >> x) != 0
}

/// Placeholder text for a character: its codepoint as at least four
/// uppercase hex digits.
pub fn label(ch: char) -> String {
    format!("{:04X}", u32::from(ch))
}

/// Render `text` as a placeholder texture for a cell of the given size.
///
/// The caller guarantees the cell holds the full box grid. Characters
/// beyond the twelfth are not drawn.
pub fn render(text: &str, cell_width: usize, cell_height: usize) -> Vec<Rgb> {
    let mut texels = vec![Rgb::BLACK; cell_width * cell_height];
    let mut digits = text.chars();

    for xbox in 0..BOX_COLUMNS {
        for ybox in 0..BOX_ROWS {
            let Some(digit) = digits.next() else {
                return texels;
            };
            for y in 0..DIGIT_HEIGHT {
                for x in 0..DIGIT_WIDTH {
                    if lit(digit, x, y) {
                        let pos = ybox * cell_width * DIGIT_HEIGHT
                            + xbox * DIGIT_WIDTH
                            + y * cell_width
                            + x;
                        texels[pos] = Rgb::WHITE;
                    }
                }
            }
        }
    }
    texels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_shapes() {
        // Top row of '0' is " #  ".
        assert!(!lit('0', 0, 0));
        assert!(lit('0', 1, 0));
        assert!(lit('a', 0, 3) && lit('A', 0, 3));
        // Bottom row is always blank.
        assert!(!lit('8', 1, 5));
        assert!(!lit('8', 4, 0));
        assert!(lit('?', 0, 0));
    }

    #[test]
    fn labels_are_padded_hex() {
        assert_eq!(label('A'), "0041");
        assert_eq!(label('\u{e9}'), "00E9");
        assert_eq!(label('\u{1f600}'), "1F600");
    }

    #[test]
    fn digits_fill_columns_first() {
        let (w, h) = (12, 24);
        let texels = render("00008", w, h);
        // Fifth digit starts the second column of boxes at (4, 0).
        let lit_at = |x: usize, y: usize| texels[y * w + x] == Rgb::WHITE;
        assert!(lit_at(5, 0));
        // First box of the first column: '0' at (1, 0).
        assert!(lit_at(1, 0));
        // Second box of the first column starts at row 6.
        assert!(lit_at(1, 6));
        // Third column is empty.
        assert!((0..h).all(|y| (8..12).all(|x| !lit_at(x, y))));
    }
}

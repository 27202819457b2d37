//! Glyph atlas: maps characters to fixed-size RGB textures.
//!
//! An atlas is loaded from an already-decoded image plus a descriptor that
//! labels the image's grid of cells. Labels are separated by tabs within a
//! row and rows by newlines, so the grid shape (and with it the cell size)
//! comes from the descriptor. Several images can be merged into one atlas
//! as long as they share the cell size.
//!
//! Characters with no glyph get a synthesized placeholder showing their
//! codepoint in hex when the cell is big enough to hold one.
//!
//! ```
//! use bubblegum::atlas::{AtlasImage, GlyphAtlas};
//! use bubblegum::Rgb;
//!
//! let image = AtlasImage::new(2, 1, vec![Rgb::WHITE, Rgb::BLACK]).unwrap();
//! let mut atlas = GlyphAtlas::new();
//! atlas.load(&image, "a\tb", "").unwrap();
//! assert_eq!(atlas.cell_size(), Some((1, 1)));
//! assert!(atlas.glyph('a').is_some());
//! assert!(atlas.glyph('z').is_none());
//! ```

pub mod hexfont;

use std::collections::HashMap;

use crate::error::AtlasError;
use crate::grid::Rgb;

/// Smallest cell, in pixels, that can hold a hex placeholder.
pub const PLACEHOLDER_CELL: (usize, usize) = (
    hexfont::DIGIT_WIDTH * hexfont::BOX_COLUMNS,
    hexfont::DIGIT_HEIGHT * hexfont::BOX_ROWS,
);

/// A decoded RGB image, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtlasImage {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
}

impl AtlasImage {
    /// Wrap decoded pixels. `pixels.len()` must equal `width * height`.
    pub fn new(width: usize, height: usize, pixels: Vec<Rgb>) -> Result<Self, AtlasError> {
        let expected = width * height;
        if pixels.len() != expected {
            return Err(AtlasError::PixelCount {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Width in pixels.
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Pixel at `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y * self.width + x).copied()
    }
}

/// One cell's texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glyph {
    width: usize,
    height: usize,
    texels: Vec<Rgb>,
}

impl Glyph {
    /// Width in pixels.
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Raw texels, row-major.
    pub fn texels(&self) -> &[Rgb] {
        &self.texels
    }

    /// Texel at `(x, y)`.
    pub fn texel(&self, x: usize, y: usize) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.texels.get(y * self.width + x).copied()
    }

    /// Composite with two colors.
    ///
    /// Each channel is raised to at least the background and then capped at
    /// the foreground, so a white-on-black glyph takes on exactly `fg` and
    /// `bg`. Where the two conflict the foreground wins.
    pub fn tint(&self, fg: Rgb, bg: Rgb) -> Vec<Rgb> {
        let channel = |t: u8, lo: u8, hi: u8| t.max(lo).min(hi);
        self.texels
            .iter()
            .map(|t| {
                Rgb::new(
                    channel(t.r, bg.r, fg.r),
                    channel(t.g, bg.g, fg.g),
                    channel(t.b, bg.b, fg.b),
                )
            })
            .collect()
    }
}

/// Character-to-texture mapping.
#[derive(Debug, Clone, Default)]
pub struct GlyphAtlas {
    cell: Option<(usize, usize)>,
    glyphs: HashMap<String, Glyph>,
}

impl GlyphAtlas {
    /// An empty atlas with no cell size yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cell size in pixels, fixed by the first successful load.
    pub const fn cell_size(&self) -> Option<(usize, usize)> {
        self.cell
    }

    /// Number of mapped labels, placeholders included.
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Whether nothing is mapped.
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Load `image`, labelling its cells from `descriptor`.
    ///
    /// `trailer` is appended to every label, which lets one image serve as
    /// an alias set (for example a bold variant). Labels already present
    /// are replaced. Returns the number of labels mapped.
    pub fn load(
        &mut self,
        image: &AtlasImage,
        descriptor: &str,
        trailer: &str,
    ) -> Result<usize, AtlasError> {
        let descriptor = descriptor.replace("\r\n", "\n");
        if descriptor.trim().is_empty() {
            return Err(AtlasError::EmptyDescriptor);
        }
        let rows: Vec<&str> = descriptor.split('\n').collect();
        let columns = rows[0].split('\t').count();

        let geometry = AtlasError::Geometry {
            width: image.width,
            height: image.height,
            columns,
            rows: rows.len(),
        };
        if image.width % columns != 0 || image.height % rows.len() != 0 {
            return Err(geometry);
        }
        let cell = (image.width / columns, image.height / rows.len());
        if cell.0 == 0 || cell.1 == 0 {
            return Err(geometry);
        }
        if let Some(expected) = self.cell {
            if expected != cell {
                return Err(AtlasError::CellSize {
                    expected,
                    found: cell,
                });
            }
        }
        self.cell = Some(cell);

        let mut mapped = 0;
        for (cy, row) in rows.iter().enumerate() {
            for (cx, label) in row.trim_matches('\t').split('\t').enumerate() {
                if label.is_empty() || cx >= columns {
                    continue;
                }
                let glyph = cut(image, cell, cx, cy);
                self.glyphs.insert(format!("{label}{trailer}"), glyph);
                mapped += 1;
            }
        }
        tracing::debug!(mapped, cell_width = cell.0, cell_height = cell.1, "atlas loaded");
        Ok(mapped)
    }

    /// Glyph for an exact label, without placeholder synthesis.
    pub fn lookup(&self, label: &str) -> Option<&Glyph> {
        self.glyphs.get(label)
    }

    /// Glyph for `ch`.
    ///
    /// Unmapped characters get a hex placeholder when the cell is at least
    /// [`PLACEHOLDER_CELL`]; it is remembered for later calls. Otherwise
    /// `None`, which renders as blank.
    pub fn glyph(&mut self, ch: char) -> Option<&Glyph> {
        let key = ch.to_string();
        if !self.glyphs.contains_key(&key) {
            let (width, height) = self.cell?;
            if width < PLACEHOLDER_CELL.0 || height < PLACEHOLDER_CELL.1 {
                return None;
            }
            let texels = hexfont::render(&hexfont::label(ch), width, height);
            self.glyphs.insert(
                key.clone(),
                Glyph {
                    width,
                    height,
                    texels,
                },
            );
        }
        self.glyphs.get(&key)
    }
}

fn cut(image: &AtlasImage, (width, height): (usize, usize), cx: usize, cy: usize) -> Glyph {
    let mut texels = Vec::with_capacity(width * height);
    for y in 0..height {
        let start = (cy * height + y) * image.width + cx * width;
        texels.extend_from_slice(&image.pixels[start..start + width]);
    }
    Glyph {
        width,
        height,
        texels,
    }
}

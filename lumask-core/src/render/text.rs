//! Text rendering

use super::font::{self, GLYPH_GAP, GLYPH_HEIGHT, GLYPH_WIDTH};
use super::RenderError;
use crate::matrix::{Pixel, PixelMatrix, DISPLAY_ROWS, MAX_COLUMNS};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Largest integer scale whose glyphs still fit the panel
pub const MAX_SCALE: u8 = (DISPLAY_ROWS / GLYPH_HEIGHT) as u8;

/// How text is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TextStyle {
    /// Integer glyph scale (1 = 5×7, 2 = 10×14)
    pub scale: u8,
    /// Thicken strokes by one column
    pub bold: bool,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            scale: MAX_SCALE,
            bold: false,
        }
    }
}

impl TextStyle {
    /// Check the style can be drawn on the panel
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.scale == 0 || self.scale > MAX_SCALE {
            return Err(RenderError::InvalidStyle);
        }
        Ok(())
    }

    /// Columns from the start of one glyph to the start of the next
    ///
    /// The gap stays one column at every scale.
    pub fn advance(&self) -> usize {
        self.glyph_width() + GLYPH_GAP
    }

    /// Columns one drawn glyph covers
    pub fn glyph_width(&self) -> usize {
        GLYPH_WIDTH * self.scale as usize + self.bold as usize
    }

    /// Natural width of `text` in this style, without trailing gap
    pub fn measure(&self, text: &str) -> usize {
        match text.chars().count() {
            0 => 0,
            n => n * self.advance() - GLYPH_GAP,
        }
    }
}

/// Render a line of text, vertically centred
pub(crate) fn render_text(
    text: &str,
    style: TextStyle,
    target_width: Option<usize>,
) -> Result<PixelMatrix, RenderError> {
    style.validate()?;

    let width = style.measure(text);
    if width > MAX_COLUMNS {
        return Err(RenderError::TooWide {
            columns: width,
            max: MAX_COLUMNS,
        });
    }

    let mut matrix = PixelMatrix::blank(width)?;
    let scale = style.scale as usize;
    let top = (DISPLAY_ROWS - GLYPH_HEIGHT * scale) / 2;

    for (index, ch) in text.chars().enumerate() {
        let glyph = font::glyph(ch).unwrap_or(font::BLANK);
        let left = index * style.advance();

        for gy in 0..GLYPH_HEIGHT {
            for gx in 0..GLYPH_WIDTH {
                if !font::is_set(&glyph, gx, gy) {
                    continue;
                }
                for sy in 0..scale {
                    for sx in 0..scale {
                        let x = left + gx * scale + sx;
                        let y = top + gy * scale + sy;
                        matrix.set(x, y, Pixel::On);
                        if style.bold {
                            matrix.set(x + 1, y, Pixel::On);
                        }
                    }
                }
            }
        }
    }

    if let Some(target) = target_width {
        if target < width {
            return Err(RenderError::TooNarrow {
                columns: width,
                target,
            });
        }
        matrix.pad_to(target)?;
    }

    Ok(matrix)
}

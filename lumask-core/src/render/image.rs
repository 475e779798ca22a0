//! Image rendering
//!
//! Images are resampled with nearest-neighbour to the panel height (and to
//! a target width when one is given). Greyscale pixels light up above a
//! fixed threshold; colour pixels keep their colour unless they are black.

use super::RenderError;
use crate::matrix::{Column, Pixel, PixelMatrix, DISPLAY_ROWS, MAX_COLUMNS};
use crate::Rgb;

/// Luma values above this are lit
pub const LUMA_THRESHOLD: u8 = 128;

/// Row-major pixel data of a source image
#[derive(Debug, Clone, Copy)]
pub enum ImagePixels<'a> {
    /// 8-bit greyscale
    Luma(&'a [u8]),
    /// 24-bit colour
    Rgb(&'a [Rgb]),
}

impl ImagePixels<'_> {
    fn len(&self) -> usize {
        match self {
            ImagePixels::Luma(data) => data.len(),
            ImagePixels::Rgb(data) => data.len(),
        }
    }

    fn pixel(&self, index: usize) -> Pixel {
        match self {
            ImagePixels::Luma(data) => match data.get(index) {
                Some(&luma) if luma > LUMA_THRESHOLD => Pixel::On,
                _ => Pixel::Off,
            },
            ImagePixels::Rgb(data) => match data.get(index) {
                Some(color) if !color.is_black() => Pixel::Rgb(*color),
                _ => Pixel::Off,
            },
        }
    }
}

/// A borrowed raster image
#[derive(Debug, Clone, Copy)]
pub struct ImageSource<'a> {
    width: usize,
    height: usize,
    pixels: ImagePixels<'a>,
}

impl<'a> ImageSource<'a> {
    /// Greyscale image, one byte per pixel
    pub fn luma(width: usize, height: usize, data: &'a [u8]) -> Self {
        Self {
            width,
            height,
            pixels: ImagePixels::Luma(data),
        }
    }

    /// Colour image, one [`Rgb`] per pixel
    pub fn rgb(width: usize, height: usize, data: &'a [Rgb]) -> Self {
        Self {
            width,
            height,
            pixels: ImagePixels::Rgb(data),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Check dimensions against the pixel data
    pub fn validate(&self) -> Result<(), RenderError> {
        let expected = self.width.checked_mul(self.height);
        if self.width == 0 || self.height == 0 || expected != Some(self.pixels.len()) {
            return Err(RenderError::InvalidImage);
        }
        Ok(())
    }

    fn pixel(&self, x: usize, y: usize) -> Pixel {
        self.pixels.pixel(y * self.width + x)
    }
}

pub(crate) fn render_image(
    source: &ImageSource<'_>,
    target_width: Option<usize>,
) -> Result<PixelMatrix, RenderError> {
    source.validate()?;

    let width = target_width.unwrap_or(source.width);
    if width == 0 {
        return Err(RenderError::InvalidImage);
    }
    if width > MAX_COLUMNS {
        return Err(RenderError::TooWide {
            columns: width,
            max: MAX_COLUMNS,
        });
    }

    let mut matrix = PixelMatrix::new();
    for x in 0..width {
        let sx = x * source.width / width;
        let mut column: Column = [Pixel::Off; DISPLAY_ROWS];
        for (y, cell) in column.iter_mut().enumerate() {
            let sy = y * source.height / DISPLAY_ROWS;
            *cell = source.pixel(sx, sy);
        }
        matrix.push_column(column)?;
    }

    Ok(matrix)
}

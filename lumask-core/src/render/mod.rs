//! Bitmap renderer
//!
//! Turns text or an image into a [`PixelMatrix`] exactly [`DISPLAY_ROWS`]
//! high. Rendering is pure: it never touches the link and never mutates
//! shared state, so a failed render leaves everything as it was.

pub mod font;
pub mod image;
pub mod text;

use core::fmt;

pub use image::{ImagePixels, ImageSource};
pub use text::TextStyle;

use crate::matrix::{PixelMatrix, DISPLAY_ROWS};

/// Rendering errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RenderError {
    /// Content needs more columns than the mask accepts
    TooWide {
        /// Columns the content needs
        columns: usize,
        /// Upper bound
        max: usize,
    },
    /// Requested target width is narrower than the content
    TooNarrow {
        /// Columns the content needs
        columns: usize,
        /// Requested width
        target: usize,
    },
    /// Image dimensions do not match its pixel data, or are zero
    InvalidImage,
    /// Text style out of range
    InvalidStyle,
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::TooWide { columns, max } => {
                write!(f, "content needs {} columns, limit is {}", columns, max)
            }
            RenderError::TooNarrow { columns, target } => {
                write!(f, "content needs {} columns, target is {}", columns, target)
            }
            RenderError::InvalidImage => f.write_str("invalid image dimensions"),
            RenderError::InvalidStyle => f.write_str("invalid text style"),
        }
    }
}

/// Something the mask can show
#[derive(Debug, Clone, Copy)]
pub enum Content<'a> {
    /// A line of text in the built-in font
    Text(&'a str, TextStyle),
    /// A raster image, scaled to the panel height
    Image(ImageSource<'a>),
}

/// Render content into a matrix of height [`DISPLAY_ROWS`]
///
/// `target_width` pads text with unlit columns, or resamples images
/// horizontally. Without it, the natural width of the content is kept.
pub fn render(
    content: Content<'_>,
    target_width: Option<usize>,
) -> Result<PixelMatrix, RenderError> {
    let matrix = match content {
        Content::Text(text, style) => text::render_text(text, style, target_width)?,
        Content::Image(source) => image::render_image(&source, target_width)?,
    };
    debug_assert_eq!(matrix.height(), DISPLAY_ROWS);
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{Pixel, MAX_COLUMNS};
    use proptest::prelude::*;

    #[test]
    fn test_render_text_content() {
        let matrix = render(Content::Text("HI", TextStyle::default()), None).unwrap();
        assert_eq!(matrix.height(), DISPLAY_ROWS);
        assert!(matrix.lit_count() > 0);
    }

    #[test]
    fn test_render_image_content() {
        let luma = [255u8; 4 * 8];
        let source = ImageSource::luma(4, 8, &luma);
        let matrix = render(Content::Image(source), None).unwrap();

        assert_eq!(matrix.width(), 4);
        assert_eq!(matrix.lit_count(), 4 * DISPLAY_ROWS);
        assert_eq!(matrix.get(0, 0), Pixel::On);
    }

    #[test]
    fn test_render_too_long_text() {
        let long = "W".repeat(40);
        let result = render(Content::Text(&long, TextStyle::default()), None);
        assert!(matches!(result, Err(RenderError::TooWide { max: MAX_COLUMNS, .. })));
    }

    proptest! {
        #[test]
        fn prop_text_dimensions(text in "[ -~]{0,12}", scale in 1u8..=2, bold: bool) {
            let style = TextStyle { scale, bold };
            match render(Content::Text(&text, style), None) {
                Ok(matrix) => {
                    prop_assert_eq!(matrix.height(), DISPLAY_ROWS);
                    prop_assert_eq!(matrix.width(), style.measure(&text));
                }
                Err(e) => prop_assert!(matches!(e, RenderError::TooWide { .. }), "expected TooWide"),
            }
        }
    }
}

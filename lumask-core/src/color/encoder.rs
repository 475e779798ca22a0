//! Matrix to colour-buffer encoding

use heapless::Vec;

use super::decoration;
use super::scheme::ColorScheme;
use crate::matrix::{Pixel, PixelMatrix, DISPLAY_ROWS, MAX_COLUMNS};
use crate::Rgb;

/// Largest colour buffer: one RGB triple per pixel of the widest matrix
pub const COLOR_BUFFER_CAPACITY: usize = 3 * DISPLAY_ROWS * MAX_COLUMNS;

/// Encoded RGB triples in column-major scan order
///
/// Column 0 rows 0..16 first, then column 1, and so on. Produced only by
/// [`encode`], so the length is always `3 * columns * DISPLAY_ROWS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorBuffer {
    bytes: Vec<u8, COLOR_BUFFER_CAPACITY>,
    columns: usize,
}

impl ColorBuffer {
    /// Raw bytes as uploaded
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Columns encoded
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Colour of the pixel at (x, y)
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        if x >= self.columns || y >= DISPLAY_ROWS {
            return None;
        }
        let at = 3 * (x * DISPLAY_ROWS + y);
        Some(Rgb::new(self.bytes[at], self.bytes[at + 1], self.bytes[at + 2]))
    }

    /// All pixel colours in scan order
    pub fn triples(&self) -> impl Iterator<Item = Rgb> + '_ {
        self.bytes
            .chunks_exact(3)
            .map(|c| Rgb::new(c[0], c[1], c[2]))
    }
}

/// Colour of one pixel under `scheme`
pub fn pixel_color(pixel: Pixel, x: usize, y: usize, width: usize, scheme: &ColorScheme) -> Rgb {
    let decorated = decoration::is_lit(scheme.style, x, y, width);

    if !scheme.separated {
        return if decorated || pixel.is_on() {
            scheme.foreground
        } else {
            scheme.background
        };
    }

    if decorated {
        return scheme.decoration;
    }
    match pixel {
        Pixel::Off => scheme.background,
        Pixel::On => scheme.foreground,
        Pixel::Rgb(color) => color,
    }
}

/// Encode a matrix into a colour buffer
///
/// Pure: the same matrix and scheme always give the same bytes, so switching
/// between separated and unified mode is just a re-encode.
pub fn encode(matrix: &PixelMatrix, scheme: &ColorScheme) -> ColorBuffer {
    let width = matrix.width();
    let mut bytes = Vec::new();

    for (x, column) in matrix.columns().enumerate() {
        for (y, pixel) in column.iter().enumerate() {
            let color = pixel_color(*pixel, x, y, width, scheme);
            // Capacity covers MAX_COLUMNS, which bounds every matrix
            let pushed = bytes.extend_from_slice(&color.to_bytes());
            debug_assert!(pushed.is_ok());
        }
    }

    ColorBuffer {
        bytes,
        columns: width,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::DecorationStyle;
    use proptest::prelude::*;

    const ORANGE: Rgb = Rgb::new(255, 128, 0);
    const TEAL: Rgb = Rgb::new(0, 128, 128);

    fn scheme(style: DecorationStyle) -> ColorScheme {
        ColorScheme {
            foreground: ORANGE,
            background: Rgb::BLACK,
            decoration: TEAL,
            style,
            separated: true,
        }
    }

    fn sample() -> PixelMatrix {
        let mut matrix = PixelMatrix::blank(6).unwrap();
        matrix.set(0, 7, Pixel::On);
        matrix.set(1, 0, Pixel::On);
        matrix.set(2, 8, Pixel::Rgb(Rgb::BLUE));
        matrix
    }

    #[test]
    fn test_length_is_three_per_pixel() {
        let buffer = encode(&sample(), &scheme(DecorationStyle::Lines));
        assert_eq!(buffer.len(), 3 * 6 * DISPLAY_ROWS);
        assert_eq!(buffer.columns(), 6);
    }

    #[test]
    fn test_column_major_order() {
        let buffer = encode(&sample(), &scheme(DecorationStyle::None));
        // (0, 7) is the 8th triple
        assert_eq!(&buffer.as_bytes()[3 * 7..3 * 8], &ORANGE.to_bytes());
        assert_eq!(buffer.pixel(0, 7), Some(ORANGE));
        assert_eq!(buffer.pixel(0, 6), Some(Rgb::BLACK));
        assert_eq!(buffer.pixel(6, 0), None);
    }

    #[test]
    fn test_separated_mode() {
        let buffer = encode(&sample(), &scheme(DecorationStyle::Lines));

        // Decoration wins over a lit pixel on a border row
        assert_eq!(buffer.pixel(1, 0), Some(TEAL));
        assert_eq!(buffer.pixel(5, 15), Some(TEAL));
        assert_eq!(buffer.pixel(0, 7), Some(ORANGE));
        assert_eq!(buffer.pixel(2, 8), Some(Rgb::BLUE));
        assert_eq!(buffer.pixel(3, 8), Some(Rgb::BLACK));
    }

    #[test]
    fn test_unified_mode() {
        let buffer = encode(&sample(), &scheme(DecorationStyle::Lines).unified());

        assert_eq!(buffer.pixel(1, 0), Some(ORANGE));
        assert_eq!(buffer.pixel(5, 15), Some(ORANGE));
        assert_eq!(buffer.pixel(2, 8), Some(ORANGE));
        assert_eq!(buffer.pixel(3, 8), Some(Rgb::BLACK));
        assert!(buffer.triples().all(|c| c != TEAL));
    }

    #[test]
    fn test_no_decoration_colour_without_decoration() {
        let matrix = PixelMatrix::filled(10, Pixel::On).unwrap();
        let buffer = encode(&matrix, &scheme(DecorationStyle::None));
        assert!(buffer.triples().all(|c| c == ORANGE));
    }

    #[test]
    fn test_unified_lines_over_lit_matrix() {
        let matrix = PixelMatrix::filled(12, Pixel::On).unwrap();
        let unified = ColorScheme::default().with_style(DecorationStyle::Lines).unified();

        let buffer = encode(&matrix, &unified);

        assert_eq!(buffer.len(), 3 * 12 * DISPLAY_ROWS);
        assert!(buffer.triples().all(|c| c == unified.foreground));
    }

    #[test]
    fn test_mode_switch_is_idempotent() {
        let matrix = sample();
        let separated = scheme(DecorationStyle::Waves);

        let first = encode(&matrix, &separated);
        let _ = encode(&matrix, &separated.unified());
        let again = encode(&matrix, &separated);
        assert_eq!(first, again);
    }

    #[test]
    fn test_empty_matrix() {
        let buffer = encode(&PixelMatrix::new(), &ColorScheme::default());
        assert!(buffer.is_empty());
    }

    proptest! {
        #[test]
        fn prop_encode_length(width in 0usize..=MAX_COLUMNS, style in 0usize..5, separated: bool) {
            let matrix = PixelMatrix::blank(width).unwrap();
            let scheme = ColorScheme {
                style: DecorationStyle::ALL[style],
                separated,
                ..ColorScheme::default()
            };
            let buffer = encode(&matrix, &scheme);
            prop_assert_eq!(buffer.len(), 3 * width * DISPLAY_ROWS);
        }
    }
}

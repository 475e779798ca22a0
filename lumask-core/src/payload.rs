//! Upload payload layouts
//!
//! The mask accepts two layouts behind the same `DATS`/`DATA`/`DATCP`
//! exchange:
//!
//! - **Colour buffer**: one RGB triple per pixel ([`ColorBuffer`]).
//! - **Column bitmap**: two bitmap bytes per column followed by one RGB
//!   triple per column. This is what older firmware revisions display.
//!
//! ```text
//! column bitmap, per column:
//! byte 0: row 0 (0x80) .. row 7 (0x01)
//! byte 1: row 8 (0x80) .. row 15 (0x01)
//! ```

use heapless::Vec;

use crate::color::{decoration, ColorBuffer, ColorScheme};
use crate::matrix::{Column, Pixel, PixelMatrix, DISPLAY_ROWS, MAX_COLUMNS};
use crate::Rgb;

/// Bitmap bytes per column
pub const BITMAP_BYTES_PER_COLUMN: usize = DISPLAY_ROWS / 8;

/// Column bitmap with per-column colours
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    bitmap: Vec<u8, { BITMAP_BYTES_PER_COLUMN * MAX_COLUMNS }>,
    colors: Vec<u8, { 3 * MAX_COLUMNS }>,
}

impl ImagePayload {
    /// Pack a matrix into the column bitmap layout
    ///
    /// Decoration pixels are folded into the bitmap. Each column takes the
    /// colour of its first RGB pixel, or the scheme's foreground.
    pub fn from_matrix(matrix: &PixelMatrix, scheme: &ColorScheme) -> Self {
        let width = matrix.width();
        let mut bitmap = Vec::new();
        let mut colors = Vec::new();

        for (x, column) in matrix.columns().enumerate() {
            let packed = pack_column(column, |y| {
                decoration::is_lit(scheme.style, x, y, width)
            });
            // Capacities are sized for MAX_COLUMNS
            let color = column_color(column, scheme.foreground).to_bytes();
            let pushed = bitmap
                .extend_from_slice(&packed)
                .and_then(|()| colors.extend_from_slice(&color));
            debug_assert!(pushed.is_ok());
        }

        Self { bitmap, colors }
    }

    /// Bitmap section
    pub fn bitmap(&self) -> &[u8] {
        &self.bitmap
    }

    /// Per-column colour section
    pub fn colors(&self) -> &[u8] {
        &self.colors
    }

    /// Columns encoded
    pub fn columns(&self) -> usize {
        self.bitmap.len() / BITMAP_BYTES_PER_COLUMN
    }
}

/// Pack one column; `extra(row)` adds pixels on top of the matrix content
fn pack_column(column: &Column, extra: impl Fn(usize) -> bool) -> [u8; BITMAP_BYTES_PER_COLUMN] {
    let mut packed = [0u8; BITMAP_BYTES_PER_COLUMN];
    for (y, pixel) in column.iter().enumerate() {
        if pixel.is_on() || extra(y) {
            packed[y / 8] |= 0x80 >> (y % 8);
        }
    }
    packed
}

fn column_color(column: &Column, fallback: Rgb) -> Rgb {
    column
        .iter()
        .find_map(|pixel| match pixel {
            Pixel::Rgb(color) => Some(*color),
            _ => None,
        })
        .unwrap_or(fallback)
}

/// Payload of one upload session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadPayload {
    /// Per-pixel colours
    Colors(ColorBuffer),
    /// Column bitmap plus per-column colours
    Image(ImagePayload),
}

impl UploadPayload {
    /// Total bytes uploaded
    pub fn len(&self) -> usize {
        let (head, tail) = self.sections();
        head.len() + tail.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Length of the bitmap section announced in `DATS` (0 for colour buffers)
    pub fn bitmap_len(&self) -> usize {
        match self {
            UploadPayload::Colors(_) => 0,
            UploadPayload::Image(image) => image.bitmap().len(),
        }
    }

    /// Columns the payload covers
    pub fn columns(&self) -> usize {
        match self {
            UploadPayload::Colors(buffer) => buffer.columns(),
            UploadPayload::Image(image) => image.columns(),
        }
    }

    /// Copy payload bytes starting at `offset` into `out`
    ///
    /// Returns the number of bytes copied, which is less than `out.len()`
    /// only at the end of the payload.
    pub fn read_at(&self, offset: usize, out: &mut [u8]) -> usize {
        let (head, tail) = self.sections();
        let mut copied = 0;

        if offset < head.len() {
            let take = out.len().min(head.len() - offset);
            out[..take].copy_from_slice(&head[offset..offset + take]);
            copied = take;
        }

        let tail_offset = (offset + copied).saturating_sub(head.len());
        if copied < out.len() && tail_offset < tail.len() {
            let take = (out.len() - copied).min(tail.len() - tail_offset);
            out[copied..copied + take].copy_from_slice(&tail[tail_offset..tail_offset + take]);
            copied += take;
        }

        copied
    }

    fn sections(&self) -> (&[u8], &[u8]) {
        match self {
            UploadPayload::Colors(buffer) => (buffer.as_bytes(), &[][..]),
            UploadPayload::Image(image) => (image.bitmap(), image.colors()),
        }
    }
}

impl From<ColorBuffer> for UploadPayload {
    fn from(buffer: ColorBuffer) -> Self {
        UploadPayload::Colors(buffer)
    }
}

impl From<ImagePayload> for UploadPayload {
    fn from(image: ImagePayload) -> Self {
        UploadPayload::Image(image)
    }
}

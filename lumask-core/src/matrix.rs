//! Pixel matrix
//!
//! The renderer's output: a column-major grid with a fixed height of
//! [`DISPLAY_ROWS`] and a width bounded by [`MAX_COLUMNS`]. Columns are the
//! unit the mask scrolls by, so the matrix is stored as a list of columns.

use heapless::Vec;

use crate::render::RenderError;
use crate::Rgb;

/// Rows on the mask's LED panel
pub const DISPLAY_ROWS: usize = 16;

/// Widest content the mask accepts in one upload
pub const MAX_COLUMNS: usize = 128;

/// One cell of the matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pixel {
    /// Unlit, takes the background colour
    #[default]
    Off,
    /// Lit, takes the foreground colour
    On,
    /// Lit with its own colour (image sources)
    Rgb(Rgb),
}

impl Pixel {
    /// Returns true for any lit pixel
    pub fn is_on(self) -> bool {
        !matches!(self, Pixel::Off)
    }
}

/// One column, top row first
pub type Column = [Pixel; DISPLAY_ROWS];

/// Rendered content, immutable once handed to the encoder
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PixelMatrix {
    columns: Vec<Column, MAX_COLUMNS>,
}

impl PixelMatrix {
    /// Create an empty (zero-width) matrix
    pub const fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    /// Create a matrix of `width` unlit columns
    pub fn blank(width: usize) -> Result<Self, RenderError> {
        Self::filled(width, Pixel::Off)
    }

    /// Create a matrix with every pixel set to `pixel`
    pub fn filled(width: usize, pixel: Pixel) -> Result<Self, RenderError> {
        let mut matrix = Self::new();
        for _ in 0..width {
            matrix.push_column([pixel; DISPLAY_ROWS])?;
        }
        Ok(matrix)
    }

    /// Append a column on the right
    pub fn push_column(&mut self, column: Column) -> Result<(), RenderError> {
        self.columns.push(column).map_err(|_| RenderError::TooWide {
            columns: self.columns.len() + 1,
            max: MAX_COLUMNS,
        })
    }

    /// Pad with unlit columns up to `width`
    pub fn pad_to(&mut self, width: usize) -> Result<(), RenderError> {
        if width > MAX_COLUMNS {
            return Err(RenderError::TooWide {
                columns: width,
                max: MAX_COLUMNS,
            });
        }
        while self.columns.len() < width {
            self.push_column([Pixel::Off; DISPLAY_ROWS])?;
        }
        Ok(())
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows (always [`DISPLAY_ROWS`])
    pub const fn height(&self) -> usize {
        DISPLAY_ROWS
    }

    /// Returns true if the matrix has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Pixel at (x, y), `Off` outside the matrix
    pub fn get(&self, x: usize, y: usize) -> Pixel {
        self.columns
            .get(x)
            .and_then(|column| column.get(y))
            .copied()
            .unwrap_or(Pixel::Off)
    }

    /// Set the pixel at (x, y); out-of-range writes are ignored
    pub fn set(&mut self, x: usize, y: usize, pixel: Pixel) -> bool {
        match self.columns.get_mut(x).and_then(|column| column.get_mut(y)) {
            Some(cell) => {
                *cell = pixel;
                true
            }
            None => false,
        }
    }

    /// Column at `x`
    pub fn column(&self, x: usize) -> Option<&Column> {
        self.columns.get(x)
    }

    /// Columns left to right
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    /// Count of lit pixels
    pub fn lit_count(&self) -> usize {
        self.columns
            .iter()
            .flat_map(|column| column.iter())
            .filter(|pixel| pixel.is_on())
            .count()
    }
}

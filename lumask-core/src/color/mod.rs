//! Colour encoder
//!
//! Maps a [`PixelMatrix`](crate::matrix::PixelMatrix) and a [`ColorScheme`]
//! to the RGB bytes the mask displays. Decoration geometry lives in
//! [`decoration`], one pure function per style.

pub mod decoration;
pub mod encoder;
pub mod scheme;

pub use encoder::{encode, pixel_color, ColorBuffer, COLOR_BUFFER_CAPACITY};
pub use scheme::{ColorScheme, DecorationStyle};

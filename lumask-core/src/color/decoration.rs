//! Decoration geometry
//!
//! Each style is a pure function of (column, row, width) deciding whether
//! the decoration lights that pixel. Styles are dispatched through a table
//! indexed by [`DecorationStyle`].

use super::scheme::DecorationStyle;
use crate::matrix::DISPLAY_ROWS;

type Geometry = fn(usize, usize, usize) -> bool;

/// Indexed by `DecorationStyle as usize`
const GEOMETRY: [Geometry; 5] = [none, lines, dots, blocks, waves];

/// Integer sine over 16 columns, amplitude 0..=2
const WAVE: [usize; 16] = [1, 1, 2, 2, 2, 2, 2, 1, 1, 1, 0, 0, 0, 0, 0, 1];

/// Check whether `style` lights the pixel at (column, row)
pub fn is_lit(style: DecorationStyle, column: usize, row: usize, width: usize) -> bool {
    if row >= DISPLAY_ROWS || column >= width {
        return false;
    }
    GEOMETRY[style as usize](column, row, width)
}

fn is_border_row(row: usize) -> bool {
    row <= 1 || row >= DISPLAY_ROWS - 2
}

fn none(_column: usize, _row: usize, _width: usize) -> bool {
    false
}

fn lines(_column: usize, row: usize, _width: usize) -> bool {
    is_border_row(row)
}

fn dots(column: usize, row: usize, _width: usize) -> bool {
    column % 3 == 0 && is_border_row(row)
}

fn blocks(column: usize, row: usize, _width: usize) -> bool {
    (column / 4) % 2 == 0 && is_border_row(row)
}

fn waves(column: usize, row: usize, _width: usize) -> bool {
    let offset = WAVE[column % WAVE.len()];
    row == offset || row == DISPLAY_ROWS - 1 - offset
}

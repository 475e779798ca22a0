//! Colour scheme types

use core::str::FromStr;

use crate::Rgb;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Ornamental pattern drawn along the top and bottom edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DecorationStyle {
    /// No decoration
    None,
    /// Solid double line at top and bottom
    #[default]
    Lines,
    /// Line segments every third column
    Dots,
    /// Alternating four-column blocks
    Blocks,
    /// Sine wave mirrored top and bottom
    Waves,
}

impl DecorationStyle {
    /// Every style, in table order
    pub const ALL: [DecorationStyle; 5] = [
        DecorationStyle::None,
        DecorationStyle::Lines,
        DecorationStyle::Dots,
        DecorationStyle::Blocks,
        DecorationStyle::Waves,
    ];

    /// Lowercase name as used in configuration files
    pub fn name(self) -> &'static str {
        match self {
            DecorationStyle::None => "none",
            DecorationStyle::Lines => "lines",
            DecorationStyle::Dots => "dots",
            DecorationStyle::Blocks => "blocks",
            DecorationStyle::Waves => "waves",
        }
    }
}

impl FromStr for DecorationStyle {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DecorationStyle::ALL
            .into_iter()
            .find(|style| style.name().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

/// Colours and decoration used when encoding a matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ColorScheme {
    /// Colour of lit text/image pixels
    pub foreground: Rgb,
    /// Colour of unlit pixels
    pub background: Rgb,
    /// Colour of decoration pixels (separated mode only)
    pub decoration: Rgb,
    /// Decoration pattern
    pub style: DecorationStyle,
    /// Keep decoration colour distinct from the foreground
    ///
    /// When false every lit pixel gets the foreground colour, which is what
    /// older firmware revisions expect.
    pub separated: bool,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            foreground: Rgb::WHITE,
            background: Rgb::BLACK,
            decoration: Rgb::WHITE,
            style: DecorationStyle::Lines,
            separated: true,
        }
    }
}

impl ColorScheme {
    /// Same scheme with a different decoration style
    pub fn with_style(self, style: DecorationStyle) -> Self {
        Self { style, ..self }
    }

    /// Same scheme in unified (single-colour) mode
    pub fn unified(self) -> Self {
        Self {
            separated: false,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_names_roundtrip() {
        for style in DecorationStyle::ALL {
            assert_eq!(style.name().parse::<DecorationStyle>(), Ok(style));
        }
        assert_eq!("WAVES".parse::<DecorationStyle>(), Ok(DecorationStyle::Waves));
        assert!("zigzag".parse::<DecorationStyle>().is_err());
    }

    #[test]
    fn test_default_scheme() {
        let scheme = ColorScheme::default();
        assert_eq!(scheme.foreground, Rgb::WHITE);
        assert_eq!(scheme.background, Rgb::BLACK);
        assert_eq!(scheme.style, DecorationStyle::Lines);
        assert!(scheme.separated);
        assert!(!scheme.unified().separated);
    }
}

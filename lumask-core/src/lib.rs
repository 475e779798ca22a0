//! Board-agnostic rendering and colour encoding for LED-matrix masks
//!
//! This crate turns content into the bytes a mask displays, without
//! touching any transport:
//!
//! - Pixel matrix type (fixed 16 rows, bounded width)
//! - Text and image rendering
//! - Decoration geometry and colour encoding
//! - Upload payload layouts (colour buffer, column bitmap)
//! - Frame generators for animations
//! - Configuration type definitions and persistence

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod animation;
pub mod color;
pub mod config;
pub mod matrix;
pub mod payload;
pub mod render;

pub use animation::FrameGenerator;
pub use color::{encode, ColorBuffer, ColorScheme, DecorationStyle};
pub use matrix::{Pixel, PixelMatrix, DISPLAY_ROWS, MAX_COLUMNS};
pub use payload::{ImagePayload, UploadPayload};
pub use render::{render, Content, ImageSource, RenderError, TextStyle};

/// Re-exported wire types used throughout the public API
pub use lumask_protocol::{DisplayMode, Rgb};

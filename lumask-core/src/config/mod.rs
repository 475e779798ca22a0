//! Configuration types
//!
//! Board-agnostic configuration structures. With the `serde` feature they
//! persist as postcard binary data; the `toml` feature also reads them from
//! a TOML document.

#[cfg(feature = "serde")]
pub mod store;
pub mod types;

#[cfg(feature = "serde")]
pub use store::*;
pub use types::*;

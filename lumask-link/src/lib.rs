//! Upload sequencing for LED-matrix masks
//!
//! Drives a mask over any byte transport:
//!
//! - [`Transport`] - the send/disconnect seam, with an adapter for
//!   `embedded-io-async` writers
//! - [`UploadSequencer`] - the single writer of upload state; splits a
//!   payload into frames, keeps uploads exclusive and handles cancellation
//! - [`MaskController`] - render, encode and upload in one call, and play
//!   animations as a stream of uploads
//!
//! Everything is generic over an `embassy-sync` raw mutex, so the same code
//! runs under `CriticalSectionRawMutex` on a device and `NoopRawMutex` in
//! host tests.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod controller;
pub mod error;
pub mod sequencer;
pub mod transport;

#[cfg(test)]
mod testing;

pub use controller::{AnimationReport, MaskController, Playback};
pub use error::{Error, UploadError};
pub use sequencer::{
    CancelOutcome, ConnectionStatus, DisplayTarget, SequencerConfig, SequencerState, SessionId,
    UploadOutcome, UploadReport, UploadSequencer,
};
pub use transport::{IoTransport, Transport, TransportError};

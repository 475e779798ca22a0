//! LED Mask Command Protocol
//!
//! This crate defines the wire contract between a host and a BLE LED-matrix
//! mask. Every command the mask understands travels as one fixed-size,
//! independently encrypted block.
//!
//! # Protocol Overview
//!
//! All commands use the same 16-byte frame layout before encryption:
//! ```text
//! ┌────────┬──────────────┬───────────────┬─────────────┐
//! │ LENGTH │ OPCODE       │ ARGUMENTS     │ ZERO PAD    │
//! │ 1B     │ 2–5B (ASCII) │ 0–13B         │ to 16B      │
//! └────────┴──────────────┴───────────────┴─────────────┘
//! ```
//!
//! LENGTH counts the opcode and argument bytes but not itself. The whole
//! block is then sealed with AES-128 in ECB mode using the device key; there
//! is no chaining between frames, so ordering is the sender's concern.
//!
//! The mask answers on a notify channel with blocks of the same shape
//! (length byte + ASCII reply such as `REOK`), see [`Notification`].

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod cipher;
pub mod frame;
pub mod notify;
pub mod opcode;

pub use cipher::{FrameCipher, SealedFrame, DEVICE_KEY};
pub use frame::{frame, CommandFrame, FrameError, FRAME_LEN, MAX_BODY_LEN};
pub use notify::Notification;
pub use opcode::{Command, DisplayMode, Opcode, Rgb, DATA_CHUNK_LEN};

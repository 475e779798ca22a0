//! Command frame encoding and decoding.
//!
//! Frame format (always 16 bytes before encryption):
//! - LENGTH (1 byte): opcode length + argument length
//! - OPCODE (1..=15 bytes): ASCII command name
//! - ARGUMENTS (0..=14 bytes): command-specific data
//! - PADDING: zero bytes up to 16

use core::fmt;

/// Size of every command frame, before and after encryption
pub const FRAME_LEN: usize = 16;

/// Maximum opcode + argument bytes that fit after the length byte
pub const MAX_BODY_LEN: usize = FRAME_LEN - 1;

/// Errors that can occur during frame construction or parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Opcode plus arguments do not fit in one frame
    Overflow {
        /// Bytes the frame would need (length byte included)
        needed: usize,
    },
    /// Opcode has no bytes
    EmptyOpcode,
    /// Opcode contains a byte outside printable ASCII
    NonAsciiOpcode,
    /// Length byte points past the end of the frame
    InvalidLength,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Overflow { needed } => {
                write!(f, "frame needs {} bytes, limit is {}", needed, FRAME_LEN)
            }
            FrameError::EmptyOpcode => f.write_str("empty opcode"),
            FrameError::NonAsciiOpcode => f.write_str("opcode is not printable ASCII"),
            FrameError::InvalidLength => f.write_str("length byte exceeds frame"),
        }
    }
}

/// A plaintext command frame
///
/// Can only be built through [`CommandFrame::new`], so the length byte and
/// zero padding are always consistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandFrame {
    bytes: [u8; FRAME_LEN],
}

impl CommandFrame {
    /// Build a frame from an ASCII opcode and its argument bytes
    pub fn new(opcode: &[u8], args: &[u8]) -> Result<Self, FrameError> {
        if opcode.is_empty() {
            return Err(FrameError::EmptyOpcode);
        }
        if !opcode.iter().all(|b| b.is_ascii_graphic()) {
            return Err(FrameError::NonAsciiOpcode);
        }

        let body_len = opcode.len() + args.len();
        if body_len > MAX_BODY_LEN {
            return Err(FrameError::Overflow {
                needed: 1 + body_len,
            });
        }

        let mut bytes = [0u8; FRAME_LEN];
        bytes[0] = body_len as u8;
        bytes[1..1 + opcode.len()].copy_from_slice(opcode);
        bytes[1 + opcode.len()..1 + body_len].copy_from_slice(args);

        Ok(Self { bytes })
    }

    /// Reinterpret a decrypted block as a frame
    ///
    /// Only the length byte is validated; padding is taken as-is.
    pub fn from_bytes(bytes: [u8; FRAME_LEN]) -> Result<Self, FrameError> {
        if bytes[0] as usize > MAX_BODY_LEN {
            return Err(FrameError::InvalidLength);
        }
        Ok(Self { bytes })
    }

    /// Value of the length byte
    pub fn body_len(&self) -> usize {
        self.bytes[0] as usize
    }

    /// Opcode and argument bytes, without the length prefix or padding
    pub fn body(&self) -> &[u8] {
        &self.bytes[1..1 + self.body_len()]
    }

    /// Check whether this frame carries the given opcode
    pub fn has_opcode(&self, opcode: &[u8]) -> bool {
        self.body().starts_with(opcode)
    }

    /// Raw 16-byte block
    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.bytes
    }

    /// Consume into the raw 16-byte block
    pub fn into_bytes(self) -> [u8; FRAME_LEN] {
        self.bytes
    }
}

/// Shorthand for [`CommandFrame::new`]
pub fn frame(opcode: &[u8], args: &[u8]) -> Result<CommandFrame, FrameError> {
    CommandFrame::new(opcode, args)
}

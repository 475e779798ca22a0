//! Opcode table and typed commands
//!
//! Every opcode the host sends lives here; nothing else in the workspace
//! spells an opcode literal.

use crate::frame::{CommandFrame, FrameError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Payload bytes carried by one `DATA` frame (1 + 4 + 1 index + 10 = 16)
pub const DATA_CHUNK_LEN: usize = 10;

/// Maximum brightness accepted by the firmware
pub const MAX_BRIGHTNESS: u8 = 100;

/// Device opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Opcode {
    /// Display mode select
    Mode,
    /// Scroll speed
    Speed,
    /// Global brightness
    Light,
    /// Foreground (text) colour
    Foreground,
    /// Background colour
    Background,
    /// Start of a bitmap/colour upload
    UploadStart,
    /// One chunk of upload data
    Data,
    /// Commit the uploaded buffer to the display
    Commit,
    /// Play a stored image slot
    Play,
}

impl Opcode {
    /// ASCII bytes placed after the length byte
    pub const fn as_bytes(self) -> &'static [u8] {
        match self {
            Opcode::Mode => b"MODE",
            Opcode::Speed => b"SPEED",
            Opcode::Light => b"LIGHT",
            Opcode::Foreground => b"FC",
            Opcode::Background => b"BG",
            Opcode::UploadStart => b"DATS",
            Opcode::Data => b"DATA",
            Opcode::Commit => b"DATCP",
            Opcode::Play => b"PLAY",
        }
    }

    /// Identify the opcode a plaintext frame carries
    ///
    /// `DATS` and `DATA` share a prefix with `DATCP`, so longer opcodes are
    /// tried first.
    pub fn of(frame: &CommandFrame) -> Option<Self> {
        const BY_LENGTH: [Opcode; 9] = [
            Opcode::Commit,
            Opcode::Light,
            Opcode::Speed,
            Opcode::UploadStart,
            Opcode::Data,
            Opcode::Mode,
            Opcode::Play,
            Opcode::Foreground,
            Opcode::Background,
        ];
        BY_LENGTH.into_iter().find(|op| frame.has_opcode(op.as_bytes()))
    }
}

/// RGB colour triple as sent on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const RED: Rgb = Rgb::new(255, 0, 0);
    pub const GREEN: Rgb = Rgb::new(0, 255, 0);
    pub const BLUE: Rgb = Rgb::new(0, 0, 255);

    /// Create a colour from its components
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Components in wire order
    pub const fn to_bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// True for (0, 0, 0)
    pub const fn is_black(self) -> bool {
        self.r == 0 && self.g == 0 && self.b == 0
    }
}

/// How the mask presents uploaded content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DisplayMode {
    /// Content shown without motion
    #[default]
    Steady,
    /// Content blinks
    Blink,
    /// Content scrolls towards the left edge
    ScrollLeft,
    /// Content scrolls towards the right edge
    ScrollRight,
}

// Wire format values
const MODE_STEADY: u8 = 1;
const MODE_BLINK: u8 = 2;
const MODE_SCROLL_LEFT: u8 = 3;
const MODE_SCROLL_RIGHT: u8 = 4;

impl DisplayMode {
    /// Parse a mode from its wire format byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            MODE_STEADY => Some(DisplayMode::Steady),
            MODE_BLINK => Some(DisplayMode::Blink),
            MODE_SCROLL_LEFT => Some(DisplayMode::ScrollLeft),
            MODE_SCROLL_RIGHT => Some(DisplayMode::ScrollRight),
            _ => None,
        }
    }

    /// Convert to wire format byte
    pub fn to_byte(self) -> u8 {
        match self {
            DisplayMode::Steady => MODE_STEADY,
            DisplayMode::Blink => MODE_BLINK,
            DisplayMode::ScrollLeft => MODE_SCROLL_LEFT,
            DisplayMode::ScrollRight => MODE_SCROLL_RIGHT,
        }
    }

    /// Returns true if the content moves
    pub fn is_scrolling(&self) -> bool {
        matches!(self, DisplayMode::ScrollLeft | DisplayMode::ScrollRight)
    }
}

/// Commands the host can send to the mask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command<'a> {
    /// Select display mode
    Mode(DisplayMode),
    /// Set scroll speed (0-255)
    Speed(u8),
    /// Set brightness (0-100, higher values are clamped)
    Brightness(u8),
    /// Set foreground (text) colour
    Foreground(Rgb),
    /// Set background colour
    Background(Rgb),
    /// Announce an upload of `total_len` bytes, the first `bitmap_len` of
    /// which are a column bitmap
    UploadStart { total_len: u16, bitmap_len: u16 },
    /// One chunk of upload data
    Data { index: u8, chunk: &'a [u8] },
    /// Make the uploaded content live
    Commit,
    /// Show a stored image slot
    Play(u8),
}

impl<'a> Command<'a> {
    /// Opcode this command is sent with
    pub fn opcode(&self) -> Opcode {
        match self {
            Command::Mode(_) => Opcode::Mode,
            Command::Speed(_) => Opcode::Speed,
            Command::Brightness(_) => Opcode::Light,
            Command::Foreground(_) => Opcode::Foreground,
            Command::Background(_) => Opcode::Background,
            Command::UploadStart { .. } => Opcode::UploadStart,
            Command::Data { .. } => Opcode::Data,
            Command::Commit => Opcode::Commit,
            Command::Play(_) => Opcode::Play,
        }
    }

    /// Encode this command into a frame
    pub fn to_frame(&self) -> Result<CommandFrame, FrameError> {
        let opcode = self.opcode().as_bytes();
        match self {
            Command::Mode(mode) => CommandFrame::new(opcode, &[mode.to_byte()]),
            Command::Speed(speed) => CommandFrame::new(opcode, &[*speed]),
            Command::Brightness(level) => {
                CommandFrame::new(opcode, &[(*level).min(MAX_BRIGHTNESS)])
            }
            Command::Foreground(c) | Command::Background(c) => {
                // Leading 1 enables the colour override
                CommandFrame::new(opcode, &[1, c.r, c.g, c.b])
            }
            Command::UploadStart {
                total_len,
                bitmap_len,
            } => {
                // Payload: [total BE][bitmap BE][0]
                let t = total_len.to_be_bytes();
                let b = bitmap_len.to_be_bytes();
                CommandFrame::new(opcode, &[t[0], t[1], b[0], b[1], 0])
            }
            Command::Data { index, chunk } => {
                if chunk.len() > DATA_CHUNK_LEN {
                    return Err(FrameError::Overflow {
                        needed: 1 + opcode.len() + 1 + chunk.len(),
                    });
                }
                let mut args = [0u8; 1 + DATA_CHUNK_LEN];
                args[0] = *index;
                args[1..1 + chunk.len()].copy_from_slice(chunk);
                CommandFrame::new(opcode, &args[..1 + chunk.len()])
            }
            Command::Commit => CommandFrame::new(opcode, &[]),
            Command::Play(slot) => CommandFrame::new(opcode, &[1, *slot]),
        }
    }
}

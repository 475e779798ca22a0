//! Frame plan of one upload session
//!
//! ```text
//! LIGHT  BG  MODE  SPEED  DATS  DATA#0 .. DATA#n-1  DATCP
//! └──────── header ────────┘    └─── payload ───┘   commit
//! ```
//!
//! Frames are built lazily from the cursor, so a cancelled session never
//! builds the frames it will not send.

use lumask_core::config::MaskConfig;
use lumask_core::UploadPayload;
use lumask_protocol::{Command, CommandFrame, DisplayMode, FrameError, Rgb, DATA_CHUNK_LEN};

/// Frames sent before the first `DATA` frame
pub const HEADER_FRAMES: usize = 5;

/// Display settings applied ahead of the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayTarget {
    pub mode: DisplayMode,
    /// Brightness (0-100, higher values are clamped on the wire)
    pub brightness: u8,
    pub speed: u8,
    pub background: Rgb,
}

impl Default for DisplayTarget {
    fn default() -> Self {
        Self::from_config(&MaskConfig::default())
    }
}

impl DisplayTarget {
    /// Target described by a configuration
    pub fn from_config(config: &MaskConfig) -> Self {
        Self {
            mode: config.display.mode,
            brightness: config.display.brightness,
            speed: config.display.speed,
            background: config.scheme.background,
        }
    }

    /// Same target with another display mode
    pub fn with_mode(self, mode: DisplayMode) -> Self {
        Self { mode, ..self }
    }
}

/// Role of a frame within the plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameKind {
    Header,
    Data,
    Commit,
}

/// Ordered frames of one session
pub struct UploadPlan<'p> {
    payload: &'p UploadPayload,
    target: DisplayTarget,
    data_frames: usize,
}

impl<'p> UploadPlan<'p> {
    pub fn new(payload: &'p UploadPayload, target: DisplayTarget) -> Self {
        Self {
            payload,
            target,
            data_frames: payload.len().div_ceil(DATA_CHUNK_LEN),
        }
    }

    /// Total frames, commit included
    pub fn len(&self) -> usize {
        HEADER_FRAMES + self.data_frames + 1
    }

    /// Number of `DATA` frames
    pub fn data_frames(&self) -> usize {
        self.data_frames
    }

    pub fn target(&self) -> &DisplayTarget {
        &self.target
    }

    /// Role of the frame at `cursor`
    pub fn kind(&self, cursor: usize) -> FrameKind {
        if cursor < HEADER_FRAMES {
            FrameKind::Header
        } else if cursor < HEADER_FRAMES + self.data_frames {
            FrameKind::Data
        } else {
            FrameKind::Commit
        }
    }

    /// Build the plaintext frame at `cursor`
    pub fn frame_at(&self, cursor: usize) -> Result<CommandFrame, FrameError> {
        match self.kind(cursor) {
            FrameKind::Header => self.header(cursor).to_frame(),
            FrameKind::Data => {
                let index = cursor - HEADER_FRAMES;
                let mut chunk = [0u8; DATA_CHUNK_LEN];
                let len = self.payload.read_at(index * DATA_CHUNK_LEN, &mut chunk);
                Command::Data {
                    // Index wraps, the device counts chunks modulo 256
                    index: index as u8,
                    chunk: &chunk[..len],
                }
                .to_frame()
            }
            FrameKind::Commit => Command::Commit.to_frame(),
        }
    }

    fn header(&self, cursor: usize) -> Command<'static> {
        let target = &self.target;
        match cursor {
            0 => Command::Brightness(target.brightness),
            1 => Command::Background(target.background),
            2 => Command::Mode(target.mode),
            3 => Command::Speed(target.speed),
            // Payload sizes are bounded well below u16::MAX by the matrix width
            _ => Command::UploadStart {
                total_len: self.payload.len() as u16,
                bitmap_len: self.payload.bitmap_len() as u16,
            },
        }
    }
}

//! Replies sent by the mask on its notify channel
//!
//! A reply is a sealed 16-byte block whose plaintext is a length byte
//! followed by ASCII text, e.g. `\x04REOK`.

use heapless::String;

use crate::cipher::{FrameCipher, SealedFrame};
use crate::frame::{FrameError, MAX_BODY_LEN};

/// Decoded device notification
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Notification {
    /// `DATSOK`: upload announced and accepted
    UploadAccepted,
    /// `REOK`: one data chunk received
    ChunkReceived,
    /// `DATCPOK`: upload committed to the display
    Committed,
    /// `PLAYOK`: stored image selected
    Playing,
    /// Any other reply, kept verbatim
    Other(String<MAX_BODY_LEN>),
}

impl Notification {
    /// Parse the plaintext of a notification block
    pub fn parse(plain: &[u8; 16]) -> Result<Self, FrameError> {
        let len = plain[0] as usize;
        if len == 0 || len > MAX_BODY_LEN {
            return Err(FrameError::InvalidLength);
        }
        let text = &plain[1..1 + len];

        let notification = match text {
            b"DATSOK" => Notification::UploadAccepted,
            b"REOK" => Notification::ChunkReceived,
            b"DATCPOK" => Notification::Committed,
            b"PLAYOK" => Notification::Playing,
            _ => {
                let text = core::str::from_utf8(text).map_err(|_| FrameError::NonAsciiOpcode)?;
                let mut other = String::new();
                other
                    .push_str(text)
                    .map_err(|_| FrameError::InvalidLength)?;
                Notification::Other(other)
            }
        };
        Ok(notification)
    }

    /// Decrypt and parse a block received from the device
    pub fn decode(cipher: &FrameCipher, sealed: &SealedFrame) -> Result<Self, FrameError> {
        Self::parse(&cipher.unseal(sealed))
    }

    /// Returns true if this reply acknowledges part of an upload
    pub fn is_upload_ack(&self) -> bool {
        matches!(
            self,
            Notification::UploadAccepted | Notification::ChunkReceived | Notification::Committed
        )
    }
}

//! Frame sealing with the device's fixed AES-128 key
//!
//! Each 16-byte frame is one AES block, encrypted on its own (ECB). The
//! firmware expects exactly this scheme, so identical frames produce
//! identical ciphertext and replay protection is left to the sequencer.

use core::fmt;

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes128;

use crate::frame::{CommandFrame, FrameError, FRAME_LEN};

/// Pre-shared key burned into the mask firmware
pub const DEVICE_KEY: [u8; 16] = [
    0x32, 0x67, 0x2f, 0x79, 0x74, 0xad, 0x43, 0x45, 0x1d, 0x9c, 0x6c, 0x89, 0x4a, 0x0e, 0x87, 0x64,
];

/// An encrypted frame, ready for the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SealedFrame([u8; FRAME_LEN]);

impl SealedFrame {
    /// Wrap a block received from the device
    pub const fn from_bytes(bytes: [u8; FRAME_LEN]) -> Self {
        Self(bytes)
    }

    /// Ciphertext bytes
    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }
}

/// Block cipher for command frames and device notifications
#[derive(Clone)]
pub struct FrameCipher {
    aes: Aes128,
}

impl Default for FrameCipher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FrameCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameCipher").finish_non_exhaustive()
    }
}

impl FrameCipher {
    /// Cipher keyed with [`DEVICE_KEY`]
    pub fn new() -> Self {
        Self::with_key(&DEVICE_KEY)
    }

    /// Cipher with a custom key (test rigs, other firmware revisions)
    pub fn with_key(key: &[u8; 16]) -> Self {
        Self {
            aes: Aes128::new(GenericArray::from_slice(key)),
        }
    }

    /// Encrypt one frame
    pub fn seal(&self, frame: &CommandFrame) -> SealedFrame {
        let mut block = GenericArray::clone_from_slice(frame.as_bytes());
        self.aes.encrypt_block(&mut block);

        let mut out = [0u8; FRAME_LEN];
        out.copy_from_slice(&block);
        SealedFrame(out)
    }

    /// Decrypt one block to its raw plaintext
    pub fn unseal(&self, sealed: &SealedFrame) -> [u8; FRAME_LEN] {
        let mut block = GenericArray::clone_from_slice(sealed.as_bytes());
        self.aes.decrypt_block(&mut block);

        let mut out = [0u8; FRAME_LEN];
        out.copy_from_slice(&block);
        out
    }

    /// Decrypt one block and validate it as a frame
    pub fn open(&self, sealed: &SealedFrame) -> Result<CommandFrame, FrameError> {
        CommandFrame::from_bytes(self.unseal(sealed))
    }
}

//! Error types for uploads and the controller facade

use core::fmt;

use lumask_core::RenderError;
use lumask_protocol::FrameError;

use crate::transport::TransportError;

/// Upload and command errors
///
/// `Frame` and `EmptyPayload` are reported before any state changes.
/// `Transport` and `CancellationTimeout` leave the sequencer `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UploadError {
    /// A command did not fit in one frame
    Frame(FrameError),
    /// The link failed or timed out; the session was aborted
    Transport(TransportError),
    /// Another upload is running (or being cancelled)
    AlreadyUploading,
    /// The running session did not stop in time and was forced idle
    CancellationTimeout,
    /// Nothing to upload
    EmptyPayload,
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadError::Frame(e) => write!(f, "frame error: {}", e),
            UploadError::Transport(e) => write!(f, "{}", e),
            UploadError::AlreadyUploading => f.write_str("an upload is already in progress"),
            UploadError::CancellationTimeout => f.write_str("upload did not stop in time"),
            UploadError::EmptyPayload => f.write_str("payload is empty"),
        }
    }
}

impl From<FrameError> for UploadError {
    fn from(e: FrameError) -> Self {
        UploadError::Frame(e)
    }
}

impl From<TransportError> for UploadError {
    fn from(e: TransportError) -> Self {
        UploadError::Transport(e)
    }
}

/// Controller errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Content could not be rendered
    Render(RenderError),
    /// Upload or command failed
    Upload(UploadError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Render(e) => write!(f, "render error: {}", e),
            Error::Upload(e) => write!(f, "upload error: {}", e),
        }
    }
}

impl From<RenderError> for Error {
    fn from(e: RenderError) -> Self {
        Error::Render(e)
    }
}

impl From<UploadError> for Error {
    fn from(e: UploadError) -> Self {
        Error::Upload(e)
    }
}

//! Transport seam
//!
//! The sequencer only needs to push sealed 16-byte blocks and to close the
//! link. Connection setup, device discovery and notification subscription
//! stay with whoever builds the transport.

use core::fmt;

use embedded_io_async::{Error as _, ErrorKind, Write};

/// Transport failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// Link is closed
    Disconnected,
    /// A send did not complete in time
    Timeout,
    /// Underlying writer failed
    Io(ErrorKind),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Disconnected => f.write_str("transport disconnected"),
            TransportError::Timeout => f.write_str("transport send timed out"),
            TransportError::Io(kind) => write!(f, "transport I/O error: {:?}", kind),
        }
    }
}

/// A byte channel to the mask
///
/// `send` completes once the bytes are handed to the link (for BLE, once
/// the write-with-response is acknowledged).
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Send one sealed frame
    async fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Close the link; later sends fail with [`TransportError::Disconnected`]
    async fn disconnect(&mut self);
}

/// [`Transport`] over any `embedded-io-async` writer
pub struct IoTransport<W> {
    writer: W,
    open: bool,
}

impl<W: Write> IoTransport<W> {
    /// Wrap an open writer
    pub fn new(writer: W) -> Self {
        Self { writer, open: true }
    }

    /// Returns true until [`Transport::disconnect`] is called
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Reclaim the writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Transport for IoTransport<W> {
    async fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        if !self.open {
            return Err(TransportError::Disconnected);
        }
        self.writer
            .write_all(bytes)
            .await
            .map_err(|e| TransportError::Io(e.kind()))?;
        self.writer
            .flush()
            .await
            .map_err(|e| TransportError::Io(e.kind()))
    }

    async fn disconnect(&mut self) {
        if self.open {
            if let Err(e) = self.writer.flush().await {
                warn!("flush on disconnect failed: {:?}", e.kind());
            }
            self.open = false;
        }
    }
}

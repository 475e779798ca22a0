//! Host test doubles

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::vec::Vec;

use embassy_time::Timer;
use embedded_io_async::ErrorKind;

use lumask_core::{encode, ColorScheme, Pixel, PixelMatrix, UploadPayload};
use lumask_protocol::{CommandFrame, FrameCipher, Opcode, SealedFrame, FRAME_LEN};

use crate::sequencer::{DisplayTarget, UploadPlan};
use crate::transport::{Transport, TransportError};

/// Frames that reached the device, in order
#[derive(Clone, Default)]
pub struct Wire {
    frames: Rc<RefCell<Vec<[u8; FRAME_LEN]>>>,
    closed: Rc<Cell<bool>>,
}

impl Wire {
    pub fn frames(&self) -> Vec<[u8; FRAME_LEN]> {
        self.frames.borrow().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    /// Decrypted frames
    pub fn plaintext(&self) -> Vec<CommandFrame> {
        let cipher = FrameCipher::new();
        self.frames()
            .into_iter()
            .map(|block| cipher.open(&SealedFrame::from_bytes(block)).unwrap())
            .collect()
    }

    pub fn opcodes(&self) -> Vec<Opcode> {
        self.plaintext()
            .iter()
            .map(|frame| Opcode::of(frame).unwrap())
            .collect()
    }

    pub fn count(&self, opcode: Opcode) -> usize {
        self.opcodes().into_iter().filter(|op| *op == opcode).count()
    }
}

/// Transport that records sealed frames after a per-send delay
pub struct MockTransport {
    wire: Wire,
    delay_ms: u64,
    slow: Option<(usize, u64)>,
    fail_at: Option<usize>,
    sends: usize,
}

impl MockTransport {
    pub fn new(wire: &Wire) -> Self {
        Self {
            wire: wire.clone(),
            delay_ms: 2,
            slow: None,
            fail_at: None,
            sends: 0,
        }
    }

    /// Delay of every send
    pub fn with_delay(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }

    /// Make send number `index` (0-based) take `ms`
    pub fn slow_at(mut self, index: usize, ms: u64) -> Self {
        self.slow = Some((index, ms));
        self
    }

    /// Make send number `index` fail
    pub fn fail_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }
}

impl Transport for MockTransport {
    async fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        if self.wire.is_closed() {
            return Err(TransportError::Disconnected);
        }

        let index = self.sends;
        self.sends += 1;

        let delay = match self.slow {
            Some((at, ms)) if at == index => ms,
            _ => self.delay_ms,
        };
        Timer::after_millis(delay).await;

        if self.fail_at == Some(index) {
            return Err(TransportError::Io(ErrorKind::BrokenPipe));
        }

        let mut block = [0u8; FRAME_LEN];
        block.copy_from_slice(bytes);
        self.wire.frames.borrow_mut().push(block);
        Ok(())
    }

    async fn disconnect(&mut self) {
        self.wire.closed.set(true);
    }
}

/// Colour payload of `width` lit columns in `scheme`
pub fn colors(width: usize, scheme: &ColorScheme) -> UploadPayload {
    let matrix = PixelMatrix::filled(width, Pixel::On).unwrap();
    UploadPayload::Colors(encode(&matrix, scheme))
}

/// Sealed frames a full session of `payload` puts on the wire
pub fn expected_frames(payload: &UploadPayload, target: DisplayTarget) -> Vec<[u8; FRAME_LEN]> {
    let cipher = FrameCipher::new();
    let plan = UploadPlan::new(payload, target);
    (0..plan.len())
        .map(|cursor| *cipher.seal(&plan.frame_at(cursor).unwrap()).as_bytes())
        .collect()
}

//! Upload sequencer
//!
//! Owns the transport and is the only writer of upload state. A session
//! sends its frames strictly in order, one at a time, each under the
//! transmit lock:
//!
//! ```text
//!            begin_upload                 commit sent
//!   Idle ──────────────────► Uploading ─────────────────► Idle
//!                               │  │ send error / timeout
//!                               │  └──────────────────────► Idle
//!                cancel / preempt
//!                               ▼        next frame boundary
//!                           Cancelling ─────────────────► Idle
//! ```
//!
//! Cancellation is cooperative: the session checks the state after taking
//! the transmit lock and before building the next frame, so a frame that
//! has been built is always sent in full.
//!
//! Callers that have to wait for a session to stop queue on a turn lock, so
//! the stop signal only ever has one waiter. A preempting request that
//! arrives while another caller is stopping a session waits its turn and
//! then claims the link.

pub mod plan;
pub mod state;

use core::cell::RefCell;

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_time::{with_timeout, Duration, Timer};

use lumask_core::config::{BusyPolicy, UploadConfig};
use lumask_core::UploadPayload;
use lumask_protocol::{Command, FrameCipher, SealedFrame};

pub use plan::{DisplayTarget, FrameKind, UploadPlan};
pub use state::{SequencerEvent, SequencerState, SessionId, SessionInfo};

use crate::error::UploadError;
use crate::transport::{Transport, TransportError};

/// Sequencer settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SequencerConfig {
    /// Behaviour when an upload starts while another runs
    pub busy_policy: BusyPolicy,
    /// How long a cancellation waits for the session to stop
    pub cancel_timeout: Duration,
    /// Per-frame send timeout
    pub frame_timeout: Option<Duration>,
}

impl From<&UploadConfig> for SequencerConfig {
    fn from(config: &UploadConfig) -> Self {
        Self {
            busy_policy: config.busy_policy,
            cancel_timeout: Duration::from_millis(config.cancel_timeout_ms as u64),
            frame_timeout: config
                .frame_timeout_ms
                .map(|ms| Duration::from_millis(ms as u64)),
        }
    }
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self::from(&UploadConfig::default())
    }
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UploadOutcome {
    /// Commit frame sent, content is live
    Committed,
    /// Stopped at a frame boundary before commit
    Cancelled,
}

/// Result of a session that ended without a transport error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UploadReport {
    pub session: SessionId,
    pub outcome: UploadOutcome,
    /// Frames fully sent, header and commit included
    pub frames_sent: usize,
    /// `DATA` frames fully sent
    pub data_frames_sent: usize,
}

impl UploadReport {
    fn new(session: SessionId) -> Self {
        Self {
            session,
            outcome: UploadOutcome::Cancelled,
            frames_sent: 0,
            data_frames_sent: 0,
        }
    }

    fn count(&mut self, kind: FrameKind) {
        self.frames_sent += 1;
        if kind == FrameKind::Data {
            self.data_frames_sent += 1;
        }
    }

    pub fn is_committed(&self) -> bool {
        self.outcome == UploadOutcome::Committed
    }
}

/// Result of [`UploadSequencer::cancel_upload`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CancelOutcome {
    /// Nothing was running
    Idle,
    /// The session stopped at a frame boundary
    Cancelled(SessionId),
    /// Another caller is already cancelling
    AlreadyCancelling,
}

/// Snapshot of the link and upload counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnectionStatus {
    pub connected: bool,
    pub state: SequencerState,
    pub sessions_committed: u32,
    pub sessions_cancelled: u32,
    pub transport_failures: u32,
}

struct Record {
    state: SequencerState,
    next_session: u32,
    connected: bool,
    committed: u32,
    cancelled: u32,
    failures: u32,
}

impl Record {
    const fn new() -> Self {
        Self {
            state: SequencerState::Idle,
            next_session: 1,
            connected: true,
            committed: 0,
            cancelled: 0,
            failures: 0,
        }
    }

    fn apply(&mut self, event: SequencerEvent) {
        self.state = self.state.transition(event);
    }

    fn allocate_id(&mut self) -> SessionId {
        let id = SessionId(self.next_session);
        self.next_session = self.next_session.wrapping_add(1);
        id
    }

    fn is_current(&self, id: SessionId) -> bool {
        self.state.session().map(|info| info.id) == Some(id)
    }

    /// Drop the session owning the link without waiting for it
    ///
    /// The session counts as cancelled; anything it reports later is ignored.
    fn force_idle(&mut self) -> Option<SessionId> {
        let id = self.state.session()?.id;
        self.apply(SequencerEvent::ForceIdle);
        self.cancelled += 1;
        Some(id)
    }
}

enum Claim {
    Started(SessionInfo),
    /// Session that has to stop before the link is free
    Stopping(SessionId),
    Busy,
    Closed,
}

/// Serialises uploads and commands over one transport
pub struct UploadSequencer<M: RawMutex, T: Transport> {
    /// Transmit lock, held for exactly one frame at a time
    link: Mutex<M, T>,
    record: BlockingMutex<M, RefCell<Record>>,
    /// Held by the one caller waiting for a session to stop
    turn: Mutex<M, ()>,
    /// Raised with the session id when a cancelled session leaves the link
    stopped: Signal<M, SessionId>,
    cipher: FrameCipher,
    config: SequencerConfig,
}

impl<M: RawMutex, T: Transport> UploadSequencer<M, T> {
    /// Create a sequencer over an open transport
    pub fn new(transport: T, config: SequencerConfig) -> Self {
        Self {
            link: Mutex::new(transport),
            record: BlockingMutex::new(RefCell::new(Record::new())),
            turn: Mutex::new(()),
            stopped: Signal::new(),
            cipher: FrameCipher::new(),
            config,
        }
    }

    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    /// Current upload state
    pub fn state(&self) -> SequencerState {
        self.update(|record| record.state)
    }

    /// Snapshot of the link and upload counters
    pub fn connection_status(&self) -> ConnectionStatus {
        self.update(|record| ConnectionStatus {
            connected: record.connected,
            state: record.state,
            sessions_committed: record.committed,
            sessions_cancelled: record.cancelled,
            transport_failures: record.failures,
        })
    }

    /// Upload a payload and commit it
    ///
    /// Returns once the session has committed or has been cancelled. While
    /// another upload runs, the configured [`BusyPolicy`] decides whether
    /// this call preempts it or fails with `AlreadyUploading`.
    pub async fn begin_upload(
        &self,
        payload: UploadPayload,
        target: DisplayTarget,
    ) -> Result<UploadReport, UploadError> {
        if payload.is_empty() {
            return Err(UploadError::EmptyPayload);
        }

        let plan = UploadPlan::new(&payload, target);
        let session = self.claim(&plan).await?;
        info!(
            "upload {} started: {} frames, {} data",
            session.id.0,
            plan.len(),
            plan.data_frames()
        );

        self.run(session.id, &plan).await
    }

    /// Stop the running upload at its next frame boundary
    ///
    /// Waits for the session to acknowledge. If it does not within the
    /// cancellation timeout, the state is forced to `Idle` and
    /// `CancellationTimeout` is returned.
    pub async fn cancel_upload(&self) -> Result<CancelOutcome, UploadError> {
        match self.state() {
            SequencerState::Idle => return Ok(CancelOutcome::Idle),
            SequencerState::Cancelling(_) => return Ok(CancelOutcome::AlreadyCancelling),
            SequencerState::Uploading(_) => {}
        }

        let _turn = self.turn.lock().await;
        let pending = self.update(|record| match record.state {
            SequencerState::Idle => Err(CancelOutcome::Idle),
            SequencerState::Cancelling(_) => Err(CancelOutcome::AlreadyCancelling),
            SequencerState::Uploading(info) => {
                self.stopped.reset();
                record.apply(SequencerEvent::StopRequested);
                Ok(info.id)
            }
        });

        let id = match pending {
            Ok(id) => id,
            Err(outcome) => return Ok(outcome),
        };

        info!("cancelling upload {}", id.0);
        self.await_stop(id).await?;
        Ok(CancelOutcome::Cancelled(id))
    }

    /// Send a single command frame
    ///
    /// Only allowed while no upload is running.
    pub async fn send_command(&self, command: Command<'_>) -> Result<(), UploadError> {
        let frame = command.to_frame()?;
        self.ensure_idle()?;

        let mut link = self.link.lock().await;
        // A session may have claimed the link while we waited
        self.ensure_idle()?;

        let sealed = self.cipher.seal(&frame);
        let sent = self.transmit(&mut link, &sealed).await;
        drop(link);

        if let Err(e) = sent {
            warn!("command {:?} failed: {:?}", command.opcode(), e);
            self.note_failure(e);
            return Err(e.into());
        }

        debug!("command {:?} sent", command.opcode());
        Ok(())
    }

    /// Stop any upload and close the transport
    ///
    /// The running session stops at its next frame boundary. Callers waiting
    /// for it are woken at once and, like every later operation, fail with
    /// `TransportError::Disconnected`.
    pub async fn disconnect(&self) {
        let running = self.update(|record| {
            record.connected = false;
            let info = record.state.session()?;
            record.apply(SequencerEvent::StopRequested);
            self.stopped.signal(info.id);
            Some(info.id)
        });
        if let Some(id) = running {
            info!("stopping upload {} before disconnect", id.0);
        }

        // Waits out a frame in flight
        let mut link = self.link.lock().await;
        self.update(|record| record.force_idle());
        link.disconnect().await;
        info!("link closed");
    }

    fn update<R>(&self, f: impl FnOnce(&mut Record) -> R) -> R {
        self.record.lock(|record| f(&mut record.borrow_mut()))
    }

    fn ensure_idle(&self) -> Result<(), UploadError> {
        self.update(|record| {
            if !record.connected {
                Err(UploadError::Transport(TransportError::Disconnected))
            } else if !record.state.is_idle() {
                Err(UploadError::AlreadyUploading)
            } else {
                Ok(())
            }
        })
    }

    /// Take ownership of the link for a new session
    async fn claim(&self, plan: &UploadPlan<'_>) -> Result<SessionInfo, UploadError> {
        let _turn = match self.config.busy_policy {
            BusyPolicy::Preempt => Some(self.turn.lock().await),
            BusyPolicy::FailFast => None,
        };

        loop {
            match self.try_claim(plan) {
                Claim::Started(info) => return Ok(info),
                Claim::Busy => return Err(UploadError::AlreadyUploading),
                Claim::Closed => return Err(TransportError::Disconnected.into()),
                Claim::Stopping(id) => {
                    debug!("waiting for upload {} to stop", id.0);
                    self.await_stop(id).await?;
                }
            }
        }
    }

    fn try_claim(&self, plan: &UploadPlan<'_>) -> Claim {
        let preempt = self.config.busy_policy == BusyPolicy::Preempt;

        self.update(|record| {
            if !record.connected {
                return Claim::Closed;
            }
            match record.state {
                SequencerState::Idle => {
                    let id = record.allocate_id();
                    let info = SessionInfo::new(id, plan.target().mode, plan.len());
                    record.apply(SequencerEvent::Begin(info));
                    Claim::Started(info)
                }
                SequencerState::Uploading(running) if preempt => {
                    self.stopped.reset();
                    record.apply(SequencerEvent::StopRequested);
                    Claim::Stopping(running.id)
                }
                SequencerState::Cancelling(stopping) if preempt => Claim::Stopping(stopping.id),
                _ => Claim::Busy,
            }
        })
    }

    /// Send every frame of the plan, checking for a stop request before each
    async fn run(&self, id: SessionId, plan: &UploadPlan<'_>) -> Result<UploadReport, UploadError> {
        let mut report = UploadReport::new(id);

        for cursor in 0..plan.len() {
            let mut link = self.link.lock().await;

            if !self.update(|record| record.state.may_continue(id)) {
                drop(link);
                self.finish_stopped(id);
                info!(
                    "upload {} cancelled after {} frames",
                    id.0, report.frames_sent
                );
                return Ok(report);
            }

            let frame = match plan.frame_at(cursor) {
                Ok(frame) => frame,
                Err(e) => {
                    drop(link);
                    self.abort(id);
                    return Err(e.into());
                }
            };
            let sealed = self.cipher.seal(&frame);
            let sent = self.transmit(&mut link, &sealed).await;
            drop(link);

            if let Err(e) = sent {
                warn!("upload {} failed at frame {}: {:?}", id.0, cursor, e);
                self.abort(id);
                self.note_failure(e);
                return Err(e.into());
            }

            trace!("upload {} frame {}/{}", id.0, cursor + 1, plan.len());
            report.count(plan.kind(cursor));
            self.update(|record| {
                record.apply(SequencerEvent::Progress {
                    id,
                    cursor: cursor + 1,
                })
            });
        }

        self.finish_committed(id);
        info!("upload {} committed", id.0);
        report.outcome = UploadOutcome::Committed;
        Ok(report)
    }

    async fn transmit(&self, link: &mut T, sealed: &SealedFrame) -> Result<(), TransportError> {
        match self.config.frame_timeout {
            Some(limit) => with_timeout(limit, link.send(sealed.as_bytes()))
                .await
                .map_err(|_| TransportError::Timeout)?,
            None => link.send(sealed.as_bytes()).await,
        }
    }

    /// Wait for session `id` to acknowledge a stop request
    async fn await_stop(&self, id: SessionId) -> Result<(), UploadError> {
        let acknowledged = async {
            while self.stopped.wait().await != id {}
        };

        match select(acknowledged, Timer::after(self.config.cancel_timeout)).await {
            Either::First(()) => Ok(()),
            Either::Second(()) => {
                warn!("upload {} did not stop in time, forcing idle", id.0);
                self.update(|record| {
                    if record.is_current(id) {
                        record.force_idle();
                    }
                });
                Err(UploadError::CancellationTimeout)
            }
        }
    }

    /// Session `id` reached a frame boundary after a stop request
    fn finish_stopped(&self, id: SessionId) {
        self.update(|record| {
            if matches!(record.state, SequencerState::Cancelling(info) if info.id == id) {
                record.apply(SequencerEvent::Stopped(id));
                record.cancelled += 1;
                self.stopped.signal(id);
            }
        });
    }

    /// Session `id` sent its commit frame
    ///
    /// A session that was forced idle has already been counted as cancelled.
    fn finish_committed(&self, id: SessionId) {
        self.update(|record| {
            if !record.is_current(id) {
                return;
            }
            let was_cancelling =
                matches!(record.state, SequencerState::Cancelling(info) if info.id == id);
            record.apply(SequencerEvent::Finished(id));
            record.committed += 1;
            if was_cancelling {
                self.stopped.signal(id);
            }
        });
    }

    /// Session `id` could not continue
    fn abort(&self, id: SessionId) {
        self.update(|record| {
            let was_cancelling =
                matches!(record.state, SequencerState::Cancelling(info) if info.id == id);
            record.apply(SequencerEvent::Failed(id));
            if was_cancelling {
                self.stopped.signal(id);
            }
        });
    }

    fn note_failure(&self, error: TransportError) {
        self.update(|record| {
            record.failures += 1;
            if error == TransportError::Disconnected {
                record.connected = false;
            }
        });
    }
}

//! Caller-facing facade
//!
//! Bundles a [`MaskConfig`] with an [`UploadSequencer`] so callers can go
//! from text or an image to a committed upload in one call. The lower-level
//! pieces stay reachable for callers that render or encode on their own.
//!
//! Animations are a stream of ordinary uploads, one per generated frame.
//! Any other upload preempts the frame in flight and ends the animation.

use core::cell::Cell;

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Timer};

use lumask_core::animation::FRAME_RATE;
use lumask_core::config::{MaskConfig, PayloadFormat};
use lumask_core::{
    encode, render, ColorBuffer, ColorScheme, Content, FrameGenerator, ImagePayload,
    ImageSource, PixelMatrix, RenderError, Rgb, UploadPayload,
};
use lumask_protocol::Command;

use crate::error::{Error, UploadError};
use crate::sequencer::{
    CancelOutcome, ConnectionStatus, DisplayTarget, SequencerConfig, UploadReport,
    UploadSequencer,
};
use crate::transport::Transport;

/// Settings for [`MaskController::play_animation`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Playback {
    /// Frames to show before returning
    pub frames: u32,
    /// Columns of every frame
    pub width: usize,
    /// Pause after each committed frame
    pub interval: Duration,
}

impl Default for Playback {
    fn default() -> Self {
        Self {
            frames: 10 * FRAME_RATE,
            width: 64,
            interval: Duration::from_millis(1000 / FRAME_RATE as u64),
        }
    }
}

/// How an animation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AnimationReport {
    /// Frames committed to the mask
    pub frames_shown: u32,
    /// Ended by `stop_animation` or another upload before the last frame
    pub stopped: bool,
}

/// Render, encode and upload through one sequencer
pub struct MaskController<M: RawMutex, T: Transport> {
    sequencer: UploadSequencer<M, T>,
    config: MaskConfig,
    /// Animations currently playing
    playing: BlockingMutex<M, Cell<u32>>,
    stop: Signal<M, ()>,
}

impl<M: RawMutex, T: Transport> MaskController<M, T> {
    /// Create a controller over an open transport
    ///
    /// Busy policy and timeouts come from `config.upload`.
    pub fn new(transport: T, config: MaskConfig) -> Self {
        Self {
            sequencer: UploadSequencer::new(transport, SequencerConfig::from(&config.upload)),
            config,
            playing: BlockingMutex::new(Cell::new(0)),
            stop: Signal::new(),
        }
    }

    pub fn config(&self) -> &MaskConfig {
        &self.config
    }

    /// Replace display, scheme and text settings
    ///
    /// Upload settings are fixed when the controller is built.
    pub fn set_config(&mut self, config: MaskConfig) {
        self.config = MaskConfig {
            upload: self.config.upload,
            ..config
        };
    }

    pub fn set_scheme(&mut self, scheme: ColorScheme) {
        self.config.scheme = scheme;
    }

    pub fn sequencer(&self) -> &UploadSequencer<M, T> {
        &self.sequencer
    }

    /// Render content into a pixel matrix
    pub fn render(
        &self,
        content: Content<'_>,
        target_width: Option<usize>,
    ) -> Result<PixelMatrix, RenderError> {
        render(content, target_width)
    }

    /// Encode a matrix with `scheme`
    pub fn encode(&self, matrix: &PixelMatrix, scheme: &ColorScheme) -> ColorBuffer {
        encode(matrix, scheme)
    }

    pub async fn begin_upload(
        &self,
        payload: UploadPayload,
        target: DisplayTarget,
    ) -> Result<UploadReport, UploadError> {
        self.sequencer.begin_upload(payload, target).await
    }

    pub async fn cancel_upload(&self) -> Result<CancelOutcome, UploadError> {
        self.sequencer.cancel_upload().await
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.sequencer.connection_status()
    }

    /// Show `text` in the configured style and colours
    pub async fn show_text(&self, text: &str) -> Result<UploadReport, Error> {
        let matrix = render(Content::Text(text, self.config.text), None)?;
        self.show_matrix(&matrix).await
    }

    /// Show an image resampled to `width` columns (natural width if `None`)
    pub async fn show_image(
        &self,
        source: ImageSource<'_>,
        width: Option<usize>,
    ) -> Result<UploadReport, Error> {
        let matrix = render(Content::Image(source), width)?;
        self.show_matrix(&matrix).await
    }

    /// Upload an already rendered matrix
    pub async fn show_matrix(&self, matrix: &PixelMatrix) -> Result<UploadReport, Error> {
        let payload = self.payload(matrix);
        let target = DisplayTarget::from_config(&self.config);
        Ok(self.sequencer.begin_upload(payload, target).await?)
    }

    /// Set brightness without uploading (clamped to 100)
    pub async fn set_brightness(&self, level: u8) -> Result<(), UploadError> {
        self.sequencer.send_command(Command::Brightness(level)).await
    }

    /// Override the colour of text the mask draws itself
    pub async fn set_text_color(&self, color: Rgb) -> Result<(), UploadError> {
        self.sequencer.send_command(Command::Foreground(color)).await
    }

    /// Show an image stored on the mask
    pub async fn play_stored(&self, slot: u8) -> Result<(), UploadError> {
        self.sequencer.send_command(Command::Play(slot)).await
    }

    /// Upload frames from `generator` until `playback.frames` are shown
    ///
    /// Ends early, with `stopped` set, on [`Self::stop_animation`] or when
    /// another upload takes the link. Render and transport errors end the
    /// animation with that error.
    pub async fn play_animation<G: FrameGenerator>(
        &self,
        generator: &mut G,
        playback: Playback,
    ) -> Result<AnimationReport, Error> {
        self.stop.reset();
        self.playing.lock(|count| count.set(count.get() + 1));
        let result = self.animate(generator, playback).await;
        self.playing.lock(|count| count.set(count.get() - 1));

        if let Ok(report) = &result {
            info!(
                "animation ended after {} frames (stopped: {})",
                report.frames_shown, report.stopped
            );
        }
        result
    }

    /// Stop a playing animation
    ///
    /// The frame in flight is cancelled at its next frame boundary. Returns
    /// `CancelOutcome::Idle` when no animation is playing.
    pub async fn stop_animation(&self) -> Result<CancelOutcome, UploadError> {
        if self.playing.lock(Cell::get) == 0 {
            return Ok(CancelOutcome::Idle);
        }
        self.stop.signal(());
        self.sequencer.cancel_upload().await
    }

    async fn animate<G: FrameGenerator>(
        &self,
        generator: &mut G,
        playback: Playback,
    ) -> Result<AnimationReport, Error> {
        let target = DisplayTarget::from_config(&self.config);
        let mut report = AnimationReport::default();

        for tick in 0..playback.frames {
            // Yield to an upload that started between frames
            if self.stop.signaled() || !self.sequencer.state().is_idle() {
                report.stopped = true;
                break;
            }

            let matrix = generator.frame(tick, playback.width)?;
            let upload = self
                .sequencer
                .begin_upload(self.payload(&matrix), target)
                .await?;
            if !upload.is_committed() {
                report.stopped = true;
                break;
            }
            report.frames_shown += 1;
            trace!("animation frame {} shown", tick);

            if tick + 1 < playback.frames {
                if let Either::Second(()) =
                    select(Timer::after(playback.interval), self.stop.wait()).await
                {
                    report.stopped = true;
                    break;
                }
            }
        }
        Ok(report)
    }

    /// Cancel any upload and close the link
    pub async fn disconnect(&self) {
        self.sequencer.disconnect().await
    }

    fn payload(&self, matrix: &PixelMatrix) -> UploadPayload {
        match self.config.upload.format {
            PayloadFormat::ColorBuffer => encode(matrix, &self.config.scheme).into(),
            PayloadFormat::ColumnBitmap => {
                ImagePayload::from_matrix(matrix, &self.config.scheme).into()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::UploadOutcome;
    use crate::testing::{MockTransport, Wire};
    use crate::sequencer::SessionId;
    use embassy_futures::block_on;
    use embassy_futures::join::join;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use lumask_core::animation::{Pulse, Wave};
    use lumask_core::config::BusyPolicy;
    use lumask_core::{DecorationStyle, DisplayMode, DISPLAY_ROWS};
    use lumask_protocol::Opcode;

    type Controller = MaskController<NoopRawMutex, MockTransport>;

    fn controller(wire: &Wire, config: MaskConfig) -> Controller {
        MaskController::new(MockTransport::new(wire).with_delay(0), config)
    }

    /// Controller whose frames take `ms` each
    fn slow_controller(wire: &Wire, ms: u64) -> Controller {
        MaskController::new(MockTransport::new(wire).with_delay(ms), MaskConfig::default())
    }

    fn playback(frames: u32, interval_ms: u64) -> Playback {
        Playback {
            frames,
            width: 8,
            interval: Duration::from_millis(interval_ms),
        }
    }

    /// Bytes carried by the `DATA` frames, in order
    fn uploaded(wire: &Wire) -> Vec<u8> {
        let mut bytes = Vec::new();
        for frame in wire.plaintext() {
            if Opcode::of(&frame) == Some(Opcode::Data) {
                bytes.extend_from_slice(&frame.body()[5..]);
            }
        }
        bytes
    }

    fn decorated(style: DecorationStyle) -> MaskConfig {
        let mut config = MaskConfig::default();
        config.scheme.decoration = Rgb::BLUE;
        config.scheme.style = style;
        config
    }

    #[test]
    fn test_show_text_commits() {
        let wire = Wire::default();
        let config = MaskConfig::default();
        let ctrl = controller(&wire, config);

        let report = block_on(ctrl.show_text("HI")).unwrap();

        assert_eq!(report.outcome, UploadOutcome::Committed);
        let width = config.text.measure("HI");
        assert_eq!(uploaded(&wire).len(), 3 * DISPLAY_ROWS * width);
        assert_eq!(wire.count(Opcode::Commit), 1);
        assert_eq!(ctrl.connection_status().sessions_committed, 1);
    }

    #[test]
    fn test_header_follows_config() {
        let wire = Wire::default();
        let mut config = MaskConfig::default();
        config.display.brightness = 33;
        config.display.mode = DisplayMode::Blink;
        let ctrl = controller(&wire, config);

        block_on(ctrl.show_text("A")).unwrap();

        let frames = wire.plaintext();
        assert_eq!(frames[0].body(), b"LIGHT\x21");
        assert_eq!(frames[2].body(), &[b'M', b'O', b'D', b'E', DisplayMode::Blink.to_byte()]);
    }

    #[test]
    fn test_no_decoration_never_uses_decoration_color() {
        let wire = Wire::default();
        let ctrl = controller(&wire, decorated(DecorationStyle::None));

        block_on(ctrl.show_text("WAVE")).unwrap();

        let bytes = uploaded(&wire);
        assert!(!bytes.is_empty());
        assert!(bytes
            .chunks_exact(3)
            .all(|rgb| rgb != Rgb::BLUE.to_bytes().as_slice()));
    }

    #[test]
    fn test_decoration_color_reaches_device() {
        let wire = Wire::default();
        let ctrl = controller(&wire, decorated(DecorationStyle::Lines));

        block_on(ctrl.show_text("A")).unwrap();

        // Row 0 of column 0 is on the top line
        let bytes = uploaded(&wire);
        assert_eq!(&bytes[..3], Rgb::BLUE.to_bytes().as_slice());
    }

    #[test]
    fn test_column_bitmap_format() {
        let wire = Wire::default();
        let mut config = MaskConfig::default();
        config.upload.format = PayloadFormat::ColumnBitmap;
        let ctrl = controller(&wire, config);

        block_on(ctrl.show_text("I")).unwrap();

        let width = config.text.measure("I");
        let start = wire.plaintext()[4];
        let total = (5 * width) as u16;
        let bitmap = (2 * width) as u16;
        assert_eq!(
            &start.body()[4..],
            &[
                (total >> 8) as u8,
                total as u8,
                (bitmap >> 8) as u8,
                bitmap as u8,
                0
            ]
        );
    }

    #[test]
    fn test_show_image() {
        let wire = Wire::default();
        let ctrl = controller(&wire, MaskConfig::default());
        let data = [255u8; 4 * 4];

        let report = block_on(ctrl.show_image(ImageSource::luma(4, 4, &data), Some(8))).unwrap();

        assert!(report.is_committed());
        assert_eq!(uploaded(&wire).len(), 3 * DISPLAY_ROWS * 8);
    }

    #[test]
    fn test_errors_are_wrapped() {
        let wire = Wire::default();
        let ctrl = controller(&wire, MaskConfig::default());

        assert_eq!(
            block_on(ctrl.show_text("")),
            Err(Error::Upload(UploadError::EmptyPayload))
        );

        let data = [0u8; 3];
        assert!(matches!(
            block_on(ctrl.show_image(ImageSource::luma(2, 2, &data), None)),
            Err(Error::Render(RenderError::InvalidImage))
        ));
        assert!(wire.frames().is_empty());
    }

    #[test]
    fn test_single_commands() {
        let wire = Wire::default();
        let ctrl = controller(&wire, MaskConfig::default());

        block_on(ctrl.set_brightness(150)).unwrap();
        block_on(ctrl.play_stored(2)).unwrap();
        block_on(ctrl.set_text_color(Rgb::new(9, 8, 7))).unwrap();

        let frames = wire.plaintext();
        assert_eq!(frames[0].body(), b"LIGHT\x64");
        assert_eq!(frames[1].body(), b"PLAY\x01\x02");
        assert_eq!(frames[2].body(), b"FC\x01\x09\x08\x07");
    }

    #[test]
    fn test_upload_settings_are_fixed() {
        let wire = Wire::default();
        let mut ctrl = controller(&wire, MaskConfig::default());

        let mut next = MaskConfig::default();
        next.upload.busy_policy = BusyPolicy::FailFast;
        next.display.speed = 9;
        ctrl.set_config(next);

        assert_eq!(ctrl.config().display.speed, 9);
        assert_eq!(ctrl.config().upload.busy_policy, BusyPolicy::Preempt);
        assert_eq!(ctrl.sequencer().config().busy_policy, BusyPolicy::Preempt);
    }

    #[test]
    fn test_animation_commits_each_frame() {
        let wire = Wire::default();
        let ctrl = controller(&wire, MaskConfig::default());
        let mut pulse = Pulse::default();

        let report = block_on(ctrl.play_animation(&mut pulse, playback(3, 0))).unwrap();

        assert_eq!(
            report,
            AnimationReport {
                frames_shown: 3,
                stopped: false
            }
        );
        assert_eq!(wire.count(Opcode::UploadStart), 3);
        assert_eq!(wire.count(Opcode::Commit), 3);
        assert_eq!(uploaded(&wire).len(), 3 * (3 * DISPLAY_ROWS * 8));

        // Every session runs to its commit before the next one starts
        let commits: Vec<usize> = wire
            .opcodes()
            .iter()
            .enumerate()
            .filter(|(_, op)| **op == Opcode::Commit)
            .map(|(i, _)| i)
            .collect();
        let starts: Vec<usize> = wire
            .opcodes()
            .iter()
            .enumerate()
            .filter(|(_, op)| **op == Opcode::UploadStart)
            .map(|(i, _)| i)
            .collect();
        assert!(starts[1] > commits[0] && starts[2] > commits[1]);
        assert_eq!(ctrl.connection_status().sessions_committed, 3);
    }

    #[test]
    fn test_animation_frames_follow_generator() {
        let wire = Wire::default();
        let ctrl = controller(&wire, MaskConfig::default());
        let mut expected = Pulse::default();
        let first = ctrl.encode(&expected.frame(0, 8).unwrap(), &ctrl.config().scheme);

        block_on(ctrl.play_animation(&mut Pulse::default(), playback(1, 0))).unwrap();

        assert_eq!(uploaded(&wire), first.as_bytes());
    }

    #[test]
    fn test_stop_animation_between_frames() {
        let wire = Wire::default();
        let ctrl = controller(&wire, MaskConfig::default());
        let mut wave = Wave::default();

        let (report, stop) = block_on(join(
            ctrl.play_animation(&mut wave, playback(1000, 5)),
            async {
                Timer::after_millis(20).await;
                ctrl.stop_animation().await
            },
        ));
        let report = report.unwrap();

        assert!(stop.is_ok());
        assert!(report.stopped);
        assert!(report.frames_shown > 0 && report.frames_shown < 1000);
        assert_eq!(wire.count(Opcode::Commit), report.frames_shown as usize);
        assert!(ctrl.connection_status().state.is_idle());
    }

    #[test]
    fn test_stop_animation_cancels_frame_in_flight() {
        let wire = Wire::default();
        let ctrl = slow_controller(&wire, 5);
        let mut pulse = Pulse::default();

        let (report, stop) = block_on(join(
            ctrl.play_animation(&mut pulse, playback(100, 0)),
            async {
                Timer::after_millis(30).await;
                ctrl.stop_animation().await
            },
        ));

        assert_eq!(stop, Ok(CancelOutcome::Cancelled(SessionId(1))));
        assert_eq!(
            report,
            Ok(AnimationReport {
                frames_shown: 0,
                stopped: true
            })
        );
        assert_eq!(wire.count(Opcode::Commit), 0);
        assert_eq!(ctrl.connection_status().sessions_cancelled, 1);
    }

    #[test]
    fn test_upload_replaces_animation() {
        let wire = Wire::default();
        let ctrl = slow_controller(&wire, 5);
        let mut pulse = Pulse::default();

        let (report, text) = block_on(join(
            ctrl.play_animation(&mut pulse, playback(100, 0)),
            async {
                Timer::after_millis(30).await;
                ctrl.show_text("HI").await
            },
        ));

        let report = report.unwrap();
        assert!(report.stopped);
        assert_eq!(report.frames_shown, 0);
        assert!(text.unwrap().is_committed());
        assert_eq!(wire.count(Opcode::Commit), 1);
    }

    #[test]
    fn test_stop_without_animation() {
        let wire = Wire::default();
        let ctrl = controller(&wire, MaskConfig::default());

        assert_eq!(block_on(ctrl.stop_animation()), Ok(CancelOutcome::Idle));
        assert!(wire.frames().is_empty());
    }

    #[test]
    fn test_animation_errors_end_playback() {
        let wire = Wire::default();
        let ctrl = controller(&wire, MaskConfig::default());
        let mut wave = Wave::default();

        let too_wide = Playback {
            width: lumask_core::MAX_COLUMNS + 1,
            ..playback(3, 0)
        };
        assert!(matches!(
            block_on(ctrl.play_animation(&mut wave, too_wide)),
            Err(Error::Render(RenderError::TooWide { .. }))
        ));

        block_on(ctrl.disconnect());
        assert_eq!(
            block_on(ctrl.play_animation(&mut wave, playback(3, 0))),
            Err(Error::Upload(UploadError::Transport(
                crate::transport::TransportError::Disconnected
            )))
        );
        assert_eq!(block_on(ctrl.stop_animation()), Ok(CancelOutcome::Idle));
    }

    #[test]
    fn test_disconnect() {
        let wire = Wire::default();
        let ctrl = controller(&wire, MaskConfig::default());

        block_on(ctrl.disconnect());

        assert!(wire.is_closed());
        assert!(!ctrl.connection_status().connected);
    }
}

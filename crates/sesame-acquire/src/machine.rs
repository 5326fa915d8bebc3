//! The acquisition state machine.
//!
//! One loop body serves all three modes. Recording modes allocate an
//! experiment, optionally wait for the trigger, and then run the same tick
//! until the target frame count is reached or the session is cancelled:
//!
//! ```text
//! Idle ─┬─ LiveDisplay ⇄ Paused ─────────────────────────────── Cancelled
//!       └─ [ArmedWaitingTrigger] ─ Recording ─┬─ Complete
//!                                             └─ Cancelled
//! ```

use crate::control::AcquisitionControl;
use crate::delivery::{AcquisitionChannels, StatusEvent};
use crate::device::{Camera, DeviceReport, DeviceStatus, TriggerDevice};
use crate::error::{AcquireResult, AcquisitionError, DeviceError, TriggerError};
use crate::fps::FpsWindow;
use crate::pacing::pacing_delay;
use crate::trigger::TriggerSynchronizer;
use chrono::Local;
use sesame_core::{
    fit_circle, FrameDescription, FrameEvent, FrameRate, HighRatePolicy, KeypointSet,
    PoseEstimator, RawImage, RecordingConfig, SesameConfig,
};
use sesame_record::{
    allocate, ExperimentHandle, RecordingSession, RecordingSummary, RecordingWorker,
    SessionWriters,
};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionMode {
    /// Continuous preview, nothing persisted.
    LiveDisplay,
    /// Record once the TTL trigger arms.
    Triggered,
    /// Record immediately.
    Manual,
}

impl AcquisitionMode {
    pub fn is_recording(self) -> bool {
        !matches!(self, Self::LiveDisplay)
    }
}

impl fmt::Display for AcquisitionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LiveDisplay => write!(f, "live display"),
            Self::Triggered => write!(f, "triggered"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionState {
    Idle,
    LiveDisplay,
    Paused,
    ArmedWaitingTrigger,
    Recording,
    Complete,
    Cancelled,
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    /// All target frames were recorded.
    Completed(RecordingSummary),
    /// Stopped early by request or by a device failure. Frames written so far
    /// stay on disk; `summary` is present for recording sessions.
    Cancelled {
        frames: u32,
        reason: String,
        summary: Option<RecordingSummary>,
    },
}

impl SessionOutcome {
    pub fn frames(&self) -> u32 {
        match self {
            Self::Completed(summary) => summary.frames_written,
            Self::Cancelled { frames, .. } => *frames,
        }
    }

    pub fn summary(&self) -> Option<&RecordingSummary> {
        match self {
            Self::Completed(summary) => Some(summary),
            Self::Cancelled { summary, .. } => summary.as_ref(),
        }
    }
}

/// Builds the writers for a newly allocated experiment.
pub type WriterFactory =
    Box<dyn Fn(&ExperimentHandle, &RecordingConfig, FrameRate, bool) -> SessionWriters + Send>;

/// Rate and preview decision for one session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatePlan {
    pub rate: FrameRate,
    pub preview: bool,
}

impl RatePlan {
    /// Apply the preview limit. Live display always caps; recording modes
    /// follow `policy`.
    pub fn resolve(mode: AcquisitionMode, requested: FrameRate, policy: HighRatePolicy) -> Self {
        if !requested.exceeds_preview_limit() {
            return Self {
                rate: requested,
                preview: true,
            };
        }
        match (mode, policy) {
            (AcquisitionMode::LiveDisplay, _) | (_, HighRatePolicy::CapRate) => Self {
                rate: requested.capped_for_preview(),
                preview: true,
            },
            (_, HighRatePolicy::DisablePreview) => Self {
                rate: requested,
                preview: false,
            },
        }
    }
}

enum Tick {
    Frame(Box<FrameEvent>),
    /// Snap timed out; no frame, no pacing wait.
    Skipped,
}

enum LoopEnd {
    Done,
    Cancelled(String),
}

/// Owns the devices and runs sessions on the calling thread.
pub struct Acquisition {
    camera: Box<dyn Camera>,
    trigger: Option<Box<dyn TriggerDevice>>,
    estimator: Option<Box<dyn PoseEstimator>>,
    config: SesameConfig,
    writers: WriterFactory,
}

impl Acquisition {
    pub fn new(camera: Box<dyn Camera>, config: SesameConfig) -> Self {
        Self {
            camera,
            trigger: None,
            estimator: None,
            config,
            writers: Box::new(SessionWriters::disk),
        }
    }

    pub fn with_trigger(mut self, trigger: Box<dyn TriggerDevice>) -> Self {
        self.trigger = Some(trigger);
        self
    }

    /// Estimator used when detection is enabled in the configuration.
    pub fn with_estimator(mut self, estimator: Box<dyn PoseEstimator>) -> Self {
        self.estimator = Some(estimator);
        self
    }

    pub fn with_writers(mut self, factory: WriterFactory) -> Self {
        self.writers = factory;
        self
    }

    pub fn config(&self) -> &SesameConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut SesameConfig {
        &mut self.config
    }

    pub fn device_status(&self) -> DeviceReport {
        DeviceReport {
            camera: DeviceStatus::from_valid(self.camera.is_valid()),
            trigger: DeviceStatus::from_valid(self.trigger.as_ref().is_some_and(|t| t.is_valid())),
        }
    }

    /// Run one session to completion or cancellation.
    ///
    /// Errors are returned only for failures before the first frame (devices,
    /// trigger precondition, directory allocation); anything after that ends
    /// the session as [`SessionOutcome::Cancelled`].
    pub fn run(
        &mut self,
        mode: AcquisitionMode,
        out: &AcquisitionChannels,
        control: &AcquisitionControl,
    ) -> AcquireResult<SessionOutcome> {
        if !self.camera.is_valid() {
            return Err(DeviceError::NotConnected("camera").into());
        }
        if mode.is_recording() && self.config.acquisition.frame_count == 0 {
            return Err(AcquisitionError::InvalidRequest(
                "frame count must be at least 1".into(),
            ));
        }

        let mut sync = None;
        if mode == AcquisitionMode::Triggered {
            let trigger = self
                .trigger
                .as_mut()
                .filter(|t| t.is_valid())
                .ok_or(DeviceError::NotConnected("trigger device"))?;
            let s = TriggerSynchronizer::new(self.config.trigger.clone());
            let sample = trigger
                .read(s.config().start_port, s.config().port_count)
                .map_err(TriggerError::from)?;
            s.check_precondition(&sample)?;
            sync = Some(s);
        }

        self.camera.start()?;
        let desc = self.camera.frame_description();

        let requested = self.config.acquisition.frame_rate;
        let plan = RatePlan::resolve(mode, requested, self.config.acquisition.high_rate_policy);
        if plan.rate != requested {
            warn!(%requested, effective = %plan.rate, "Frame rate capped for live preview");
            out.status(StatusEvent::RateCapped {
                requested,
                effective: plan.rate,
            });
        }
        if !plan.preview {
            warn!(rate = %plan.rate, "Recording without preview");
            out.status(StatusEvent::PreviewDisabled { rate: plan.rate });
        }
        info!(%mode, rate = %plan.rate, width = desc.width, height = desc.height, "Acquisition starting");

        let outcome = if mode.is_recording() {
            self.run_recording(sync, desc, plan, out, control)?
        } else {
            self.run_live(desc, plan, out, control)
        };

        let state = match outcome {
            SessionOutcome::Completed(_) => AcquisitionState::Complete,
            SessionOutcome::Cancelled { .. } => AcquisitionState::Cancelled,
        };
        info!(?state, frames = outcome.frames(), "Acquisition finished");
        out.status(StatusEvent::State(state));
        out.status(StatusEvent::Finished(outcome.clone()));
        Ok(outcome)
    }

    fn run_live(
        &mut self,
        desc: FrameDescription,
        plan: RatePlan,
        out: &AcquisitionChannels,
        control: &AcquisitionControl,
    ) -> SessionOutcome {
        out.status(StatusEvent::State(AcquisitionState::LiveDisplay));
        let mut fps = self.fps_window();
        let mut index = 0u32;
        let mut last_tick = None;

        let reason = loop {
            if control.is_cancelled() {
                break "cancelled".to_string();
            }
            if control.is_paused() {
                out.status(StatusEvent::State(AcquisitionState::Paused));
                if !control.wait_while_paused() {
                    break "cancelled".to_string();
                }
                out.status(StatusEvent::State(AcquisitionState::LiveDisplay));
                // The pause is not a frame interval
                last_tick = None;
            }

            let started = Instant::now();
            let event = match self.tick(index, desc, &mut fps, &mut last_tick, started) {
                Ok(Tick::Frame(event)) => event,
                Ok(Tick::Skipped) => continue,
                Err(e) => break e.to_string(),
            };
            out.frames.send_latest(*event);
            index = index.wrapping_add(1);

            if let Some(wait) = pacing_delay(started, plan.rate.period(), Instant::now()) {
                control.sleep(wait);
            }
        };

        SessionOutcome::Cancelled {
            frames: index,
            reason,
            summary: None,
        }
    }

    fn run_recording(
        &mut self,
        sync: Option<TriggerSynchronizer>,
        desc: FrameDescription,
        plan: RatePlan,
        out: &AcquisitionChannels,
        control: &AcquisitionControl,
    ) -> AcquireResult<SessionOutcome> {
        let recording = &self.config.recording;
        let target = self.config.acquisition.frame_count;
        let handle = allocate(&recording.parent_dir, &recording.experiment_name)?;
        out.status(StatusEvent::ExperimentCreated {
            name: handle.name().to_string(),
        });

        // Geometry rows only carry data when the estimator runs
        let detection = &self.config.detection;
        let writers = (self.writers)(
            &handle,
            recording,
            plan.rate,
            detection.enabled && detection.track_geometry,
        );
        let session = RecordingSession::new(handle, writers, target);
        let progress = out.clone();
        let worker = RecordingWorker::spawn(session, move |report| {
            for e in &report.errors {
                progress.status(StatusEvent::WriterFailed {
                    index: report.index,
                    writer: e.writer(),
                    message: e.to_string(),
                });
            }
            progress.status(StatusEvent::Progress {
                index: report.index,
                written: report.written,
                target: report.target,
            });
        })?;

        if let Some(mut sync) = sync {
            out.status(StatusEvent::State(AcquisitionState::ArmedWaitingTrigger));
            let armed = match self.trigger.as_mut() {
                Some(device) => sync.arm_device(device.as_mut(), control),
                None => Err(DeviceError::NotConnected("trigger device").into()),
            };
            if let Err(e) = armed {
                let summary = worker.finish()?;
                return Ok(SessionOutcome::Cancelled {
                    frames: 0,
                    reason: e.to_string(),
                    summary: Some(summary),
                });
            }
        }

        out.status(StatusEvent::State(AcquisitionState::Recording));
        let mut fps = self.fps_window();
        let mut index = 0u32;
        let mut last_tick = None;

        let end = loop {
            if control.is_cancelled() {
                break LoopEnd::Cancelled("cancelled".into());
            }

            let started = Instant::now();
            let event = match self.tick(index, desc, &mut fps, &mut last_tick, started) {
                Ok(Tick::Frame(event)) => event,
                Ok(Tick::Skipped) => continue,
                Err(e) => break LoopEnd::Cancelled(e.to_string()),
            };
            if plan.preview {
                out.frames.send_latest((*event).clone());
            }
            if let Err(e) = worker.submit(*event) {
                break LoopEnd::Cancelled(e.to_string());
            }
            index += 1;
            if index >= target {
                break LoopEnd::Done;
            }

            if let Some(wait) = pacing_delay(started, plan.rate.period(), Instant::now()) {
                control.sleep(wait);
            }
        };

        let summary = worker.finish()?;
        Ok(match end {
            LoopEnd::Done => SessionOutcome::Completed(summary),
            LoopEnd::Cancelled(reason) => {
                warn!(frames = index, %reason, "Recording cancelled");
                SessionOutcome::Cancelled {
                    frames: index,
                    reason,
                    summary: Some(summary),
                }
            }
        })
    }

    /// Snap, convert, detect and fit one frame.
    fn tick(
        &mut self,
        index: u32,
        desc: FrameDescription,
        fps: &mut FpsWindow,
        last_tick: &mut Option<Instant>,
        started: Instant,
    ) -> Result<Tick, AcquisitionError> {
        if !self.camera.snap(self.config.camera.snap_timeout()) {
            if !self.camera.is_valid() {
                return Err(DeviceError::NotConnected("camera").into());
            }
            debug!(index, "Snap timed out, skipping tick");
            return Ok(Tick::Skipped);
        }

        let raw = self.camera.get_frame()?;
        let image = RawImage::from_bgr(desc, &raw)
            .map_err(|e| DeviceError::Camera(e.to_string()))?;
        let wall_time = Local::now();

        let mut keypoints = KeypointSet::new();
        let mut geometry = None;
        if self.config.detection.enabled {
            if let Some(estimator) = self.estimator.as_mut() {
                match estimator.infer(&image) {
                    Ok(kps) => {
                        geometry = match fit_circle(&kps) {
                            Ok(g) => Some(g),
                            Err(e) => {
                                debug!(index, "No geometry: {}", e);
                                None
                            }
                        };
                        keypoints = kps;
                    }
                    Err(e) => warn!(index, "Pose estimation failed: {}", e),
                }
            }
        }

        let rate = match last_tick.replace(started) {
            Some(previous) => fps.push_sample(started.duration_since(previous).as_secs_f64()),
            // No interval yet on the first frame: report the seeded average
            None => fps.average(),
        };

        Ok(Tick::Frame(Box::new(FrameEvent {
            index,
            image: Arc::new(image),
            captured_at: started,
            wall_time,
            geometry,
            keypoints,
            fps: rate,
        })))
    }

    fn fps_window(&self) -> FpsWindow {
        FpsWindow::new(
            self.config.acquisition.fps_window,
            self.config.acquisition.fps_seed,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::channels;
    use crate::sim::{CircleEstimator, ScriptedTrigger, SimulatedCamera};
    use sesame_record::{PersistResult, VideoSink};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    struct CountingVideo(Arc<AtomicU32>);

    impl VideoSink for CountingVideo {
        fn write_video_frame(&mut self, _: &RawImage) -> PersistResult<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn config(parent: &std::path::Path, rate: f64, frames: u32) -> SesameConfig {
        let mut c = SesameConfig::default();
        c.acquisition.frame_rate = FrameRate::clamped(rate);
        c.acquisition.frame_count = frames;
        c.recording.parent_dir = parent.to_path_buf();
        c.camera.width = 32;
        c.camera.height = 24;
        c.trigger.poll_interval_ms = 0;
        c
    }

    fn camera() -> Box<SimulatedCamera> {
        Box::new(SimulatedCamera::new(32, 24))
    }

    fn counting(frames: Arc<AtomicU32>) -> WriterFactory {
        Box::new(
            move |_: &ExperimentHandle, _: &RecordingConfig, _: FrameRate, _: bool| {
                SessionWriters::none().with_video(CountingVideo(frames.clone()))
            },
        )
    }

    #[test]
    fn test_rate_plan() {
        let fast = FrameRate::clamped(25.0);
        let p = RatePlan::resolve(AcquisitionMode::Manual, fast, HighRatePolicy::CapRate);
        assert_eq!(p.rate, FrameRate::FPS_15);
        assert!(p.preview);
        let p = RatePlan::resolve(AcquisitionMode::Triggered, fast, HighRatePolicy::DisablePreview);
        assert_eq!(p.rate, fast);
        assert!(!p.preview);
        let p = RatePlan::resolve(AcquisitionMode::LiveDisplay, fast, HighRatePolicy::DisablePreview);
        assert_eq!(p.rate, FrameRate::FPS_15);
        let p = RatePlan::resolve(AcquisitionMode::Manual, FrameRate::FPS_2, HighRatePolicy::DisablePreview);
        assert!(p.preview);
    }

    #[test]
    fn test_manual_records_target_frames() {
        let tmp = tempfile::tempdir().expect("failed to create tempdir");
        let frames = Arc::new(AtomicU32::new(0));
        let mut acq = Acquisition::new(camera(), config(tmp.path(), 25.0, 6))
            .with_writers(counting(frames.clone()));
        let (tx, rx) = channels();

        let outcome = acq
            .run(AcquisitionMode::Manual, &tx, &AcquisitionControl::new())
            .unwrap();
        assert!(matches!(outcome, SessionOutcome::Completed(_)));
        assert_eq!(outcome.frames(), 6);
        assert_eq!(frames.load(Ordering::SeqCst), 6);

        let events: Vec<StatusEvent> = rx.status.try_iter().collect();
        assert!(events
            .iter()
            .any(|e| matches!(e, StatusEvent::RateCapped { .. })));
        let progress = events
            .iter()
            .filter(|e| matches!(e, StatusEvent::Progress { .. }))
            .count();
        assert_eq!(progress, 6);
        assert!(matches!(events.last(), Some(StatusEvent::Finished(_))));
    }

    #[test]
    fn test_snap_failures_are_skipped() {
        let tmp = tempfile::tempdir().expect("failed to create tempdir");
        let frames = Arc::new(AtomicU32::new(0));
        let cam = Box::new(SimulatedCamera::new(32, 24).fail_every(3));
        let mut acq = Acquisition::new(cam, config(tmp.path(), 29.0, 5))
            .with_writers(counting(frames.clone()));
        let (tx, _rx) = channels();
        let outcome = acq
            .run(AcquisitionMode::Manual, &tx, &AcquisitionControl::new())
            .unwrap();
        assert_eq!(outcome.frames(), 5);
        assert_eq!(frames.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_disconnect_mid_recording_cancels() {
        let tmp = tempfile::tempdir().expect("failed to create tempdir");
        let frames = Arc::new(AtomicU32::new(0));
        let cam = Box::new(SimulatedCamera::new(32, 24).disconnect_after(3));
        let mut acq = Acquisition::new(cam, config(tmp.path(), 29.0, 10))
            .with_writers(counting(frames.clone()));
        let (tx, _rx) = channels();
        let outcome = acq
            .run(AcquisitionMode::Manual, &tx, &AcquisitionControl::new())
            .unwrap();
        match outcome {
            SessionOutcome::Cancelled {
                frames: n, summary, ..
            } => {
                assert_eq!(n, 3);
                assert_eq!(summary.unwrap().frames_written, 3);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(frames.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_triggered_waits_for_trigger() {
        let tmp = tempfile::tempdir().expect("failed to create tempdir");
        let frames = Arc::new(AtomicU32::new(0));
        let trigger = ScriptedTrigger::idle_then_asserted(254, 255, 40);
        let mut acq = Acquisition::new(camera(), config(tmp.path(), 29.0, 4))
            .with_trigger(Box::new(trigger))
            .with_writers(counting(frames.clone()));
        let (tx, rx) = channels();
        let outcome = acq
            .run(AcquisitionMode::Triggered, &tx, &AcquisitionControl::new())
            .unwrap();
        assert_eq!(outcome.frames(), 4);

        let states: Vec<AcquisitionState> = rx
            .status
            .try_iter()
            .filter_map(|e| match e {
                StatusEvent::State(s) => Some(s),
                _ => None,
            })
            .collect();
        assert_eq!(
            states,
            vec![
                AcquisitionState::ArmedWaitingTrigger,
                AcquisitionState::Recording,
                AcquisitionState::Complete
            ]
        );
    }

    #[test]
    fn test_triggered_rejects_asserted_line() {
        let tmp = tempfile::tempdir().expect("failed to create tempdir");
        let trigger = ScriptedTrigger::constant(255);
        let mut acq = Acquisition::new(camera(), config(tmp.path(), 2.0, 4))
            .with_trigger(Box::new(trigger));
        let (tx, _rx) = channels();
        let err = acq
            .run(AcquisitionMode::Triggered, &tx, &AcquisitionControl::new())
            .unwrap_err();
        assert!(matches!(
            err,
            AcquisitionError::Trigger(TriggerError::AlreadyAsserted { code: 255 })
        ));
        // No experiment directory was created
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_triggered_without_device() {
        let tmp = tempfile::tempdir().expect("failed to create tempdir");
        let mut acq = Acquisition::new(camera(), config(tmp.path(), 2.0, 4));
        let (tx, _rx) = channels();
        assert!(matches!(
            acq.run(AcquisitionMode::Triggered, &tx, &AcquisitionControl::new()),
            Err(AcquisitionError::Device(DeviceError::NotConnected(_)))
        ));
    }

    #[test]
    fn test_cancel_during_trigger_wait() {
        let tmp = tempfile::tempdir().expect("failed to create tempdir");
        let frames = Arc::new(AtomicU32::new(0));
        let trigger = ScriptedTrigger::constant(254);
        let mut acq = Acquisition::new(camera(), config(tmp.path(), 2.0, 4))
            .with_trigger(Box::new(trigger))
            .with_writers(counting(frames.clone()));
        acq.config_mut().trigger.poll_interval_ms = 1;
        let (tx, _rx) = channels();
        let control = AcquisitionControl::new();
        let canceller = control.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            canceller.cancel();
        });
        let outcome = acq.run(AcquisitionMode::Triggered, &tx, &control).unwrap();
        assert!(matches!(outcome, SessionOutcome::Cancelled { frames: 0, .. }));
        assert_eq!(frames.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_live_display_with_detection() {
        let tmp = tempfile::tempdir().expect("failed to create tempdir");
        let mut cfg = config(tmp.path(), 29.0, 1);
        cfg.detection.enabled = true;
        let mut acq = Acquisition::new(Box::new(SimulatedCamera::new(64, 48)), cfg)
            .with_estimator(Box::new(CircleEstimator::default()));
        let (tx, rx) = channels();
        let control = AcquisitionControl::new();

        let handle = {
            let control = control.clone();
            std::thread::spawn(move || acq.run(AcquisitionMode::LiveDisplay, &tx, &control))
        };
        let frame = rx.frames.recv_timeout(Duration::from_secs(5)).unwrap();
        control.cancel();
        let outcome = handle.join().unwrap().unwrap();

        assert!(matches!(outcome, SessionOutcome::Cancelled { summary: None, .. }));
        let geometry = frame.geometry.expect("simulated pupil should fit");
        assert!(geometry.diameter > 4.0);
        assert_eq!(frame.image.width, 64);
        // Nothing was written in live mode
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_first_frame_reports_seed_rate() {
        let tmp = tempfile::tempdir().expect("failed to create tempdir");
        let mut cfg = config(tmp.path(), 29.0, 1);
        cfg.acquisition.fps_seed = 12.5;
        cfg.acquisition.fps_window = 4;
        let mut acq = Acquisition::new(camera(), cfg);
        acq.camera.start().unwrap();
        let desc = acq.camera.frame_description();
        let mut fps = acq.fps_window();
        let mut last_tick = None;

        let t0 = Instant::now();
        let first = match acq.tick(0, desc, &mut fps, &mut last_tick, t0) {
            Ok(Tick::Frame(event)) => event,
            _ => panic!("first tick produced no frame"),
        };
        assert_eq!(first.fps, 12.5);

        // A 50 ms interval is 20 fps, averaged with three seeded samples
        let t1 = t0 + Duration::from_millis(50);
        let second = match acq.tick(1, desc, &mut fps, &mut last_tick, t1) {
            Ok(Tick::Frame(event)) => event,
            _ => panic!("second tick produced no frame"),
        };
        assert!((second.fps - (12.5 * 3.0 + 20.0) / 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_device_status() {
        let acq = Acquisition::new(camera(), SesameConfig::default());
        assert_eq!(acq.device_status().camera, DeviceStatus::Connected);
        assert_eq!(acq.device_status().trigger, DeviceStatus::Disconnected);
        let acq = acq.with_trigger(Box::new(ScriptedTrigger::constant(254)));
        assert!(acq.device_status().trigger.is_connected());
    }
}

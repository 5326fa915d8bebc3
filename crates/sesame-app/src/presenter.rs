//! Headless presenter: drains the frame and status channels and logs them.

use crossbeam_channel::select;
use sesame_acquire::{PresenterChannels, SessionOutcome, StatusEvent};
use sesame_record::progress_label;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const REPORT_EVERY: Duration = Duration::from_secs(1);

/// What the presenter saw before the channels closed.
#[derive(Debug, Default)]
pub struct Presented {
    pub frames: u64,
    pub outcome: Option<SessionOutcome>,
    pub failure: Option<String>,
}

pub fn spawn(channels: PresenterChannels, fit_threshold: f64) -> std::io::Result<JoinHandle<Presented>> {
    std::thread::Builder::new()
        .name("sesame-presenter".into())
        .spawn(move || present(channels, fit_threshold))
}

fn present(channels: PresenterChannels, fit_threshold: f64) -> Presented {
    let mut seen = Presented::default();
    let mut last_report = Instant::now();
    let PresenterChannels { frames, status } = channels;

    loop {
        select! {
            recv(frames) -> msg => {
                let Ok(event) = msg else { break };
                seen.frames += 1;
                let outline = event.overlay(fit_threshold).is_some();
                debug!(index = event.index, fps = event.fps, outline, "Frame");
                if last_report.elapsed() >= REPORT_EVERY {
                    last_report = Instant::now();
                    match &event.geometry {
                        Some(g) => info!(
                            index = event.index,
                            fps = event.fps,
                            center_x = g.center.0,
                            center_y = g.center.1,
                            diameter = g.diameter,
                            confidence = g.confidence,
                            "Pupil"
                        ),
                        None => info!(index = event.index, fps = event.fps, "No pupil"),
                    }
                }
            }
            recv(status) -> msg => {
                let Ok(event) = msg else { break };
                match event {
                    StatusEvent::State(state) => info!(?state, "State"),
                    StatusEvent::RateCapped { requested, effective } => {
                        warn!(%requested, %effective, "Rate lowered to keep the preview")
                    }
                    StatusEvent::PreviewDisabled { rate } => {
                        warn!(%rate, "Recording without preview")
                    }
                    StatusEvent::ExperimentCreated { name } => info!(%name, "Experiment created"),
                    StatusEvent::Progress { written, target, .. } => {
                        debug!("{}", progress_label(written, target))
                    }
                    StatusEvent::WriterFailed { index, writer, message } => {
                        warn!(index, ?writer, "Write failed: {}", message)
                    }
                    StatusEvent::Finished(outcome) => {
                        seen.outcome = Some(outcome);
                        break;
                    }
                    StatusEvent::Failed(message) => {
                        seen.failure = Some(message);
                        break;
                    }
                }
            }
        }
    }
    seen
}

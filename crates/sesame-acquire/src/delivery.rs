//! Channels between the acquisition thread and the presentation side.
//!
//! Frames travel on a depth-1 channel where a new frame replaces one the
//! consumer has not picked up yet, so the preview always shows the latest
//! frame and never slows acquisition. Lifecycle events travel on their own
//! unbounded channel and are never dropped.

use crate::machine::{AcquisitionState, SessionOutcome};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use sesame_core::{FrameEvent, FrameRate};
use sesame_record::WriterKind;
use tracing::debug;

/// Lifecycle notifications from the acquisition thread.
#[derive(Debug)]
pub enum StatusEvent {
    State(AcquisitionState),
    /// The requested rate was lowered so the preview can follow.
    RateCapped { requested: FrameRate, effective: FrameRate },
    /// Recording continues at full rate without preview.
    PreviewDisabled { rate: FrameRate },
    /// A recording directory was allocated.
    ExperimentCreated { name: String },
    /// A frame reached disk; `written` of `target` are done.
    Progress { index: u32, written: u32, target: u32 },
    WriterFailed { index: u32, writer: WriterKind, message: String },
    Finished(SessionOutcome),
    /// The session ended with an error before or outside the frame loop.
    Failed(String),
}

/// Producer half of the preview channel.
#[derive(Debug, Clone)]
pub struct FrameSender {
    tx: Sender<FrameEvent>,
    // Lets the producer discard a frame the consumer has not taken yet.
    stale: Receiver<FrameEvent>,
}

impl FrameSender {
    /// Publish `event`, replacing an unconsumed frame. Never blocks.
    pub fn send_latest(&self, event: FrameEvent) -> bool {
        let mut event = event;
        loop {
            match self.tx.try_send(event) {
                Ok(()) => return true,
                Err(TrySendError::Full(back)) => {
                    if let Ok(old) = self.stale.try_recv() {
                        debug!(index = old.index, "Preview frame replaced");
                    }
                    event = back;
                }
                Err(TrySendError::Disconnected(_)) => return false,
            }
        }
    }
}

/// Producer side handed to the acquisition thread.
#[derive(Debug, Clone)]
pub struct AcquisitionChannels {
    pub frames: FrameSender,
    status: Sender<StatusEvent>,
}

impl AcquisitionChannels {
    pub fn status(&self, event: StatusEvent) {
        // A presenter that has gone away just stops receiving.
        let _ = self.status.send(event);
    }
}

/// Consumer side for the presenter.
#[derive(Debug)]
pub struct PresenterChannels {
    pub frames: Receiver<FrameEvent>,
    pub status: Receiver<StatusEvent>,
}

pub fn channels() -> (AcquisitionChannels, PresenterChannels) {
    let (frame_tx, frame_rx) = bounded(1);
    let (status_tx, status_rx) = unbounded();
    (
        AcquisitionChannels {
            frames: FrameSender {
                tx: frame_tx,
                stale: frame_rx.clone(),
            },
            status: status_tx,
        },
        PresenterChannels {
            frames: frame_rx,
            status: status_rx,
        },
    )
}

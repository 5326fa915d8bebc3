//! Ordered persistence worker.
//!
//! Frames are handed over a depth-1 bounded channel with a blocking send: a
//! slow disk applies backpressure to the acquisition loop but a frame is
//! never dropped, and a single consumer keeps writes in index order.

use crate::error::{PersistResult, PersistenceError};
use crate::session::{RecordingSession, RecordingSummary, SaveReport};
use crossbeam_channel::{bounded, Sender};
use sesame_core::FrameEvent;
use std::thread::JoinHandle;
use tracing::{info, warn};

pub struct RecordingWorker {
    sender: Option<Sender<FrameEvent>>,
    handle: Option<JoinHandle<RecordingSummary>>,
}

impl RecordingWorker {
    /// Start the worker thread. `on_saved` runs on that thread after every
    /// frame.
    pub fn spawn<F>(mut session: RecordingSession, mut on_saved: F) -> PersistResult<Self>
    where
        F: FnMut(&SaveReport) + Send + 'static,
    {
        let (sender, receiver) = bounded::<FrameEvent>(1);
        let experiment = session.handle().name().to_string();

        let handle = std::thread::Builder::new()
            .name("sesame-recorder".into())
            .spawn(move || {
                info!(experiment = %experiment, "Recording worker started");
                while let Ok(event) = receiver.recv() {
                    let report = session.save_frame(&event);
                    on_saved(&report);
                }
                session.close()
            })?;

        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    /// Queue a frame, blocking while the previous one is still being written.
    pub fn submit(&self, event: FrameEvent) -> PersistResult<()> {
        let sender = self.sender.as_ref().ok_or(PersistenceError::WorkerGone)?;
        sender.send(event).map_err(|_| PersistenceError::WorkerGone)
    }

    /// Drain the queue, close the session and return its summary.
    pub fn finish(mut self) -> PersistResult<RecordingSummary> {
        self.shutdown().ok_or(PersistenceError::WorkerGone)
    }

    fn shutdown(&mut self) -> Option<RecordingSummary> {
        drop(self.sender.take());
        let handle = self.handle.take()?;
        match handle.join() {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!("Recording worker panicked: {:?}", e);
                None
            }
        }
    }
}

impl Drop for RecordingWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

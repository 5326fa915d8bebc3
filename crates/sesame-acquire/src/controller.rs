//! Runs the acquisition on its own thread.
//!
//! Only one session may hold the devices at a time. Starting a new session
//! cancels the running one and waits, bounded, for its thread to hand the
//! devices back.

use crate::control::AcquisitionControl;
use crate::delivery::{AcquisitionChannels, StatusEvent};
use crate::device::DeviceReport;
use crate::error::{AcquireResult, AcquisitionError};
use crate::machine::{Acquisition, AcquisitionMode, SessionOutcome};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{info, warn};

type Finished = (Acquisition, AcquireResult<SessionOutcome>);

struct Running {
    mode: AcquisitionMode,
    control: AcquisitionControl,
    done: Receiver<Finished>,
    handle: JoinHandle<()>,
}

pub struct AcquisitionController {
    idle: Option<Acquisition>,
    running: Option<Running>,
    channels: AcquisitionChannels,
    shutdown_timeout: Duration,
}

impl AcquisitionController {
    pub fn new(acquisition: Acquisition, channels: AcquisitionChannels) -> Self {
        let shutdown_timeout = acquisition.config().acquisition.shutdown_timeout();
        Self {
            idle: Some(acquisition),
            running: None,
            channels,
            shutdown_timeout,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|r| !r.handle.is_finished())
    }

    pub fn mode(&self) -> Option<AcquisitionMode> {
        self.running.as_ref().map(|r| r.mode)
    }

    /// Device connectivity; `None` while a session holds the devices.
    pub fn device_status(&self) -> Option<DeviceReport> {
        self.idle.as_ref().map(Acquisition::device_status)
    }

    /// Configuration access while idle.
    pub fn acquisition_mut(&mut self) -> Option<&mut Acquisition> {
        self.idle.as_mut()
    }

    /// Start a session, stopping any running one first. The outcome of the
    /// stopped session is returned.
    pub fn start(&mut self, mode: AcquisitionMode) -> AcquireResult<Option<AcquireResult<SessionOutcome>>> {
        let previous = self.stop()?;
        let mut acquisition = self.idle.take().ok_or(AcquisitionError::DeviceBusy)?;

        let control = AcquisitionControl::new();
        let (done_tx, done) = bounded::<Finished>(1);
        let channels = self.channels.clone();
        let thread_control = control.clone();

        let spawned = std::thread::Builder::new()
            .name("sesame-acquire".into())
            .spawn(move || {
                let result = acquisition.run(mode, &channels, &thread_control);
                if let Err(e) = &result {
                    warn!(%mode, "Acquisition failed: {}", e);
                    channels.status(StatusEvent::Failed(e.to_string()));
                }
                let _ = done_tx.send((acquisition, result));
            });

        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => return Err(AcquisitionError::Spawn(e)),
        };
        info!(%mode, "Acquisition thread started");
        self.running = Some(Running {
            mode,
            control,
            done,
            handle,
        });
        Ok(previous)
    }

    pub fn pause(&self) {
        if let Some(r) = &self.running {
            r.control.pause();
        }
    }

    pub fn resume(&self) {
        if let Some(r) = &self.running {
            r.control.resume();
        }
    }

    /// Request cancellation without waiting.
    pub fn cancel(&self) {
        if let Some(r) = &self.running {
            r.control.cancel();
        }
    }

    /// Cancel the running session and wait for it, bounded by the shutdown
    /// timeout. `Ok(None)` if nothing was running.
    pub fn stop(&mut self) -> AcquireResult<Option<AcquireResult<SessionOutcome>>> {
        match &self.running {
            Some(r) => r.control.cancel(),
            None => return Ok(None),
        }
        self.collect(Some(self.shutdown_timeout))
    }

    /// Wait for the running session to end on its own.
    pub fn wait(&mut self) -> AcquireResult<Option<AcquireResult<SessionOutcome>>> {
        if self.running.is_none() {
            return Ok(None);
        }
        self.collect(None)
    }

    fn collect(
        &mut self,
        timeout: Option<Duration>,
    ) -> AcquireResult<Option<AcquireResult<SessionOutcome>>> {
        let Some(running) = self.running.take() else {
            return Ok(None);
        };

        let received = match timeout {
            Some(t) => running.done.recv_timeout(t),
            None => running.done.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok((acquisition, result)) => {
                if running.handle.join().is_err() {
                    warn!("Acquisition thread panicked after finishing");
                }
                self.idle = Some(acquisition);
                info!(mode = %running.mode, "Acquisition thread joined");
                Ok(Some(result))
            }
            Err(RecvTimeoutError::Timeout) => {
                let waited = timeout.unwrap_or_default();
                warn!(?waited, "Acquisition thread did not stop in time");
                // Keep the handle so a later stop can still reclaim the devices
                self.running = Some(running);
                Err(AcquisitionError::ShutdownTimeout(waited))
            }
            Err(RecvTimeoutError::Disconnected) => {
                warn!("Acquisition thread ended without returning the devices");
                let _ = running.handle.join();
                Err(AcquisitionError::DeviceBusy)
            }
        }
    }
}

impl Drop for AcquisitionController {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("Acquisition shutdown on drop failed: {}", e);
        }
    }
}

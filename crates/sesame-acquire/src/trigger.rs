//! TTL trigger synchronization.
//!
//! The line is polled and each sample normalized against the idle code.
//! Arming needs two things at once: the current sample reads asserted, and
//! enough of the recent window reads asserted too. A single bounce or noise
//! pulse therefore never starts a recording.

use crate::control::AcquisitionControl;
use crate::device::TriggerDevice;
use crate::error::{DeviceError, TriggerError};
use sesame_core::TriggerConfig;
use tracing::{debug, info};

/// Debounce state for one trigger line.
#[derive(Debug, Clone)]
pub struct TriggerSynchronizer {
    config: TriggerConfig,
    ring: Vec<bool>,
    next: usize,
    on_count: usize,
    armed: bool,
}

impl TriggerSynchronizer {
    pub fn new(config: TriggerConfig) -> Self {
        let window = config.window.max(1);
        Self {
            config,
            ring: vec![false; window],
            next: 0,
            on_count: 0,
            armed: false,
        }
    }

    pub fn config(&self) -> &TriggerConfig {
        &self.config
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Asserted samples currently in the window.
    pub fn on_count(&self) -> usize {
        self.on_count
    }

    /// Raw code minus the idle code.
    pub fn normalize(&self, raw: u8) -> i16 {
        raw as i16 - self.config.idle_code as i16
    }

    fn is_on(&self, raw: u8) -> bool {
        self.normalize(raw) == self.normalize(self.config.asserted_code)
    }

    /// Clear the window and disarm.
    pub fn reset(&mut self) {
        self.ring.iter_mut().for_each(|s| *s = false);
        self.next = 0;
        self.on_count = 0;
        self.armed = false;
    }

    /// Fail if the line already reads asserted before arming.
    pub fn check_precondition(&self, sample: &[u8]) -> Result<(), TriggerError> {
        let raw = first_code(sample)?;
        if self.is_on(raw) {
            return Err(TriggerError::AlreadyAsserted { code: raw });
        }
        Ok(())
    }

    /// Feed one sample. Returns `true` once armed.
    pub fn push(&mut self, raw: u8) -> bool {
        let on = self.is_on(raw);
        if self.ring[self.next] {
            self.on_count -= 1;
        }
        self.ring[self.next] = on;
        if on {
            self.on_count += 1;
        }
        self.next = (self.next + 1) % self.ring.len();

        if on && self.on_count >= self.config.confirm_threshold {
            self.armed = true;
        }
        self.armed
    }

    /// Poll `read` until the trigger arms or `control` is cancelled. The wait
    /// is unbounded otherwise.
    pub fn arm_and_wait<F>(&mut self, mut read: F, control: &AcquisitionControl) -> Result<u64, TriggerError>
    where
        F: FnMut() -> Result<Vec<u8>, DeviceError>,
    {
        self.reset();
        let poll = self.config.poll_interval();
        let mut samples = 0u64;
        info!(
            port = self.config.start_port,
            threshold = self.config.confirm_threshold,
            window = self.ring.len(),
            "Waiting for trigger"
        );

        loop {
            if control.is_cancelled() {
                debug!(samples, "Trigger wait cancelled");
                return Err(TriggerError::Cancelled);
            }
            let raw = first_code(&read()?)?;
            samples += 1;
            if self.push(raw) {
                info!(samples, on = self.on_count, "Trigger armed");
                return Ok(samples);
            }
            if !poll.is_zero() && !control.sleep(poll) {
                return Err(TriggerError::Cancelled);
            }
        }
    }

    /// [`arm_and_wait`](Self::arm_and_wait) against a trigger device on the
    /// configured ports.
    pub fn arm_device(
        &mut self,
        device: &mut dyn TriggerDevice,
        control: &AcquisitionControl,
    ) -> Result<u64, TriggerError> {
        let (port, count) = (self.config.start_port, self.config.port_count);
        self.arm_and_wait(|| device.read(port, count), control)
    }
}

fn first_code(sample: &[u8]) -> Result<u8, TriggerError> {
    sample
        .first()
        .copied()
        .ok_or_else(|| DeviceError::TriggerRead("empty sample".into()).into())
}

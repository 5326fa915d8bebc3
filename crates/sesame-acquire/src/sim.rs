//! Simulated devices for running the pipeline without hardware.

use crate::device::{Camera, TriggerDevice};
use crate::error::DeviceError;
use sesame_core::{
    FrameDescription, Keypoint, KeypointSet, PoseEstimator, RawImage, Result as CoreResult,
};
use std::collections::VecDeque;
use std::f64::consts::TAU;
use std::time::Duration;

/// Channel value below which a pixel counts as pupil.
const DARK_LEVEL: u8 = 40;

/// Renders a dark, slowly drifting pupil disc on a colour gradient and hands
/// it out as BGR, like a real driver.
#[derive(Debug, Clone)]
pub struct SimulatedCamera {
    desc: FrameDescription,
    valid: bool,
    started: bool,
    snaps: u64,
    delivered: u64,
    fail_every: Option<u64>,
    disconnect_after: Option<u64>,
}

impl SimulatedCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            desc: FrameDescription::new(width, height, 24),
            valid: true,
            started: false,
            snaps: 0,
            delivered: 0,
            fail_every: None,
            disconnect_after: None,
        }
    }

    /// Every `n`th snap times out.
    pub fn fail_every(mut self, n: u64) -> Self {
        self.fail_every = Some(n.max(2));
        self
    }

    /// The camera drops off the bus after `n` frames.
    pub fn disconnect_after(mut self, n: u64) -> Self {
        self.disconnect_after = Some(n);
        self
    }

    /// A camera that was never connected.
    pub fn disconnected(mut self) -> Self {
        self.valid = false;
        self
    }

    /// Pupil centre and radius for frame `n`.
    pub fn pupil_at(&self, n: u64) -> ((f64, f64), f64) {
        let (w, h) = (self.desc.width as f64, self.desc.height as f64);
        let t = n as f64;
        let center = (w / 2.0 + w / 10.0 * (t * 0.3).sin(), h / 2.0 + h / 12.0 * (t * 0.2).cos());
        let radius = w.min(h) / 6.0 * (1.0 + 0.2 * (t * 0.7).sin());
        (center, radius)
    }

    fn render(&self, n: u64) -> Vec<u8> {
        let FrameDescription { width, height, .. } = self.desc;
        let ((cx, cy), r) = self.pupil_at(n);
        let mut bgr = Vec::with_capacity(self.desc.buffer_size());
        for y in 0..height {
            for x in 0..width {
                let (dx, dy) = (x as f64 + 0.5 - cx, y as f64 + 0.5 - cy);
                if dx * dx + dy * dy <= r * r {
                    bgr.extend_from_slice(&[12, 10, 8]);
                } else {
                    let b = (x * 255 / width.max(1)) as u8;
                    let g = (y * 255 / height.max(1)) as u8;
                    bgr.extend_from_slice(&[b, g, 180]);
                }
            }
        }
        bgr
    }
}

impl Camera for SimulatedCamera {
    fn start(&mut self) -> Result<(), DeviceError> {
        if !self.valid {
            return Err(DeviceError::NotConnected("camera"));
        }
        self.started = true;
        Ok(())
    }

    fn snap(&mut self, _timeout: Duration) -> bool {
        if !self.valid || !self.started {
            return false;
        }
        if self.disconnect_after.is_some_and(|n| self.delivered >= n) {
            self.valid = false;
            return false;
        }
        self.snaps += 1;
        !self.fail_every.is_some_and(|k| self.snaps % k == 0)
    }

    fn frame_description(&self) -> FrameDescription {
        self.desc
    }

    fn get_frame(&mut self) -> Result<Vec<u8>, DeviceError> {
        if !self.valid {
            return Err(DeviceError::NotConnected("camera"));
        }
        let frame = self.render(self.delivered);
        self.delivered += 1;
        Ok(frame)
    }

    fn is_valid(&self) -> bool {
        self.valid
    }
}

/// Trigger line that plays back a script of codes, then holds a final code.
#[derive(Debug, Clone)]
pub struct ScriptedTrigger {
    script: VecDeque<u8>,
    tail: u8,
}

impl ScriptedTrigger {
    pub fn new(script: impl IntoIterator<Item = u8>, tail: u8) -> Self {
        Self {
            script: script.into_iter().collect(),
            tail,
        }
    }

    pub fn constant(code: u8) -> Self {
        Self::new([], code)
    }

    /// `idle_samples` idle reads, then asserted forever.
    pub fn idle_then_asserted(idle: u8, asserted: u8, idle_samples: usize) -> Self {
        Self::new(std::iter::repeat(idle).take(idle_samples), asserted)
    }
}

impl TriggerDevice for ScriptedTrigger {
    fn read(&mut self, _start_port: u8, port_count: u8) -> Result<Vec<u8>, DeviceError> {
        let code = self.script.pop_front().unwrap_or(self.tail);
        Ok(vec![code; port_count.max(1) as usize])
    }
}

/// Finds the dark pupil blob and reports key points around its edge.
#[derive(Debug, Clone)]
pub struct CircleEstimator {
    pub points: usize,
    pub probability: f64,
}

impl Default for CircleEstimator {
    fn default() -> Self {
        Self {
            points: 8,
            probability: 0.95,
        }
    }
}

impl PoseEstimator for CircleEstimator {
    fn infer(&mut self, image: &RawImage) -> CoreResult<KeypointSet> {
        let (mut sx, mut sy, mut area) = (0.0, 0.0, 0usize);
        for y in 0..image.height {
            for x in 0..image.width {
                if image.pixel(x, y).iter().all(|&c| c < DARK_LEVEL) {
                    sx += x as f64 + 0.5;
                    sy += y as f64 + 0.5;
                    area += 1;
                }
            }
        }
        if area < 3 {
            return Ok(KeypointSet::new());
        }

        let (cx, cy) = (sx / area as f64, sy / area as f64);
        let r = (area as f64 / std::f64::consts::PI).sqrt();
        Ok((0..self.points)
            .map(|i| {
                let theta = TAU * i as f64 / self.points as f64;
                Keypoint::new(cx + r * theta.cos(), cy + r * theta.sin(), self.probability)
            })
            .collect())
    }

    fn name(&self) -> &str {
        "dark-blob"
    }
}

//! Duration and disk-size estimate for a planned recording.

use sesame_core::FrameRate;
use std::fmt;
use std::time::Duration;

const BYTES_PER_GB: f64 = (1u64 << 30) as f64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordingPlan {
    pub frames: u32,
    pub rate: FrameRate,
    pub width: u32,
    pub height: u32,
    pub channels: u32,
}

impl RecordingPlan {
    pub fn new(frames: u32, rate: FrameRate, width: u32, height: u32, channels: u32) -> Self {
        Self {
            frames,
            rate,
            width,
            height,
            channels,
        }
    }

    /// Wall time at the target rate.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frames as f64 / self.rate.hz())
    }

    /// Raw image bytes for one frame.
    pub fn frame_bytes(&self) -> u64 {
        self.width as u64 * self.height as u64 * self.channels as u64
    }

    /// Raw image data for the whole session, in GiB.
    pub fn gigabytes(&self) -> f64 {
        self.frames as f64 * self.frame_bytes() as f64 / BYTES_PER_GB
    }
}

impl fmt::Display for RecordingPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.duration().as_secs();
        write!(
            f,
            "{:>3} hours {:02} min {:02} sec {:.3} GB",
            secs / 3600,
            (secs / 60) % 60,
            secs % 60,
            self.gigabytes()
        )
    }
}

/// `Progress | 000012/000550`
pub fn progress_label(written: u32, target: u32) -> String {
    format!("Progress | {written:06}/{target:06}")
}

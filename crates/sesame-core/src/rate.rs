//! Frame-rate bounds for the acquisition loop.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A frame rate in Hz, always inside `(MIN_FPS, MAX_FPS]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(into = "f64", from = "f64")]
pub struct FrameRate(f64);

impl FrameRate {
    /// Slowest supported rate.
    pub const MIN_FPS: f64 = 0.000_001;
    /// Fastest rate the camera can sustain.
    pub const MAX_FPS: f64 = 29.97;
    /// Above this the live preview cannot keep up with recording.
    pub const PREVIEW_MAX_FPS: f64 = 15.0;

    pub const FPS_2: Self = Self(2.0);
    pub const FPS_15: Self = Self(Self::PREVIEW_MAX_FPS);
    pub const FPS_29_97: Self = Self(Self::MAX_FPS);

    /// Clamp a requested rate into the supported range. NaN maps to the minimum.
    pub fn clamped(hz: f64) -> Self {
        if hz.is_nan() || hz < Self::MIN_FPS {
            Self(Self::MIN_FPS)
        } else if hz > Self::MAX_FPS {
            Self(Self::MAX_FPS)
        } else {
            Self(hz)
        }
    }

    /// Whether a request would be altered by clamping.
    pub fn is_out_of_range(hz: f64) -> bool {
        !(Self::MIN_FPS..=Self::MAX_FPS).contains(&hz)
    }

    #[inline]
    pub fn hz(self) -> f64 {
        self.0
    }

    /// Target inter-frame period.
    #[inline]
    pub fn period(self) -> Duration {
        Duration::from_secs_f64(1.0 / self.0)
    }

    /// True when recording at this rate is incompatible with live preview.
    #[inline]
    pub fn exceeds_preview_limit(self) -> bool {
        self.0 > Self::PREVIEW_MAX_FPS
    }

    /// The rate capped to what the live preview can follow.
    pub fn capped_for_preview(self) -> Self {
        if self.exceeds_preview_limit() {
            Self::FPS_15
        } else {
            self
        }
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::FPS_2
    }
}

impl From<f64> for FrameRate {
    fn from(hz: f64) -> Self {
        Self::clamped(hz)
    }
}

impl From<FrameRate> for f64 {
    fn from(rate: FrameRate) -> Self {
        rate.0
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6} Hz", self.0)
    }
}

//! Persistent configuration.
//!
//! Stored as pretty JSON under the platform config directory:
//! ```text
//! <config_dir>/flying-sesame/config.json
//! ```
//! A missing file yields defaults; every field has a default so partial
//! files are accepted.

use crate::error::{Result, SesameError};
use crate::rate::FrameRate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const APP_DIR: &str = "flying-sesame";
const CONFIG_FILE: &str = "config.json";

/// Camera driver settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Device-imposed snap timeout.
    pub snap_timeout_ms: u64,
    pub width: u32,
    pub height: u32,
    pub channels: u32,
}

impl CameraConfig {
    pub fn snap_timeout(&self) -> Duration {
        Duration::from_millis(self.snap_timeout_ms)
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            snap_timeout_ms: 2000,
            width: 720,
            height: 480,
            channels: 3,
        }
    }
}

/// What to do when a recording rate is too fast for the live preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighRatePolicy {
    /// Lower the rate to the preview limit and keep the preview.
    #[default]
    CapRate,
    /// Keep the rate and record without preview.
    DisablePreview,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    pub frame_rate: FrameRate,
    /// Frames per recording session.
    pub frame_count: u32,
    pub high_rate_policy: HighRatePolicy,
    /// Moving-average window of the FPS estimator.
    pub fps_window: usize,
    /// Value the FPS window is seeded with.
    pub fps_seed: f64,
    /// Bound on waiting for a running acquisition thread to stop.
    pub shutdown_timeout_ms: u64,
}

impl AcquisitionConfig {
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            frame_rate: FrameRate::FPS_2,
            frame_count: 550,
            high_rate_policy: HighRatePolicy::CapRate,
            fps_window: 25,
            fps_seed: 30.0,
            shutdown_timeout_ms: 10_000,
        }
    }
}

/// Digital-input trigger line.
///
/// The idle/asserted codes and debounce thresholds describe one device's
/// electrical behaviour; the defaults match a USB-4751L on port 2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    pub start_port: u8,
    pub port_count: u8,
    /// Code read while the line is electrically idle.
    pub idle_code: u8,
    /// Code read while the line is asserted.
    pub asserted_code: u8,
    /// Samples kept for debounce confirmation.
    pub window: usize,
    /// Asserted samples within the window required to arm.
    pub confirm_threshold: usize,
    pub poll_interval_ms: u64,
}

impl TriggerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            start_port: 2,
            port_count: 1,
            idle_code: 254,
            asserted_code: 255,
            window: 100,
            confirm_threshold: 25,
            poll_interval_ms: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Directory experiment folders are created in.
    pub parent_dir: PathBuf,
    pub experiment_name: String,
    pub write_video: bool,
    /// ffmpeg encoder used for the composite video.
    pub video_codec: String,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            parent_dir: PathBuf::from("."),
            experiment_name: "Exp".into(),
            write_video: true,
            video_codec: "mjpeg".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Run the pose estimator on every frame.
    pub enabled: bool,
    /// Write the per-frame geometry CSV while recording.
    pub track_geometry: bool,
    /// Minimum fit confidence for the overlay circle, in [0, 1].
    pub fit_threshold: f64,
    pub model_path: Option<PathBuf>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            track_geometry: true,
            fit_threshold: 0.9,
            model_path: None,
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SesameConfig {
    pub camera: CameraConfig,
    pub acquisition: AcquisitionConfig,
    pub trigger: TriggerConfig,
    pub recording: RecordingConfig,
    pub detection: DetectionConfig,
}

impl SesameConfig {
    /// `<config_dir>/flying-sesame/config.json`, if the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load from `path`, falling back to defaults when the file is absent.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| SesameError::Config(format!("{}: {e}", path.display())))?;
        info!(path = %path.display(), "Loaded configuration");
        config.normalized()
    }

    /// Load from the default location.
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| SesameError::Serialization(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Clamp soft settings and reject values the pipeline cannot run with.
    pub fn normalized(mut self) -> Result<Self> {
        self.detection.fit_threshold = self.detection.fit_threshold.clamp(0.0, 1.0);
        if self.acquisition.fps_window == 0 {
            return Err(SesameError::Config("fps_window must be at least 1".into()));
        }
        if self.trigger.window == 0 || self.trigger.confirm_threshold > self.trigger.window {
            return Err(SesameError::Config(format!(
                "trigger confirm_threshold {} must fit in window {}",
                self.trigger.confirm_threshold, self.trigger.window
            )));
        }
        if self.trigger.idle_code == self.trigger.asserted_code {
            return Err(SesameError::Config(
                "trigger idle and asserted codes must differ".into(),
            ));
        }
        if self.recording.experiment_name.trim().is_empty() {
            self.recording.experiment_name = RecordingConfig::default().experiment_name;
        }
        Ok(self)
    }
}

//! Flying Sesame Core - Foundation types for pupil acquisition
//!
//! This crate provides the fundamental types used throughout the pipeline:
//! - Frame buffers and per-frame events
//! - Key points and the algebraic circle fit
//! - Frame-rate bounds
//! - Configuration
//! - The pose-estimator seam

pub mod config;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod pose;
pub mod rate;

pub use config::{
    AcquisitionConfig, CameraConfig, DetectionConfig, HighRatePolicy, RecordingConfig,
    SesameConfig, TriggerConfig,
};
pub use error::{Result, SesameError};
pub use frame::{
    format_csv_timestamp, format_file_timestamp, FrameDescription, FrameEvent, RawImage,
    SharedImage, CSV_TIMESTAMP, FILE_TIMESTAMP,
};
pub use geometry::{fit_circle, make_circle, GeometryError, GeometryResult, Keypoint, KeypointSet};
pub use pose::PoseEstimator;
pub use rate::FrameRate;

//! Sesame AI - pupil key-point estimation
//!
//! Decodes key-point heatmaps into image coordinates and locates model
//! files. The ONNX Runtime backend is behind the `onnx` feature.

pub mod error;
pub mod heatmap;
pub mod model;
#[cfg(feature = "onnx")]
pub mod onnx;

pub use error::{AiError, AiResult};
pub use heatmap::{decode_heatmaps, image_to_nhwc};
pub use model::{ModelLocator, DEFAULT_MODEL_FILE};
#[cfg(feature = "onnx")]
pub use onnx::OnnxPoseEstimator;

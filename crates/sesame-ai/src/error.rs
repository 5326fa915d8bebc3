//! Error types for pose estimation.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    /// No model file at the configured or default location.
    #[error("Pose model not found: {}", path.display())]
    ModelNotFound { path: PathBuf },

    /// ONNX Runtime error.
    #[cfg(feature = "onnx")]
    #[error("ONNX Runtime error: {0}")]
    OnnxError(#[from] ort::Error),

    /// Model output does not have the expected layout.
    #[error("Unexpected model output: {0}")]
    OutputShape(String),

    #[error("Preprocessing error: {0}")]
    PreprocessError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<AiError> for sesame_core::SesameError {
    fn from(e: AiError) -> Self {
        sesame_core::SesameError::Inference(e.to_string())
    }
}

/// Result type alias for AI operations.
pub type AiResult<T> = std::result::Result<T, AiError>;

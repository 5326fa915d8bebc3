//! Error types for Flying Sesame.

use thiserror::Error;

/// Main error type shared across the pipeline crates.
#[derive(Error, Debug)]
pub enum SesameError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Device error: {0}")]
    Device(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for Flying Sesame operations.
pub type Result<T> = std::result::Result<T, SesameError>;

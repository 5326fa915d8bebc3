//! Error types for the recording subsystem.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of one writer for one frame. Writers fail independently; none of
/// these stop a session.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to write image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Video writer error: {0}")]
    Video(String),

    #[error("Video encoder unavailable: {0}")]
    VideoUnavailable(String),

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] sesame_core::SesameError),

    #[error("Recording worker has shut down")]
    WorkerGone,
}

impl PersistenceError {
    /// Which writer produced the error, for per-writer failure accounting.
    pub fn writer(&self) -> WriterKind {
        match self {
            Self::Image { .. } => WriterKind::Image,
            Self::Video(_) | Self::VideoUnavailable(_) => WriterKind::Video,
            Self::Csv { .. } => WriterKind::Csv,
            Self::Io(_) | Self::Core(_) | Self::WorkerGone => WriterKind::Other,
        }
    }
}

/// The independent per-frame outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriterKind {
    Image,
    Video,
    Csv,
    Other,
}

/// Errors allocating an experiment directory.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Parent directory does not exist: {0}")]
    ParentMissing(PathBuf),

    #[error("Invalid experiment name: {0:?}")]
    InvalidName(String),

    #[error("No free nonce left for experiment {base:?}")]
    Exhausted { base: String },

    #[error("Failed to create {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for persistence operations.
pub type PersistResult<T> = std::result::Result<T, PersistenceError>;

//! Flying Sesame Record - experiment directories and per-frame persistence
//!
//! A recording session owns one experiment directory, named with a
//! collision-free `_NNNN` nonce, and fans every frame out to three
//! independent writers:
//! - a TIFF image per frame inside the directory
//! - a composite video next to it, encoded by an ffmpeg sidecar
//! - a geometry CSV next to it
//!
//! The same CSV layout is produced by offline extraction over saved frames.

pub mod error;
pub mod extract;
pub mod metadata;
pub mod naming;
pub mod plan;
pub mod session;
pub mod worker;
pub mod writers;

pub use error::{PersistResult, PersistenceError, SessionError, WriterKind};
pub use extract::{extract_directories, extract_directory, ExtractReport};
pub use metadata::MetadataRow;
pub use naming::{allocate, allocate_with, ExperimentHandle, NonceCounter};
pub use plan::{progress_label, RecordingPlan};
pub use session::{RecordingSession, RecordingSummary, SaveReport, SessionWriters, WriterFailures};
pub use worker::RecordingWorker;
pub use writers::{CsvRowSink, FfmpegVideoSink, ImageSink, RowSink, TiffImageSink, VideoSink};

//! Recording session: one experiment directory plus the writers that fan
//! each frame out to disk.

use crate::error::{PersistenceError, WriterKind};
use crate::metadata::MetadataRow;
use crate::naming::ExperimentHandle;
use crate::writers::{CsvRowSink, FfmpegVideoSink, ImageSink, RowSink, TiffImageSink, VideoSink};
use sesame_core::{FrameEvent, FrameRate, RecordingConfig};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

/// The writers a session fans out to. Absent writers are skipped.
#[derive(Default)]
pub struct SessionWriters {
    image: Option<Box<dyn ImageSink>>,
    video: Option<Box<dyn VideoSink>>,
    rows: Option<Box<dyn RowSink>>,
}

impl SessionWriters {
    /// No writers at all.
    pub fn none() -> Self {
        Self::default()
    }

    /// The on-disk writers for `handle`: TIFF frames, the ffmpeg video when
    /// enabled, and the geometry CSV when tracking geometry.
    pub fn disk(
        handle: &ExperimentHandle,
        config: &RecordingConfig,
        rate: FrameRate,
        track_geometry: bool,
    ) -> Self {
        let mut writers = Self::none().with_images(TiffImageSink);
        if config.write_video {
            writers = writers.with_video(FfmpegVideoSink::new(
                handle.video_path(),
                rate,
                &config.video_codec,
            ));
        }
        if track_geometry {
            writers = writers.with_rows(CsvRowSink::append(handle.csv_path()));
        }
        writers
    }

    pub fn with_images(mut self, sink: impl ImageSink + 'static) -> Self {
        self.image = Some(Box::new(sink));
        self
    }

    pub fn with_video(mut self, sink: impl VideoSink + 'static) -> Self {
        self.video = Some(Box::new(sink));
        self
    }

    pub fn with_rows(mut self, sink: impl RowSink + 'static) -> Self {
        self.rows = Some(Box::new(sink));
        self
    }
}

/// Per-writer failure counts over a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterFailures {
    pub image: u32,
    pub video: u32,
    pub csv: u32,
    pub other: u32,
}

impl WriterFailures {
    fn record(&mut self, kind: WriterKind) {
        match kind {
            WriterKind::Image => self.image += 1,
            WriterKind::Video => self.video += 1,
            WriterKind::Csv => self.csv += 1,
            WriterKind::Other => self.other += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.image + self.video + self.csv + self.other
    }
}

/// Outcome of persisting one frame.
#[derive(Debug)]
pub struct SaveReport {
    pub index: u32,
    /// Frames handled so far, including this one.
    pub written: u32,
    pub target: u32,
    pub errors: Vec<PersistenceError>,
}

impl SaveReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Fraction of the session target handled, in [0, 1].
    pub fn progress(&self) -> f64 {
        if self.target == 0 {
            1.0
        } else {
            (self.written as f64 / self.target as f64).min(1.0)
        }
    }
}

/// Final account of a closed session.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingSummary {
    pub experiment: String,
    pub dir: PathBuf,
    pub frames_written: u32,
    pub target: u32,
    pub failures: WriterFailures,
}

impl RecordingSummary {
    pub fn is_complete(&self) -> bool {
        self.frames_written >= self.target
    }
}

/// An open recording. Frames must be saved in index order.
pub struct RecordingSession {
    handle: ExperimentHandle,
    writers: SessionWriters,
    target: u32,
    written: u32,
    first_capture: Option<Instant>,
    failures: WriterFailures,
}

impl RecordingSession {
    pub fn new(handle: ExperimentHandle, writers: SessionWriters, target: u32) -> Self {
        info!(experiment = handle.name(), target, "Recording session opened");
        Self {
            handle,
            writers,
            target,
            written: 0,
            first_capture: None,
            failures: WriterFailures::default(),
        }
    }

    pub fn handle(&self) -> &ExperimentHandle {
        &self.handle
    }

    pub fn written(&self) -> u32 {
        self.written
    }

    pub fn target(&self) -> u32 {
        self.target
    }

    pub fn is_complete(&self) -> bool {
        self.written >= self.target
    }

    /// Write the image, the video frame and the CSV row for `event`.
    ///
    /// The three writes are independent: each failure is logged, counted and
    /// returned in the report while the remaining writers still run.
    pub fn save_frame(&mut self, event: &FrameEvent) -> SaveReport {
        let first = *self.first_capture.get_or_insert(event.captured_at);
        let mut errors = Vec::new();

        if let Some(sink) = self.writers.image.as_mut() {
            let path = self.handle.dir().join(event.image_name());
            if let Err(e) = sink.write_image(&path, &event.image) {
                errors.push(e);
            }
        }

        if let Some(sink) = self.writers.video.as_mut() {
            if let Err(e) = sink.write_video_frame(&event.image) {
                errors.push(e);
            }
        }

        if let Some(sink) = self.writers.rows.as_mut() {
            let row = MetadataRow::from_event(event, first);
            if let Err(e) = sink.write_csv_row(&row) {
                errors.push(e);
            }
        }

        for e in &errors {
            self.failures.record(e.writer());
            warn!(index = event.index, writer = ?e.writer(), "Frame write failed: {}", e);
        }

        self.written += 1;
        debug!(index = event.index, written = self.written, target = self.target, "Frame saved");

        SaveReport {
            index: event.index,
            written: self.written,
            target: self.target,
            errors,
        }
    }

    /// Finalize the video and CSV and report what was written.
    pub fn close(mut self) -> RecordingSummary {
        if let Some(mut sink) = self.writers.video.take() {
            if let Err(e) = sink.finish() {
                warn!("Video finalize failed: {}", e);
                self.failures.record(WriterKind::Video);
            }
        }
        if let Some(mut sink) = self.writers.rows.take() {
            if let Err(e) = sink.finish() {
                warn!("CSV finalize failed: {}", e);
                self.failures.record(WriterKind::Csv);
            }
        }

        let summary = RecordingSummary {
            experiment: self.handle.name().to_string(),
            dir: self.handle.dir(),
            frames_written: self.written,
            target: self.target,
            failures: self.failures,
        };
        info!(
            experiment = %summary.experiment,
            frames = summary.frames_written,
            target = summary.target,
            failures = summary.failures.total(),
            "Recording session closed"
        );
        summary
    }
}

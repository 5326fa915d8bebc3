//! Per-frame output writers: TIFF images, the composite video and the
//! geometry CSV.
//!
//! Each writer is an independent sink; a failure in one is reported for that
//! frame and never blocks or corrupts the others.

use crate::error::{PersistResult, PersistenceError};
use crate::metadata::MetadataRow;
use sesame_core::{FrameRate, RawImage};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use tracing::{debug, info, warn};

/// Writes one still image per frame.
pub trait ImageSink: Send {
    fn write_image(&mut self, path: &Path, image: &RawImage) -> PersistResult<()>;
}

/// Appends frames to a video stream.
pub trait VideoSink: Send {
    fn write_video_frame(&mut self, image: &RawImage) -> PersistResult<()>;

    /// Flush and close the stream. Called once when the session ends.
    fn finish(&mut self) -> PersistResult<()> {
        Ok(())
    }
}

/// Appends metadata rows.
pub trait RowSink: Send {
    fn write_csv_row(&mut self, row: &MetadataRow) -> PersistResult<()>;

    fn finish(&mut self) -> PersistResult<()> {
        Ok(())
    }
}

// ── Images ──────────────────────────────────────────────────────

/// Saves frames as uncompressed RGB TIFF.
#[derive(Debug, Default)]
pub struct TiffImageSink;

impl ImageSink for TiffImageSink {
    fn write_image(&mut self, path: &Path, image: &RawImage) -> PersistResult<()> {
        let buffer = image::RgbImage::from_raw(image.width, image.height, image.as_bytes().to_vec())
            .ok_or_else(|| PersistenceError::Image {
                path: path.to_path_buf(),
                source: image::ImageError::Parameter(image::error::ParameterError::from_kind(
                    image::error::ParameterErrorKind::DimensionMismatch,
                )),
            })?;
        buffer
            .save_with_format(path, image::ImageFormat::Tiff)
            .map_err(|source| PersistenceError::Image {
                path: path.to_path_buf(),
                source,
            })
    }
}

// ── Video ───────────────────────────────────────────────────────

enum EncoderState {
    Idle,
    Running {
        child: Child,
        stdin: ChildStdin,
        width: u32,
        height: u32,
    },
    Failed(String),
    Finished,
}

/// Pipes raw RGB frames into an ffmpeg child process.
///
/// The encoder is spawned on the first frame, once the frame size is known.
pub struct FfmpegVideoSink {
    output_path: PathBuf,
    frame_rate: FrameRate,
    codec: String,
    state: EncoderState,
    frames: u64,
}

impl FfmpegVideoSink {
    pub fn new(output_path: impl Into<PathBuf>, frame_rate: FrameRate, codec: &str) -> Self {
        Self {
            output_path: output_path.into(),
            frame_rate,
            codec: codec.to_string(),
            state: EncoderState::Idle,
            frames: 0,
        }
    }

    /// Number of frames accepted by the encoder.
    pub fn frames_written(&self) -> u64 {
        self.frames
    }

    /// Build the FFmpeg command arguments for a stream of `width`×`height` frames.
    pub fn ffmpeg_args(&self, width: u32, height: u32) -> Vec<String> {
        vec![
            "-y".into(),
            "-loglevel".into(),
            "error".into(),
            "-f".into(),
            "rawvideo".into(),
            "-pixel_format".into(),
            "rgb24".into(),
            "-video_size".into(),
            format!("{width}x{height}"),
            "-framerate".into(),
            format!("{:.6}", self.frame_rate.hz()),
            "-i".into(),
            "pipe:0".into(),
            "-c:v".into(),
            self.codec.clone(),
            "-q:v".into(),
            "3".into(),
            "-pix_fmt".into(),
            "yuvj420p".into(),
            self.output_path.to_string_lossy().into_owned(),
        ]
    }

    fn spawn(&mut self, width: u32, height: u32) -> PersistResult<()> {
        if !ffmpeg_sidecar::command::ffmpeg_is_installed() {
            let msg = "ffmpeg binary not found".to_string();
            self.state = EncoderState::Failed(msg.clone());
            return Err(PersistenceError::VideoUnavailable(msg));
        }

        let args = self.ffmpeg_args(width, height);
        let spawned = Command::new(ffmpeg_sidecar::paths::ffmpeg_path())
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                let msg = format!("Failed to spawn ffmpeg: {e}");
                self.state = EncoderState::Failed(msg.clone());
                return Err(PersistenceError::VideoUnavailable(msg));
            }
        };
        let Some(stdin) = child.stdin.take() else {
            let _ = child.kill();
            let msg = "Failed to open ffmpeg stdin".to_string();
            self.state = EncoderState::Failed(msg.clone());
            return Err(PersistenceError::VideoUnavailable(msg));
        };

        info!(path = %self.output_path.display(), width, height, rate = %self.frame_rate, "Video encoder started");
        self.state = EncoderState::Running {
            child,
            stdin,
            width,
            height,
        };
        Ok(())
    }
}

impl VideoSink for FfmpegVideoSink {
    fn write_video_frame(&mut self, image: &RawImage) -> PersistResult<()> {
        if matches!(self.state, EncoderState::Idle) {
            self.spawn(image.width, image.height)?;
        }

        match &mut self.state {
            EncoderState::Running {
                stdin,
                width,
                height,
                ..
            } => {
                if image.width != *width || image.height != *height {
                    return Err(PersistenceError::Video(format!(
                        "frame is {}x{}, stream is {}x{}",
                        image.width, image.height, width, height
                    )));
                }
                stdin
                    .write_all(image.as_bytes())
                    .map_err(|e| PersistenceError::Video(format!("Failed to write frame: {e}")))?;
                self.frames += 1;
                Ok(())
            }
            EncoderState::Failed(msg) => Err(PersistenceError::VideoUnavailable(msg.clone())),
            EncoderState::Finished => Err(PersistenceError::Video("video stream already closed".into())),
            EncoderState::Idle => Err(PersistenceError::Video("video encoder not started".into())),
        }
    }

    fn finish(&mut self) -> PersistResult<()> {
        let state = std::mem::replace(&mut self.state, EncoderState::Finished);
        let EncoderState::Running {
            mut child, stdin, ..
        } = state
        else {
            return Ok(());
        };

        // Close stdin to signal end-of-stream
        drop(stdin);
        let status = child
            .wait()
            .map_err(|e| PersistenceError::Video(format!("Failed to wait for ffmpeg: {e}")))?;
        if !status.success() {
            return Err(PersistenceError::Video(format!(
                "ffmpeg exited with status: {status}"
            )));
        }
        info!(path = %self.output_path.display(), frames = self.frames, "Video closed");
        Ok(())
    }
}

impl Drop for FfmpegVideoSink {
    fn drop(&mut self) {
        if let Err(e) = VideoSink::finish(self) {
            warn!("Video finalize on drop failed: {}", e);
        }
    }
}

// ── CSV ─────────────────────────────────────────────────────────

/// Geometry CSV. The file and its header are created with the first row;
/// later rows are appended and flushed one by one so a partial session
/// leaves a readable file.
pub struct CsvRowSink {
    path: PathBuf,
    truncate: bool,
    writer: Option<csv::Writer<File>>,
    header: Vec<String>,
    truncated_rows: u32,
}

impl CsvRowSink {
    /// Append to `path`, writing the header only if the file is new or empty.
    pub fn append(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            truncate: false,
            writer: None,
            header: Vec::new(),
            truncated_rows: 0,
        }
    }

    /// Replace any existing file at `path`.
    pub fn create(path: impl Into<PathBuf>) -> Self {
        Self {
            truncate: true,
            ..Self::append(path)
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows that had more columns than the header and lost the extra ones.
    pub fn truncated_rows(&self) -> u32 {
        self.truncated_rows
    }

    fn csv_err(&self, source: csv::Error) -> PersistenceError {
        PersistenceError::Csv {
            path: self.path.clone(),
            source,
        }
    }

    fn open(&mut self, row: &MetadataRow) -> PersistResult<()> {
        let mut options = OpenOptions::new();
        options.create(true);
        if self.truncate {
            options.write(true).truncate(true);
        } else {
            options.append(true);
        }
        let file = options.open(&self.path)?;
        let needs_header = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(file);
        self.header = row.header();
        if needs_header {
            writer
                .write_record(&self.header)
                .map_err(|e| self.csv_err(e))?;
        }
        debug!(path = %self.path.display(), columns = self.header.len(), "CSV opened");
        self.writer = Some(writer);
        Ok(())
    }
}

impl RowSink for CsvRowSink {
    fn write_csv_row(&mut self, row: &MetadataRow) -> PersistResult<()> {
        if self.writer.is_none() {
            self.open(row)?;
        }

        let mut fields = row.fields();
        if fields.len() > self.header.len() {
            if self.truncated_rows == 0 {
                warn!(
                    path = %self.path.display(),
                    index = row.index,
                    got = fields.len(),
                    expected = self.header.len(),
                    "Row has more key points than the header; extra columns are dropped"
                );
            }
            self.truncated_rows += 1;
        }
        if fields.len() != self.header.len() {
            fields.resize(self.header.len(), String::new());
        }

        let result = match self.writer.as_mut() {
            Some(writer) => writer.write_record(&fields).and_then(|_| {
                writer.flush()?;
                Ok(())
            }),
            None => return Err(std::io::Error::other("CSV writer not open").into()),
        };
        result.map_err(|e| self.csv_err(e))
    }

    fn finish(&mut self) -> PersistResult<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }
}

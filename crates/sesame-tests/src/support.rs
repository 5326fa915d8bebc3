//! Shared fixtures.

use sesame_acquire::sim::SimulatedCamera;
use sesame_acquire::WriterFactory;
use sesame_core::{FrameRate, RawImage, RecordingConfig, SesameConfig};
use sesame_record::{
    CsvRowSink, ExperimentHandle, PersistResult, SessionWriters, TiffImageSink, VideoSink,
};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Stands in for the ffmpeg encoder and counts frames.
pub struct CountingVideo {
    frames: Arc<AtomicU32>,
    finished: Arc<AtomicU32>,
}

impl VideoSink for CountingVideo {
    fn write_video_frame(&mut self, _: &RawImage) -> PersistResult<()> {
        self.frames.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn finish(&mut self) -> PersistResult<()> {
        self.finished.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct VideoCounter {
    pub frames: Arc<AtomicU32>,
    pub finished: Arc<AtomicU32>,
}

impl VideoCounter {
    pub fn frames(&self) -> u32 {
        self.frames.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> u32 {
        self.finished.load(Ordering::SeqCst)
    }
}

/// TIFF frames and geometry CSV on disk, video counted in memory.
pub fn disk_writers(counter: &VideoCounter) -> WriterFactory {
    let counter = counter.clone();
    Box::new(
        move |handle: &ExperimentHandle, _: &RecordingConfig, _: FrameRate, track: bool| {
            let mut writers = SessionWriters::none()
                .with_images(TiffImageSink)
                .with_video(CountingVideo {
                    frames: counter.frames.clone(),
                    finished: counter.finished.clone(),
                });
            if track {
                writers = writers.with_rows(CsvRowSink::append(handle.csv_path()));
            }
            writers
        },
    )
}

pub fn config(parent: &Path, rate: f64, frames: u32) -> SesameConfig {
    let mut c = SesameConfig::default();
    c.camera.width = 64;
    c.camera.height = 48;
    c.acquisition.frame_rate = FrameRate::clamped(rate);
    c.acquisition.frame_count = frames;
    c.recording.parent_dir = parent.to_path_buf();
    c.recording.write_video = false;
    c.trigger.poll_interval_ms = 0;
    c
}

pub fn camera(config: &SesameConfig) -> Box<SimulatedCamera> {
    Box::new(SimulatedCamera::new(config.camera.width, config.camera.height))
}

/// Files in `dir` with the given extension.
pub fn count_with_extension(dir: &Path, ext: &str) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .filter(|e| e.path().extension().is_some_and(|x| x == ext))
                .count()
        })
        .unwrap_or(0)
}

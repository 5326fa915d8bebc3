//! Frame buffers and the per-frame event emitted by the acquisition loop.
//!
//! Camera SDKs hand over interleaved BGR bytes; everything past the camera
//! seam works on packed 8-bit RGB.

use crate::error::{Result, SesameError};
use crate::geometry::{make_circle, GeometryResult, KeypointSet};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Image geometry reported by the camera driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameDescription {
    pub width: u32,
    pub height: u32,
    pub bits_per_pixel: u32,
}

impl FrameDescription {
    pub fn new(width: u32, height: u32, bits_per_pixel: u32) -> Self {
        Self {
            width,
            height,
            bits_per_pixel,
        }
    }

    /// Bytes per pixel, rounded down from the bit depth.
    #[inline]
    pub fn bytes_per_pixel(&self) -> usize {
        (self.bits_per_pixel / 8) as usize
    }

    /// Size of one raw frame as delivered by the driver.
    pub fn buffer_size(&self) -> usize {
        self.width as usize * self.height as usize * self.bytes_per_pixel()
    }
}

/// An owned H×W×3 8-bit RGB pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    pub width: u32,
    pub height: u32,
    data: Vec<u8>,
}

impl RawImage {
    /// A black image of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; width as usize * height as usize * 3],
        }
    }

    /// Wrap packed RGB bytes.
    pub fn from_rgb(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(SesameError::InvalidParameter(format!(
                "RGB buffer holds {} bytes, expected {} for {}x{}",
                data.len(),
                expected,
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Convert a raw driver buffer (BGR or BGRA) into RGB, swapping the
    /// channel order of every pixel.
    pub fn from_bgr(desc: FrameDescription, raw: &[u8]) -> Result<Self> {
        let bpp = desc.bytes_per_pixel();
        if bpp < 3 {
            return Err(SesameError::UnsupportedFormat(format!(
                "{} bits per pixel",
                desc.bits_per_pixel
            )));
        }
        if raw.len() < desc.buffer_size() {
            return Err(SesameError::InvalidParameter(format!(
                "frame buffer holds {} bytes, expected {}",
                raw.len(),
                desc.buffer_size()
            )));
        }

        let pixels = desc.width as usize * desc.height as usize;
        let mut data = Vec::with_capacity(pixels * 3);
        for px in raw[..desc.buffer_size()].chunks_exact(bpp) {
            data.extend_from_slice(&[px[2], px[1], px[0]]);
        }

        Ok(Self {
            width: desc.width,
            height: desc.height,
            data,
        })
    }

    /// Packed RGB bytes, row-major.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Take the packed RGB bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// RGB triple at (x, y).
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let i = (y as usize * self.width as usize + x as usize) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Total memory usage in bytes.
    pub fn memory_size(&self) -> usize {
        self.data.len()
    }
}

/// Arc-wrapped image so the presenter and the recorder can share one frame.
pub type SharedImage = Arc<RawImage>;

/// One acquired frame plus everything derived from it during the tick.
#[derive(Debug, Clone)]
pub struct FrameEvent {
    /// Sequence index; in recording modes this is the on-disk frame index.
    pub index: u32,
    pub image: SharedImage,
    /// Monotonic capture time, used for relative timing.
    pub captured_at: Instant,
    /// Wall-clock capture time, used for file names and CSV rows.
    pub wall_time: DateTime<Local>,
    pub geometry: Option<GeometryResult>,
    /// Raw detections the geometry was fitted from.
    pub keypoints: KeypointSet,
    /// Moving-average frame rate at the time of capture.
    pub fps: f64,
}

impl FrameEvent {
    /// Persisted image name: `{index:06}_{YYYY-MM-DD_HHhr-MMmin-SS.ffffffsec}.tif`.
    pub fn image_name(&self) -> String {
        format!(
            "{:06}_{}.tif",
            self.index,
            format_file_timestamp(&self.wall_time)
        )
    }

    /// Outline of the fitted circle for drawing, if the fit is confident enough.
    pub fn overlay(&self, fit_threshold: f64) -> Option<Vec<(f64, f64)>> {
        self.geometry
            .as_ref()
            .filter(|g| g.confidence >= fit_threshold)
            .map(|g| make_circle(g.center, g.diameter, 256))
    }
}

/// Layout of the timestamp embedded in image names.
pub const FILE_TIMESTAMP: &str = "%Y-%m-%d_%Hhr-%Mmin-%S%.6fsec";

/// Layout of the `time_stamp` CSV column.
pub const CSV_TIMESTAMP: &str = "%Y-%m-%d_%H:%M:%S%.6f";

pub fn format_file_timestamp(t: &DateTime<Local>) -> String {
    t.format(FILE_TIMESTAMP).to_string()
}

pub fn format_csv_timestamp(t: &DateTime<Local>) -> String {
    t.format(CSV_TIMESTAMP).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn test_bgr_swap() {
        let desc = FrameDescription::new(2, 1, 24);
        let raw = [1u8, 2, 3, 10, 20, 30];
        let img = RawImage::from_bgr(desc, &raw).unwrap();
        assert_eq!(img.pixel(0, 0), [3, 2, 1]);
        assert_eq!(img.pixel(1, 0), [30, 20, 10]);
    }

    #[test]
    fn test_bgra_drops_alpha() {
        let desc = FrameDescription::new(1, 1, 32);
        let img = RawImage::from_bgr(desc, &[5, 6, 7, 255]).unwrap();
        assert_eq!(img.as_bytes(), &[7, 6, 5]);
    }

    #[test]
    fn test_short_buffer_rejected() {
        let desc = FrameDescription::new(4, 4, 24);
        assert!(RawImage::from_bgr(desc, &[0u8; 10]).is_err());
    }

    #[test]
    fn test_gray_rejected() {
        let desc = FrameDescription::new(4, 4, 8);
        assert!(matches!(
            RawImage::from_bgr(desc, &[0u8; 16]),
            Err(SesameError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_file_timestamp_format() {
        let t = Local
            .with_ymd_and_hms(2024, 3, 5, 14, 7, 9)
            .unwrap()
            .with_nanosecond(123_456_000)
            .unwrap();
        assert_eq!(format_file_timestamp(&t), "2024-03-05_14hr-07min-09.123456sec");
        assert_eq!(format_csv_timestamp(&t), "2024-03-05_14:07:09.123456");
    }

    #[test]
    fn test_image_name() {
        let t = Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let event = FrameEvent {
            index: 42,
            image: Arc::new(RawImage::new(2, 2)),
            captured_at: Instant::now(),
            wall_time: t,
            geometry: None,
            keypoints: KeypointSet::new(),
            fps: 30.0,
        };
        assert_eq!(event.image_name(), "000042_2024-01-02_03hr-04min-05.000000sec.tif");
        assert!(event.overlay(0.0).is_none());
    }
}

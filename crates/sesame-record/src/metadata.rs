//! Per-frame metadata rows for the geometry CSV.
//!
//! Column layout:
//! ```text
//! index, img_name, time_stamp, time_sec, num_points, xc, yc, radius, probability, x0, y0, x1, y1, ...
//! ```
//! The key-point columns follow detector order. The header is taken from the
//! first row of a file and reused for every later row.

use chrono::NaiveDateTime;
use sesame_core::{format_csv_timestamp, FrameEvent, GeometryResult, Keypoint};
use std::time::Instant;

const BASE_COLUMNS: [&str; 9] = [
    "index",
    "img_name",
    "time_stamp",
    "time_sec",
    "num_points",
    "xc",
    "yc",
    "radius",
    "probability",
];

/// Parse layout for the timestamp in saved image names.
const NAME_TIMESTAMP: &str = "%Y-%m-%d_%Hhr-%Mmin-%S%.fsec";

/// One CSV row.
///
/// The `radius` column holds the fitted radius, half the diameter. Older
/// recordings stored the diameter under that name.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataRow {
    pub index: u32,
    pub img_name: String,
    /// Empty when the capture time is unknown.
    pub time_stamp: String,
    /// Seconds since the first frame of the session.
    pub time_sec: Option<f64>,
    pub geometry: Option<GeometryResult>,
    pub keypoints: Vec<Keypoint>,
}

impl MetadataRow {
    /// Row for a live frame; `first_capture` is the session's first frame.
    pub fn from_event(event: &FrameEvent, first_capture: Instant) -> Self {
        Self {
            index: event.index,
            img_name: event.image_name(),
            time_stamp: format_csv_timestamp(&event.wall_time),
            time_sec: Some(
                event
                    .captured_at
                    .saturating_duration_since(first_capture)
                    .as_secs_f64(),
            ),
            geometry: event.geometry,
            keypoints: event.keypoints.to_vec(),
        }
    }

    /// Column names implied by this row.
    pub fn header(&self) -> Vec<String> {
        let mut cols: Vec<String> = BASE_COLUMNS.iter().map(|c| c.to_string()).collect();
        for i in 0..self.keypoints.len() {
            cols.push(format!("x{i}"));
            cols.push(format!("y{i}"));
        }
        cols
    }

    /// Field values in header order.
    pub fn fields(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(BASE_COLUMNS.len() + self.keypoints.len() * 2);
        out.push(self.index.to_string());
        out.push(self.img_name.clone());
        out.push(self.time_stamp.clone());
        out.push(self.time_sec.map(|t| t.to_string()).unwrap_or_default());

        let num_points = self
            .geometry
            .map(|g| g.keypoint_count as usize)
            .unwrap_or(self.keypoints.len());
        out.push(num_points.to_string());
        match self.geometry {
            Some(g) => {
                out.push(g.center.0.to_string());
                out.push(g.center.1.to_string());
                out.push(g.radius().to_string());
                out.push(g.confidence.to_string());
            }
            None => out.extend(std::iter::repeat(String::new()).take(4)),
        }

        for k in &self.keypoints {
            out.push(k.x.to_string());
            out.push(k.y.to_string());
        }
        out
    }
}

/// Index and capture time parsed from a saved image name such as
/// `000012_2024-03-05_14hr-07min-09.123456sec.tif`.
pub fn parse_image_name(name: &str) -> Option<(u32, NaiveDateTime)> {
    let stem = name.strip_suffix(".tif")?;
    let (index, stamp) = stem.split_once('_')?;
    if index.len() != 6 || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let index = index.parse().ok()?;
    let time = NaiveDateTime::parse_from_str(stamp, NAME_TIMESTAMP).ok()?;
    Some((index, time))
}

/// Leading six-digit index of an image name, used to order a directory.
pub fn leading_index(name: &str) -> Option<u32> {
    let head = name.get(..6)?;
    if head.bytes().all(|b| b.is_ascii_digit()) {
        head.parse().ok()
    } else {
        None
    }
}

//! Offline pupil extraction over directories of saved frames.
//!
//! Each directory is processed independently and produces `<dir>.csv` next
//! to it, in the same column layout as a live recording.

use crate::error::PersistResult;
use crate::metadata::{leading_index, parse_image_name, MetadataRow};
use crate::writers::{CsvRowSink, RowSink};
use sesame_core::{fit_circle, PoseEstimator, RawImage, CSV_TIMESTAMP};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// File extensions picked up for extraction.
pub const IMAGE_EXTENSIONS: [&str; 4] = ["tif", "jpg", "png", "jpeg"];

/// Result of one extracted directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractReport {
    pub dir: PathBuf,
    pub csv_path: PathBuf,
    pub images: usize,
    /// Rows that carry a circle fit.
    pub fitted: usize,
}

/// `<dir>.csv`, a sibling of the directory.
pub fn csv_path_for(dir: &Path) -> PathBuf {
    let mut name = dir.file_name().unwrap_or_else(|| OsStr::new("images")).to_os_string();
    name.push(".csv");
    dir.with_file_name(name)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .map(|ext| IMAGE_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// Image file names in `dir`, ordered by their leading frame index. Names
/// without one sort last, by name.
pub fn list_images(dir: &Path) -> PersistResult<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_image(&path) {
            if let Some(name) = path.file_name().and_then(OsStr::to_str) {
                names.push(name.to_string());
            }
        }
    }
    names.sort_by(|a, b| {
        let ka = leading_index(a).unwrap_or(u32::MAX);
        let kb = leading_index(b).unwrap_or(u32::MAX);
        ka.cmp(&kb).then_with(|| a.cmp(b))
    });
    Ok(names)
}

fn load_rgb(path: &Path) -> Option<RawImage> {
    let decoded = match image::open(path) {
        Ok(img) => img.to_rgb8(),
        Err(e) => {
            warn!(path = %path.display(), "Skipping unreadable image: {}", e);
            return None;
        }
    };
    let (width, height) = decoded.dimensions();
    RawImage::from_rgb(width, height, decoded.into_raw()).ok()
}

/// Run the estimator and fitter over every image in `dir` and write `<dir>.csv`.
pub fn extract_directory(dir: &Path, estimator: &mut dyn PoseEstimator) -> PersistResult<ExtractReport> {
    let names = list_images(dir)?;
    let csv_path = csv_path_for(dir);
    info!(dir = %dir.display(), images = names.len(), estimator = estimator.name(), "Extracting pupil geometry");

    let mut sink = CsvRowSink::create(&csv_path);
    let mut first_time = None;
    let mut images = 0;
    let mut fitted = 0;

    for (position, name) in names.iter().enumerate() {
        let Some(image) = load_rgb(&dir.join(name)) else {
            continue;
        };

        let parsed = parse_image_name(name);
        let (index, time_stamp, time_sec) = match parsed {
            Some((index, time)) => {
                let first = *first_time.get_or_insert(time);
                let rel = (time - first).num_microseconds().map(|us| us as f64 / 1e6);
                let stamp = time.format(CSV_TIMESTAMP).to_string();
                (index, stamp, rel)
            }
            None => (position as u32, String::new(), None),
        };

        let keypoints = match estimator.infer(&image) {
            Ok(kps) => kps.to_vec(),
            Err(e) => {
                warn!(image = %name, "Pose estimation failed: {}", e);
                Vec::new()
            }
        };
        let geometry = fit_circle(&keypoints).ok();
        if geometry.is_some() {
            fitted += 1;
        }

        sink.write_csv_row(&MetadataRow {
            index,
            img_name: name.clone(),
            time_stamp,
            time_sec,
            geometry,
            keypoints,
        })?;
        images += 1;
    }
    sink.finish()?;

    info!(csv = %csv_path.display(), images, fitted, "Extraction finished");
    Ok(ExtractReport {
        dir: dir.to_path_buf(),
        csv_path,
        images,
        fitted,
    })
}

/// Extract every directory in turn; a failing directory is reported and the
/// next one still runs.
pub fn extract_directories(
    dirs: &[PathBuf],
    estimator: &mut dyn PoseEstimator,
) -> Vec<(PathBuf, PersistResult<ExtractReport>)> {
    dirs.iter()
        .map(|dir| {
            let result = extract_directory(dir, estimator);
            if let Err(e) = &result {
                warn!(dir = %dir.display(), "Extraction failed: {}", e);
            }
            (dir.clone(), result)
        })
        .collect()
}

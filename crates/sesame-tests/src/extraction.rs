//! Offline extraction over a recorded experiment, and heatmap decoding
//! feeding the circle fit.

use crate::support::{camera, config, disk_writers, VideoCounter};
use ndarray::Array3;
use sesame_acquire::sim::CircleEstimator;
use sesame_acquire::{channels, Acquisition, AcquisitionControl, AcquisitionMode};
use sesame_ai::decode_heatmaps;
use sesame_core::fit_circle;
use sesame_record::extract::csv_path_for;
use sesame_record::{extract_directories, extract_directory};
use std::f64::consts::TAU;

#[test]
fn recorded_frames_extract_to_matching_csv() {
    let tmp = tempfile::tempdir().expect("failed to create tempdir");
    let mut cfg = config(tmp.path(), 25.0, 4);
    cfg.detection.track_geometry = false;
    let mut acq = Acquisition::new(camera(&cfg), cfg).with_writers(disk_writers(&VideoCounter::default()));
    let (tx, _rx) = channels();
    let outcome = acq
        .run(AcquisitionMode::Manual, &tx, &AcquisitionControl::new())
        .unwrap();
    let dir = outcome.summary().unwrap().dir.clone();

    // Recorded without geometry: no CSV yet
    assert!(!csv_path_for(&dir).exists());

    let report = extract_directory(&dir, &mut CircleEstimator::default()).unwrap();
    assert_eq!(report.images, 4);
    assert_eq!(report.fitted, 4);

    let csv = std::fs::read_to_string(&report.csv_path).unwrap();
    let rows: Vec<Vec<&str>> = csv.lines().map(|l| l.split(',').collect()).collect();
    assert_eq!(rows.len(), 5);
    assert_eq!(&rows[0][..4], &["index", "img_name", "time_stamp", "time_sec"]);
    for (i, row) in rows[1..].iter().enumerate() {
        assert_eq!(row[0], i.to_string());
        assert!(row[1].starts_with(&format!("{i:06}_")));
        assert!(!row[2].is_empty());
    }
    // Relative time starts at zero
    assert_eq!(rows[1][3].parse::<f64>().unwrap(), 0.0);
}

#[test]
fn failing_directory_does_not_stop_the_rest() {
    let tmp = tempfile::tempdir().expect("failed to create tempdir");
    let good = tmp.path().join("good");
    std::fs::create_dir(&good).unwrap();
    let missing = tmp.path().join("missing");

    let results = extract_directories(&[missing.clone(), good.clone()], &mut CircleEstimator::default());
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0, missing);
    assert!(results[0].1.is_err());
    let report = results[1].1.as_ref().unwrap();
    assert_eq!(report.images, 0);
    assert_eq!(report.fitted, 0);
}

#[test]
fn decoded_heatmap_peaks_fit_a_circle() {
    let (cx, cy, r) = (40.0, 32.0, 12.0);
    let stride = 4.0;
    let parts = 8;
    let mut scores = Array3::<f32>::zeros((20, 24, parts));
    for k in 0..parts {
        let theta = TAU * k as f64 / parts as f64;
        let (x, y) = (cx + r * theta.cos(), cy + r * theta.sin());
        let (col, row) = ((x / stride).floor() as usize, (y / stride).floor() as usize);
        scores[[row, col, k]] = 0.9;
    }

    let keypoints = decode_heatmaps(scores.view(), None, stride).unwrap();
    let g = fit_circle(&keypoints).unwrap();
    // Peaks snap to cell centres, so allow one cell of error
    assert!((g.center.0 - cx).abs() < stride, "{:?}", g.center);
    assert!((g.center.1 - cy).abs() < stride, "{:?}", g.center);
    assert!((g.diameter - 2.0 * r).abs() < 2.0 * stride);
    assert!((g.confidence - 0.9).abs() < 1e-6);
}

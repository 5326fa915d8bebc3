//! End-to-end recording through the acquisition loop.

use crate::support::{camera, config, count_with_extension, disk_writers, VideoCounter};
use sesame_acquire::sim::{CircleEstimator, ScriptedTrigger, SimulatedCamera};
use sesame_acquire::{
    channels, Acquisition, AcquisitionControl, AcquisitionController, AcquisitionError,
    AcquisitionMode, AcquisitionState, SessionOutcome, StatusEvent, TriggerError,
};
use sesame_record::naming::split_nonce;
use std::time::{Duration, Instant};

fn states(events: &[StatusEvent]) -> Vec<AcquisitionState> {
    events
        .iter()
        .filter_map(|e| match e {
            StatusEvent::State(s) => Some(*s),
            _ => None,
        })
        .collect()
}

// ── Manual ─────────────────────────────────────────────────────

#[test]
fn manual_recording_writes_every_output() {
    let tmp = tempfile::tempdir().expect("failed to create tempdir");
    let mut cfg = config(tmp.path(), 5.0, 10);
    cfg.detection.enabled = true;
    cfg.detection.track_geometry = true;

    let video = VideoCounter::default();
    let mut acq = Acquisition::new(camera(&cfg), cfg)
        .with_estimator(Box::new(CircleEstimator::default()))
        .with_writers(disk_writers(&video));
    let (tx, rx) = channels();

    let started = Instant::now();
    let outcome = acq
        .run(AcquisitionMode::Manual, &tx, &AcquisitionControl::new())
        .unwrap();
    let elapsed = started.elapsed();

    // Nine paced intervals at 5 Hz
    assert!(elapsed >= Duration::from_millis(1700), "{elapsed:?}");
    assert!(elapsed < Duration::from_secs(4), "{elapsed:?}");

    let summary = match &outcome {
        SessionOutcome::Completed(summary) => summary,
        other => panic!("expected completion, got {other:?}"),
    };
    assert!(summary.is_complete());
    assert_eq!(summary.frames_written, 10);
    assert_eq!(count_with_extension(&summary.dir, "tif"), 10);
    assert_eq!(video.frames(), 10);
    assert_eq!(video.finished(), 1);

    let csv_path = summary.dir.with_extension("csv");
    let csv = std::fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 11);
    assert!(lines[0].starts_with("index,img_name,time_stamp,time_sec"));
    assert!(lines[1].starts_with("0,000000_"));
    assert!(lines[10].starts_with("9,000009_"));

    let events: Vec<StatusEvent> = rx.status.try_iter().collect();
    assert_eq!(
        states(&events),
        vec![AcquisitionState::Recording, AcquisitionState::Complete]
    );
    let progress: Vec<u32> = events
        .iter()
        .filter_map(|e| match e {
            StatusEvent::Progress { written, .. } => Some(*written),
            _ => None,
        })
        .collect();
    assert_eq!(progress, (1..=10).collect::<Vec<_>>());
}

#[test]
fn geometry_csv_needs_detection() {
    let tmp = tempfile::tempdir().expect("failed to create tempdir");
    let cfg = config(tmp.path(), 25.0, 3);
    assert!(!cfg.detection.enabled);
    assert!(cfg.detection.track_geometry);

    let mut acq = Acquisition::new(camera(&cfg), cfg).with_writers(disk_writers(&VideoCounter::default()));
    let (tx, _rx) = channels();
    let outcome = acq
        .run(AcquisitionMode::Manual, &tx, &AcquisitionControl::new())
        .unwrap();

    let summary = outcome.summary().unwrap();
    assert_eq!(summary.frames_written, 3);
    assert_eq!(count_with_extension(&summary.dir, "tif"), 3);
    assert!(!summary.dir.with_extension("csv").exists());
    assert_eq!(count_with_extension(tmp.path(), "csv"), 0);
}

#[test]
fn repeated_sessions_get_distinct_directories() {
    let tmp = tempfile::tempdir().expect("failed to create tempdir");
    let cfg = config(tmp.path(), 25.0, 2);
    let mut acq = Acquisition::new(camera(&cfg), cfg).with_writers(disk_writers(&VideoCounter::default()));
    let (tx, _rx) = channels();

    let a = acq
        .run(AcquisitionMode::Manual, &tx, &AcquisitionControl::new())
        .unwrap();
    let b = acq
        .run(AcquisitionMode::Manual, &tx, &AcquisitionControl::new())
        .unwrap();
    let (a, b) = (a.summary().unwrap(), b.summary().unwrap());
    assert_ne!(a.experiment, b.experiment);
    assert_eq!(split_nonce(&a.experiment).0, "Exp");
    assert_eq!(split_nonce(&b.experiment).0, "Exp");
    assert_eq!(count_with_extension(&a.dir, "tif"), 2);
    assert_eq!(count_with_extension(&b.dir, "tif"), 2);
}

#[test]
fn camera_loss_keeps_frames_already_written() {
    let tmp = tempfile::tempdir().expect("failed to create tempdir");
    let cfg = config(tmp.path(), 25.0, 10);
    let cam = SimulatedCamera::new(cfg.camera.width, cfg.camera.height).disconnect_after(3);
    let mut acq = Acquisition::new(Box::new(cam), cfg).with_writers(disk_writers(&VideoCounter::default()));
    let (tx, _rx) = channels();

    let outcome = acq
        .run(AcquisitionMode::Manual, &tx, &AcquisitionControl::new())
        .unwrap();
    match &outcome {
        SessionOutcome::Cancelled {
            frames,
            summary: Some(summary),
            ..
        } => {
            assert_eq!(*frames, 3);
            assert_eq!(summary.frames_written, 3);
            assert_eq!(count_with_extension(&summary.dir, "tif"), 3);
        }
        other => panic!("expected cancellation, got {other:?}"),
    }
    assert!(!acq.device_status().camera.is_connected());
}

// ── Triggered ──────────────────────────────────────────────────

#[test]
fn triggered_recording_waits_for_trigger() {
    let tmp = tempfile::tempdir().expect("failed to create tempdir");
    let cfg = config(tmp.path(), 25.0, 5);
    let trigger = ScriptedTrigger::idle_then_asserted(254, 255, 40);
    let mut acq = Acquisition::new(camera(&cfg), cfg)
        .with_trigger(Box::new(trigger))
        .with_writers(disk_writers(&VideoCounter::default()));
    let (tx, rx) = channels();

    let outcome = acq
        .run(AcquisitionMode::Triggered, &tx, &AcquisitionControl::new())
        .unwrap();
    assert!(matches!(outcome, SessionOutcome::Completed(_)));
    assert_eq!(outcome.frames(), 5);

    let events: Vec<StatusEvent> = rx.status.try_iter().collect();
    assert_eq!(
        states(&events),
        vec![
            AcquisitionState::ArmedWaitingTrigger,
            AcquisitionState::Recording,
            AcquisitionState::Complete
        ]
    );
    // Above the preview limit the rate is lowered, not the preview dropped
    assert!(events
        .iter()
        .any(|e| matches!(e, StatusEvent::RateCapped { .. })));
}

#[test]
fn asserted_line_is_rejected_before_allocation() {
    let tmp = tempfile::tempdir().expect("failed to create tempdir");
    let cfg = config(tmp.path(), 5.0, 5);
    let mut acq =
        Acquisition::new(camera(&cfg), cfg).with_trigger(Box::new(ScriptedTrigger::constant(255)));
    let (tx, _rx) = channels();

    let err = acq
        .run(AcquisitionMode::Triggered, &tx, &AcquisitionControl::new())
        .unwrap_err();
    assert!(matches!(
        err,
        AcquisitionError::Trigger(TriggerError::AlreadyAsserted { code: 255 })
    ));
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
}

#[test]
fn cancelling_trigger_wait_ends_without_frames() {
    let tmp = tempfile::tempdir().expect("failed to create tempdir");
    let mut cfg = config(tmp.path(), 5.0, 5);
    cfg.trigger.poll_interval_ms = 1;
    let acq = Acquisition::new(camera(&cfg), cfg)
        .with_trigger(Box::new(ScriptedTrigger::constant(254)))
        .with_writers(disk_writers(&VideoCounter::default()));
    let (tx, rx) = channels();
    let mut ctl = AcquisitionController::new(acq, tx);

    ctl.start(AcquisitionMode::Triggered).unwrap();
    let armed = rx.status.iter().find(|e| {
        matches!(e, StatusEvent::State(AcquisitionState::ArmedWaitingTrigger))
    });
    assert!(armed.is_some());

    let outcome = ctl.stop().unwrap().unwrap().unwrap();
    match outcome {
        SessionOutcome::Cancelled { frames, summary, .. } => {
            assert_eq!(frames, 0);
            assert_eq!(summary.map(|s| s.frames_written), Some(0));
        }
        other => panic!("expected cancellation, got {other:?}"),
    }
}

// ── Controller ─────────────────────────────────────────────────

#[test]
fn stopping_a_recording_returns_partial_summary() {
    let tmp = tempfile::tempdir().expect("failed to create tempdir");
    let cfg = config(tmp.path(), 10.0, 1000);
    let acq = Acquisition::new(camera(&cfg), cfg).with_writers(disk_writers(&VideoCounter::default()));
    let (tx, rx) = channels();
    let mut ctl = AcquisitionController::new(acq, tx);

    ctl.start(AcquisitionMode::Manual).unwrap();
    let reached = rx
        .status
        .iter()
        .find(|e| matches!(e, StatusEvent::Progress { written: 3, .. }));
    assert!(reached.is_some());

    let outcome = ctl.stop().unwrap().unwrap().unwrap();
    let summary = outcome.summary().unwrap();
    assert!(matches!(outcome, SessionOutcome::Cancelled { .. }));
    assert!(summary.frames_written >= 3);
    assert!(!summary.is_complete());
    assert_eq!(
        count_with_extension(&summary.dir, "tif"),
        summary.frames_written as usize
    );
    assert!(ctl.device_status().is_some());
}

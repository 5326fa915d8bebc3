//! Assembles the acquisition from configuration.
//!
//! No hardware driver ships with this tool, so the camera and trigger line
//! are the simulated devices from `sesame-acquire`.

use anyhow::Result;
use sesame_acquire::sim::{CircleEstimator, ScriptedTrigger, SimulatedCamera};
use sesame_acquire::Acquisition;
use sesame_core::{PoseEstimator, SesameConfig};
use std::path::Path;
use tracing::info;

/// Simulated devices sized from the camera config. The trigger stays idle
/// for `trigger_after` samples and then asserts.
pub fn acquisition(config: SesameConfig, trigger_after: usize) -> Result<Acquisition> {
    let camera = SimulatedCamera::new(config.camera.width, config.camera.height);
    let trigger = ScriptedTrigger::idle_then_asserted(
        config.trigger.idle_code,
        config.trigger.asserted_code,
        trigger_after,
    );
    let estimator = estimator(config.detection.model_path.as_deref())?;
    info!(estimator = estimator.name(), "Pose estimator ready");

    Ok(Acquisition::new(Box::new(camera), config)
        .with_trigger(Box::new(trigger))
        .with_estimator(estimator))
}

/// ONNX model when one is configured or cached and the `onnx` feature is
/// built in, else the dark-blob estimator.
#[cfg(feature = "onnx")]
pub fn estimator(model: Option<&Path>) -> Result<Box<dyn PoseEstimator>> {
    let locator = sesame_ai::ModelLocator::platform_default();
    let resolved = match (model, &locator) {
        (Some(path), _) => Some(sesame_ai::ModelLocator::new(".").resolve(Some(path))?),
        (None, Some(l)) if l.is_cached() => Some(l.default_model_path()),
        _ => None,
    };
    match resolved {
        Some(path) => Ok(Box::new(sesame_ai::OnnxPoseEstimator::load(&path)?)),
        None => Ok(Box::new(CircleEstimator::default())),
    }
}

#[cfg(not(feature = "onnx"))]
pub fn estimator(model: Option<&Path>) -> Result<Box<dyn PoseEstimator>> {
    if let Some(path) = model {
        tracing::warn!(
            path = %path.display(),
            "Built without the onnx feature; using the dark-blob estimator"
        );
    }
    Ok(Box::new(CircleEstimator::default()))
}

//! ONNX Runtime pose estimator.
//!
//! Gated behind the `onnx` feature; needs the onnxruntime shared library at
//! run time.

use crate::error::{AiError, AiResult};
use crate::heatmap::{decode_heatmaps, image_to_nhwc};
use ndarray::{ArrayView3, ArrayView4};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use sesame_core::{KeypointSet, PoseEstimator, RawImage, Result as CoreResult};
use std::path::Path;
use tracing::{debug, info};

/// Default score-map stride of the pupil network.
pub const DEFAULT_STRIDE: f64 = 8.0;

/// Key-point network loaded into an ONNX Runtime session.
///
/// Output 0 is the score map. A second output, when the model has one, is
/// the location-refinement map.
pub struct OnnxPoseEstimator {
    session: Session,
    input_name: String,
    stride: f64,
    name: String,
}

impl OnnxPoseEstimator {
    pub fn load(model_path: &Path) -> AiResult<Self> {
        info!(path = %model_path.display(), "Loading ONNX pose model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(model_path)?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .ok_or_else(|| AiError::OutputShape("model has no inputs".into()))?;
        let name = model_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "onnx".into());

        info!(model = %name, input = %input_name, "ONNX pose model loaded");
        Ok(Self {
            session,
            input_name,
            stride: DEFAULT_STRIDE,
            name,
        })
    }

    pub fn with_stride(mut self, stride: f64) -> Self {
        self.stride = stride;
        self
    }

    fn run(&mut self, image: &RawImage) -> AiResult<KeypointSet> {
        let input = image_to_nhwc(image)?;
        let shape = input.shape().to_vec();
        let tensor = Tensor::from_array((shape, input.into_iter().collect::<Vec<f32>>()))?;

        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => tensor])?;

        let (score_shape, scores) = outputs[0].try_extract_tensor::<f32>()?;
        let dims = squeeze_batch(score_shape);
        let [rows, cols, parts] = dims[..] else {
            return Err(AiError::OutputShape(format!("score map {:?}", dims)));
        };
        let scores = ArrayView3::from_shape((rows, cols, parts), scores)
            .map_err(|e| AiError::OutputShape(e.to_string()))?;

        let locref = if outputs.len() > 1 {
            let (_, offsets) = outputs[1].try_extract_tensor::<f32>()?;
            Some(
                ArrayView4::from_shape((rows, cols, parts, 2), offsets)
                    .map_err(|e| AiError::OutputShape(e.to_string()))?,
            )
        } else {
            None
        };

        let keypoints = decode_heatmaps(scores, locref, self.stride)?;
        debug!(points = keypoints.len(), "Pose inferred");
        Ok(keypoints)
    }
}

fn squeeze_batch(shape: &[i64]) -> Vec<usize> {
    let dims: Vec<usize> = shape.iter().map(|&d| d.max(0) as usize).collect();
    match dims.as_slice() {
        [1, rest @ ..] if rest.len() == 3 => rest.to_vec(),
        _ => dims,
    }
}

impl PoseEstimator for OnnxPoseEstimator {
    fn infer(&mut self, image: &RawImage) -> CoreResult<KeypointSet> {
        self.run(image).map_err(Into::into)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

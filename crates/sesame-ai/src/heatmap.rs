//! Tensor layout helpers for key-point networks.
//!
//! The network takes one NHWC image with channel values in `0..=255` and
//! returns a score map of shape `[h', w', K]` (one heatmap per key point)
//! at a coarser stride, optionally with a location-refinement map of shape
//! `[h', w', K, 2]` holding sub-cell `(dx, dy)` offsets in pixels.

use crate::error::{AiError, AiResult};
use ndarray::{Array4, ArrayView3, ArrayView4, Axis};
use sesame_core::{Keypoint, KeypointSet, RawImage};

/// Convert an RGB image to an `[1, height, width, 3]` f32 tensor.
pub fn image_to_nhwc(image: &RawImage) -> AiResult<Array4<f32>> {
    let (w, h) = (image.width as usize, image.height as usize);
    let data: Vec<f32> = image.as_bytes().iter().map(|&v| v as f32).collect();
    Array4::from_shape_vec((1, h, w, 3), data).map_err(|e| AiError::PreprocessError(e.to_string()))
}

/// Pick the peak of every heatmap and map it back to image pixels.
///
/// A peak in cell `(row, col)` lands at the cell centre,
/// `col * stride + stride / 2`, plus the refinement offset when present. Its
/// score is the key point's probability.
pub fn decode_heatmaps(
    scores: ArrayView3<'_, f32>,
    locref: Option<ArrayView4<'_, f32>>,
    stride: f64,
) -> AiResult<KeypointSet> {
    let (rows, cols, parts) = scores.dim();
    if rows == 0 || cols == 0 {
        return Err(AiError::OutputShape(format!(
            "empty score map {rows}x{cols}x{parts}"
        )));
    }
    if let Some(offsets) = &locref {
        let expected = (rows, cols, parts, 2);
        if offsets.dim() != expected {
            return Err(AiError::OutputShape(format!(
                "refinement map {:?} does not match score map {:?}",
                offsets.dim(),
                expected
            )));
        }
    }

    let half = stride / 2.0;
    let keypoints = scores
        .axis_iter(Axis(2))
        .enumerate()
        .map(|(k, heatmap)| {
            let ((row, col), peak) = heatmap.indexed_iter().fold(
                ((0, 0), f32::NEG_INFINITY),
                |best, (idx, &v)| if v > best.1 { (idx, v) } else { best },
            );
            let (dx, dy) = locref
                .as_ref()
                .map(|o| (o[[row, col, k, 0]] as f64, o[[row, col, k, 1]] as f64))
                .unwrap_or((0.0, 0.0));
            Keypoint::new(
                col as f64 * stride + half + dx,
                row as f64 * stride + half + dy,
                peak as f64,
            )
        })
        .collect();
    Ok(keypoints)
}

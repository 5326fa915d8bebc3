//! Seam for the key-point pose estimator.

use crate::error::Result;
use crate::frame::RawImage;
use crate::geometry::KeypointSet;

/// Produces pupil-edge key points for one RGB frame.
///
/// Implementations run on the acquisition thread, one call per frame.
pub trait PoseEstimator: Send {
    fn infer(&mut self, image: &RawImage) -> Result<KeypointSet>;

    /// Short identifier for logs.
    fn name(&self) -> &str {
        "pose-estimator"
    }
}

impl<T: PoseEstimator + ?Sized> PoseEstimator for Box<T> {
    fn infer(&mut self, image: &RawImage) -> Result<KeypointSet> {
        (**self).infer(image)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

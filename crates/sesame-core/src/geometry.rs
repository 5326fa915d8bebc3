//! Pupil geometry from key-point detections.
//!
//! The pupil edge is modelled as a circle. Writing the circle equation as
//! `x² + y² = c0 + c1·x + c2·y` makes it linear in `c`, so a least-squares
//! fit over N ≥ 3 points reduces to the 3×3 normal equations `(AᵗA)c = Aᵗb`.

use glam::{DMat3, DVec3};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

/// Minimum number of key points that pin down a circle.
pub const MIN_KEYPOINTS: usize = 3;

/// `|det| / Π‖col‖` below this is treated as rank-deficient.
const SINGULAR_EPS: f64 = 1e-10;

/// A single landmark detection: position in pixels plus detector confidence.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
    pub probability: f64,
}

impl Keypoint {
    #[inline]
    pub const fn new(x: f64, y: f64, probability: f64) -> Self {
        Self { x, y, probability }
    }
}

impl From<(f64, f64, f64)> for Keypoint {
    fn from((x, y, probability): (f64, f64, f64)) -> Self {
        Self { x, y, probability }
    }
}

/// Key points for one frame, in detector order. Pupil models emit a handful.
pub type KeypointSet = SmallVec<[Keypoint; 8]>;

/// Fitted pupil circle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeometryResult {
    pub center: (f64, f64),
    pub diameter: f64,
    /// Mean detection probability of the points used.
    pub confidence: f64,
    pub keypoint_count: u32,
}

impl GeometryResult {
    #[inline]
    pub fn radius(&self) -> f64 {
        self.diameter * 0.5
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("circle fit needs at least 3 key points, got {0}")]
    InsufficientPoints(usize),

    #[error("normal equations are singular (collinear or coincident key points)")]
    SingularSystem,
}

/// Least-squares circle through the given key points.
///
/// Coordinates are shifted to their centroid before the normal equations are
/// built; the radius is translation invariant and the centroid is added back
/// to the recovered center.
pub fn fit_circle(keypoints: &[Keypoint]) -> Result<GeometryResult, GeometryError> {
    let n = keypoints.len();
    if n < MIN_KEYPOINTS {
        return Err(GeometryError::InsufficientPoints(n));
    }

    let inv_n = 1.0 / n as f64;
    let mean_x = keypoints.iter().map(|k| k.x).sum::<f64>() * inv_n;
    let mean_y = keypoints.iter().map(|k| k.y).sum::<f64>() * inv_n;

    // Rows of A are [1, x, y]; b = x² + y².
    let mut ata = [[0.0f64; 3]; 3];
    let mut atb = [0.0f64; 3];
    for k in keypoints {
        let x = k.x - mean_x;
        let y = k.y - mean_y;
        let row = [1.0, x, y];
        let b = x * x + y * y;
        for i in 0..3 {
            atb[i] += row[i] * b;
            for j in 0..3 {
                ata[i][j] += row[i] * row[j];
            }
        }
    }

    let m = DMat3::from_cols_array_2d(&ata);
    let det = m.determinant();
    let scale = m.x_axis.length() * m.y_axis.length() * m.z_axis.length();
    if scale == 0.0 || !det.is_finite() || det.abs() <= SINGULAR_EPS * scale {
        return Err(GeometryError::SingularSystem);
    }

    let c = m.inverse() * DVec3::from_array(atb);
    let xc = c.y * 0.5;
    let yc = c.z * 0.5;
    let r2 = (c.x + xc * xc + yc * yc).max(0.0);

    let confidence = keypoints.iter().map(|k| k.probability).sum::<f64>() * inv_n;

    Ok(GeometryResult {
        center: (xc + mean_x, yc + mean_y),
        diameter: 2.0 * r2.sqrt(),
        confidence,
        keypoint_count: n as u32,
    })
}

/// Sample `num_sample` points along a circle outline, first and last coinciding.
pub fn make_circle(center: (f64, f64), diameter: f64, num_sample: usize) -> Vec<(f64, f64)> {
    let r = diameter * 0.5;
    let steps = num_sample.saturating_sub(1).max(1) as f64;
    (0..num_sample)
        .map(|i| {
            let theta = std::f64::consts::TAU * i as f64 / steps;
            (center.0 + r * theta.cos(), center.1 + r * theta.sin())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn on_circle(cx: f64, cy: f64, r: f64, n: usize, phase: f64) -> Vec<Keypoint> {
        (0..n)
            .map(|i| {
                let t = phase + std::f64::consts::TAU * i as f64 / n as f64;
                Keypoint::new(cx + r * t.cos(), cy + r * t.sin(), 0.9)
            })
            .collect()
    }

    #[test]
    fn test_recovers_known_circle() {
        let pts = on_circle(320.0, 240.0, 45.0, 8, 0.3);
        let g = fit_circle(&pts).unwrap();
        assert!((g.center.0 - 320.0).abs() < 1e-9);
        assert!((g.center.1 - 240.0).abs() < 1e-9);
        assert!((g.diameter - 90.0).abs() < 1e-9);
        assert!((g.radius() - 45.0).abs() < 1e-9);
        assert_eq!(g.keypoint_count, 8);
    }

    #[test]
    fn test_three_points_exact() {
        let pts: Vec<Keypoint> = [(1.0, 0.0, 1.0), (-1.0, 0.0, 0.5), (0.0, 1.0, 0.0)]
            .into_iter()
            .map(Keypoint::from)
            .collect();
        let g = fit_circle(&pts).unwrap();
        assert!(g.center.0.abs() < 1e-12);
        assert!(g.center.1.abs() < 1e-12);
        assert!((g.diameter - 2.0).abs() < 1e-12);
        assert!((g.confidence - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_insufficient_points() {
        let pts = [Keypoint::new(0.0, 0.0, 1.0), Keypoint::new(1.0, 1.0, 1.0)];
        assert_eq!(fit_circle(&pts), Err(GeometryError::InsufficientPoints(2)));
        assert_eq!(fit_circle(&[]), Err(GeometryError::InsufficientPoints(0)));
    }

    #[test]
    fn test_collinear_is_singular() {
        let pts: Vec<Keypoint> = (0..5)
            .map(|i| Keypoint::new(i as f64, 2.0 * i as f64 + 1.0, 1.0))
            .collect();
        assert_eq!(fit_circle(&pts), Err(GeometryError::SingularSystem));
    }

    #[test]
    fn test_coincident_is_singular() {
        let pts = [Keypoint::new(5.0, 5.0, 1.0); 4];
        assert_eq!(fit_circle(&pts), Err(GeometryError::SingularSystem));
    }

    #[test]
    fn test_make_circle_closes() {
        let pts = make_circle((10.0, -4.0), 6.0, 256);
        assert_eq!(pts.len(), 256);
        let (first, last) = (pts[0], pts[255]);
        assert!((first.0 - last.0).abs() < 1e-9 && (first.1 - last.1).abs() < 1e-9);
        for (x, y) in pts {
            let d = ((x - 10.0).powi(2) + (y + 4.0).powi(2)).sqrt();
            assert!((d - 3.0).abs() < 1e-9);
        }
    }

    proptest! {
        #[test]
        fn prop_fit_recovers_circle(
            cx in -500.0f64..500.0,
            cy in -500.0f64..500.0,
            r in 1.0f64..200.0,
            n in 3usize..24,
            phase in 0.0f64..6.28,
        ) {
            let g = fit_circle(&on_circle(cx, cy, r, n, phase)).unwrap();
            let tol = 1e-6 * (1.0 + r);
            prop_assert!((g.center.0 - cx).abs() < tol);
            prop_assert!((g.center.1 - cy).abs() < tol);
            prop_assert!((g.diameter - 2.0 * r).abs() < tol);
        }
    }
}

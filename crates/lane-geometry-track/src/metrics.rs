//! Physical lane metrics from a rectified-space polynomial pair.

use lane_geometry_core::{LanePair, LanePolynomial};
use serde::{Deserialize, Serialize};

/// Pixel-to-meter scales of the rectified view.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsParams {
    /// Meters per pixel along x.
    pub xm_per_pixel: f64,
    /// Meters per pixel along y.
    pub ym_per_pixel: f64,
    /// Lower bound on `|2a|` in the curvature denominator.
    pub min_curvature_denominator: f64,
}

impl Default for MetricsParams {
    fn default() -> Self {
        Self {
            xm_per_pixel: 3.7 / 700.0,
            ym_per_pixel: 30.0 / 720.0,
            min_curvature_denominator: 1e-6,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LaneMetrics {
    /// Signed lateral offset; positive when the vehicle sits right of the lane center.
    pub offset_m: f64,
    /// Mean of the two boundary radii.
    pub curvature_m: f64,
    pub left_curvature_m: f64,
    pub right_curvature_m: f64,
}

#[derive(Clone, Debug, Default)]
pub struct MetricsEngine {
    params: MetricsParams,
}

impl MetricsEngine {
    pub fn new(params: MetricsParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn params(&self) -> &MetricsParams {
        &self.params
    }

    /// Offset and curvature at the bottom row of a `width x height` frame.
    ///
    /// The camera is assumed to sit at the horizontal center of the frame.
    pub fn compute(&self, lanes: &LanePair, width: usize, height: usize) -> LaneMetrics {
        let y_eval = height.saturating_sub(1) as f64;
        let vehicle_center = width as f64 / 2.0;
        let offset_m = (vehicle_center - lanes.center_at(y_eval)) * self.params.xm_per_pixel;

        let left_curvature_m = self.curvature_radius(&lanes.left, y_eval);
        let right_curvature_m = self.curvature_radius(&lanes.right, y_eval);

        LaneMetrics {
            offset_m,
            curvature_m: 0.5 * (left_curvature_m + right_curvature_m),
            left_curvature_m,
            right_curvature_m,
        }
    }

    /// Radius of curvature in meters of `poly` at pixel row `y_eval`.
    pub fn curvature_radius(&self, poly: &LanePolynomial, y_eval: f64) -> f64 {
        let p = &self.params;
        let a_m = poly.a * p.xm_per_pixel / (p.ym_per_pixel * p.ym_per_pixel);
        let b_m = poly.b * p.xm_per_pixel / p.ym_per_pixel;
        let slope = 2.0 * a_m * y_eval * p.ym_per_pixel + b_m;
        let denom = (2.0 * a_m).abs().max(p.min_curvature_denominator);
        (1.0 + slope * slope).powf(1.5) / denom
    }
}

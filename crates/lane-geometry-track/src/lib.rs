//! Temporal smoothing and physical metrics for lane polynomials.
//!
//! [`LaneTracker`] fuses per-frame `LanePair` measurements with a
//! constant-velocity Kalman filter and reports a confidence in `[0, 1]`.
//! [`MetricsEngine`] turns a pair into a lateral offset and a radius of
//! curvature in meters, and [`AlertEngine`] checks those against thresholds.
//!
//! ```
//! use lane_geometry_core::LanePolynomial;
//! use lane_geometry_track::{LaneTracker, MetricsEngine};
//!
//! let mut tracker = LaneTracker::default();
//! let left = LanePolynomial::vertical(300.0);
//! let right = LanePolynomial::vertical(900.0);
//! let first = tracker.update_and_predict(&left, &right);
//! assert_eq!(first.confidence, 0.0);
//! let second = tracker.update_and_predict(&left, &right);
//! assert!(second.confidence > 0.0);
//!
//! let metrics = MetricsEngine::default().compute(&second.pair(), 1280, 720);
//! assert!(metrics.offset_m > 0.0);
//! ```

mod alerts;
mod kalman;
mod metrics;

pub use alerts::{AlertEngine, AlertParams, LaneAlert};
pub use kalman::{
    CovarianceUpdate, JosephUpdate, KalmanGain, LaneTracker, Measurement, MeasurementModel,
    MeasurementNoise, SimpleUpdate, SmoothedLanes, StateCovariance, StateVector, TrackerParams,
    TrackerStatus, MEASUREMENT_DIM, STATE_DIM,
};
pub use metrics::{LaneMetrics, MetricsEngine, MetricsParams};

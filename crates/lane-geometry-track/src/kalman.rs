//! Constant-velocity Kalman filter over the six lane coefficients.
//!
//! State layout: `[la, lb, lc, ra, rb, rc]` followed by the six matching
//! rates. Only the coefficients are observed.

use lane_geometry_core::{LanePair, LanePolynomial};
use nalgebra::{SMatrix, SVector};
use serde::{Deserialize, Serialize};

/// Number of observed coefficients (two quadratics).
pub const MEASUREMENT_DIM: usize = 6;
/// Coefficients plus their rates.
pub const STATE_DIM: usize = 2 * MEASUREMENT_DIM;

pub type StateVector = SVector<f64, STATE_DIM>;
pub type StateCovariance = SMatrix<f64, STATE_DIM, STATE_DIM>;
pub type Measurement = SVector<f64, MEASUREMENT_DIM>;
pub type MeasurementModel = SMatrix<f64, MEASUREMENT_DIM, STATE_DIM>;
pub type MeasurementNoise = SMatrix<f64, MEASUREMENT_DIM, MEASUREMENT_DIM>;
pub type KalmanGain = SMatrix<f64, STATE_DIM, MEASUREMENT_DIM>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerParams {
    /// Time step between frames, in the units the rates are expressed in.
    pub dt: f64,
    /// Diagonal of the process noise `Q`.
    pub process_noise: f64,
    /// Diagonal of the measurement noise `R`.
    pub measurement_noise: f64,
    /// Diagonal of the initial covariance `P0`.
    pub initial_uncertainty: f64,
}

impl Default for TrackerParams {
    fn default() -> Self {
        Self {
            dt: 0.1,
            process_noise: 1e-4,
            measurement_noise: 1e-2,
            initial_uncertainty: 1e3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerStatus {
    Uninitialized,
    Tracking,
}

/// Posterior covariance after a correction with gain `k`.
pub trait CovarianceUpdate {
    fn update(
        &self,
        p: &StateCovariance,
        k: &KalmanGain,
        h: &MeasurementModel,
        r: &MeasurementNoise,
    ) -> StateCovariance;
}

/// `(I - KH) P`, symmetrized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimpleUpdate;

impl CovarianceUpdate for SimpleUpdate {
    fn update(
        &self,
        p: &StateCovariance,
        k: &KalmanGain,
        h: &MeasurementModel,
        _r: &MeasurementNoise,
    ) -> StateCovariance {
        let i_kh = StateCovariance::identity() - k * h;
        symmetrize(&(i_kh * p))
    }
}

/// Joseph form `(I - KH) P (I - KH)^T + K R K^T`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JosephUpdate;

impl CovarianceUpdate for JosephUpdate {
    fn update(
        &self,
        p: &StateCovariance,
        k: &KalmanGain,
        h: &MeasurementModel,
        r: &MeasurementNoise,
    ) -> StateCovariance {
        let i_kh = StateCovariance::identity() - k * h;
        symmetrize(&(i_kh * p * i_kh.transpose() + k * r * k.transpose()))
    }
}

fn symmetrize(p: &StateCovariance) -> StateCovariance {
    (p + p.transpose()) * 0.5
}

/// Smoothed lane estimate with the tracker's confidence at that moment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SmoothedLanes {
    pub left: LanePolynomial,
    pub right: LanePolynomial,
    /// In `[0, 1]`; grows as the position covariance shrinks.
    pub confidence: f64,
}

impl SmoothedLanes {
    #[inline]
    pub fn pair(&self) -> LanePair {
        LanePair::new(self.left, self.right)
    }
}

/// Kalman tracker for a left/right lane polynomial pair.
///
/// The first `update` only seeds the state; corrections start with the
/// second measurement. Confidence stays at 0 until a correction has been
/// fused.
#[derive(Clone, Debug)]
pub struct LaneTracker<U = SimpleUpdate> {
    params: TrackerParams,
    transition: StateCovariance,
    observation: MeasurementModel,
    process_noise: StateCovariance,
    measurement_noise: MeasurementNoise,
    state: StateVector,
    covariance: StateCovariance,
    status: TrackerStatus,
    corrections: u64,
    covariance_update: U,
}

impl LaneTracker {
    pub fn new(params: TrackerParams) -> Self {
        Self::with_covariance_update(params, SimpleUpdate)
    }
}

impl Default for LaneTracker {
    fn default() -> Self {
        Self::new(TrackerParams::default())
    }
}

impl<U: CovarianceUpdate> LaneTracker<U> {
    pub fn with_covariance_update(params: TrackerParams, covariance_update: U) -> Self {
        let mut transition = StateCovariance::identity();
        transition
            .fixed_view_mut::<MEASUREMENT_DIM, MEASUREMENT_DIM>(0, MEASUREMENT_DIM)
            .fill_diagonal(params.dt);

        let mut observation = MeasurementModel::zeros();
        observation
            .fixed_view_mut::<MEASUREMENT_DIM, MEASUREMENT_DIM>(0, 0)
            .fill_diagonal(1.0);

        Self {
            transition,
            observation,
            process_noise: StateCovariance::identity() * params.process_noise,
            measurement_noise: MeasurementNoise::identity() * params.measurement_noise,
            state: StateVector::zeros(),
            covariance: StateCovariance::identity() * params.initial_uncertainty,
            status: TrackerStatus::Uninitialized,
            corrections: 0,
            covariance_update,
            params,
        }
    }

    #[inline]
    pub fn params(&self) -> &TrackerParams {
        &self.params
    }

    #[inline]
    pub fn status(&self) -> TrackerStatus {
        self.status
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.status == TrackerStatus::Tracking
    }

    #[inline]
    pub fn state(&self) -> &StateVector {
        &self.state
    }

    #[inline]
    pub fn covariance(&self) -> &StateCovariance {
        &self.covariance
    }

    /// Number of measurements fused after the seeding one.
    #[inline]
    pub fn corrections(&self) -> u64 {
        self.corrections
    }

    /// Propagate one time step. Does nothing before the first measurement.
    pub fn predict(&mut self) {
        if !self.is_initialized() {
            return;
        }
        self.state = self.transition * self.state;
        self.covariance =
            self.transition * self.covariance * self.transition.transpose() + self.process_noise;
    }

    /// Fuse a measured polynomial pair.
    pub fn update(&mut self, left: &LanePolynomial, right: &LanePolynomial) {
        if !left.is_finite() || !right.is_finite() {
            log::warn!("ignoring non-finite lane measurement");
            return;
        }
        let z = Measurement::from_column_slice(&LanePair::new(*left, *right).to_array());

        if !self.is_initialized() {
            self.state = StateVector::zeros();
            self.state.fixed_rows_mut::<MEASUREMENT_DIM>(0).copy_from(&z);
            self.covariance = StateCovariance::identity() * self.params.initial_uncertainty;
            self.status = TrackerStatus::Tracking;
            self.corrections = 0;
            log::debug!("lane tracker seeded from first measurement");
            return;
        }

        let innovation = z - self.observation * self.state;
        let s = self.observation * self.covariance * self.observation.transpose()
            + self.measurement_noise;
        let Some(s_inv) = s.try_inverse() else {
            log::warn!("innovation covariance is singular; correction skipped");
            return;
        };
        let gain: KalmanGain = self.covariance * self.observation.transpose() * s_inv;

        self.state += gain * innovation;
        self.covariance = self.covariance_update.update(
            &self.covariance,
            &gain,
            &self.observation,
            &self.measurement_noise,
        );
        self.corrections += 1;
    }

    /// Update with the measurement, then predict the next frame.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip_all))]
    pub fn update_and_predict(
        &mut self,
        left: &LanePolynomial,
        right: &LanePolynomial,
    ) -> SmoothedLanes {
        self.update(left, right);
        self.predict();
        self.smoothed_unchecked()
    }

    /// Coast through a frame without a measurement.
    ///
    /// Returns `None` while uninitialized.
    pub fn predict_only(&mut self) -> Option<SmoothedLanes> {
        self.predict();
        self.smoothed()
    }

    /// Current estimate, if any measurement has been seen.
    pub fn smoothed(&self) -> Option<SmoothedLanes> {
        self.is_initialized().then(|| self.smoothed_unchecked())
    }

    /// `1 / (1 + trace(P_pos))`, or 0 before the first correction.
    pub fn confidence(&self) -> f64 {
        if !self.is_initialized() || self.corrections == 0 {
            return 0.0;
        }
        let trace: f64 = (0..MEASUREMENT_DIM).map(|i| self.covariance[(i, i)]).sum();
        if !trace.is_finite() {
            return 0.0;
        }
        (1.0 / (1.0 + trace)).clamp(0.0, 1.0)
    }

    /// Forget everything and wait for a new seeding measurement.
    pub fn reset(&mut self) {
        self.state = StateVector::zeros();
        self.covariance = StateCovariance::identity() * self.params.initial_uncertainty;
        self.status = TrackerStatus::Uninitialized;
        self.corrections = 0;
    }

    fn smoothed_unchecked(&self) -> SmoothedLanes {
        let coeffs: [f64; MEASUREMENT_DIM] = std::array::from_fn(|i| self.state[i]);
        let pair = LanePair::from_array(coeffs);
        SmoothedLanes {
            left: pair.left,
            right: pair.right,
            confidence: self.confidence(),
        }
    }
}

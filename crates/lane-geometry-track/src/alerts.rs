use crate::metrics::LaneMetrics;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertParams {
    /// Absolute offset above which a departure is reported, in meters.
    pub lane_offset_threshold_m: f64,
    /// Radius below which a sharp curve is reported, in meters.
    pub curvature_alert_threshold_m: f64,
}

impl Default for AlertParams {
    fn default() -> Self {
        Self {
            lane_offset_threshold_m: 0.5,
            curvature_alert_threshold_m: 500.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LaneAlert {
    LaneDeparture { offset_m: f64 },
    SharpCurve { curvature_m: f64 },
}

impl std::fmt::Display for LaneAlert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LaneDeparture { offset_m } => {
                write!(f, "lane departure warning: offset {offset_m:.2}m")
            }
            Self::SharpCurve { curvature_m } => {
                write!(f, "sharp curve ahead: radius {curvature_m:.0}m")
            }
        }
    }
}

/// Threshold checks on per-frame metrics.
#[derive(Clone, Debug, Default)]
pub struct AlertEngine {
    params: AlertParams,
}

impl AlertEngine {
    pub fn new(params: AlertParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn params(&self) -> &AlertParams {
        &self.params
    }

    /// Alerts raised by `metrics`; both thresholds are strict.
    pub fn evaluate(&self, metrics: &LaneMetrics) -> Vec<LaneAlert> {
        let mut alerts = Vec::new();
        if metrics.offset_m.abs() > self.params.lane_offset_threshold_m {
            alerts.push(LaneAlert::LaneDeparture {
                offset_m: metrics.offset_m,
            });
        }
        if metrics.curvature_m < self.params.curvature_alert_threshold_m {
            alerts.push(LaneAlert::SharpCurve {
                curvature_m: metrics.curvature_m,
            });
        }
        for alert in &alerts {
            log::warn!("{alert}");
        }
        alerts
    }
}

//! JSON configuration and report files.

use crate::render::RenderParams;
use crate::session::FrameReport;
use lane_geometry_detect::DetectorParams;
use lane_geometry_track::{AlertParams, MetricsParams, TrackerParams};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(thiserror::Error, Debug)]
pub enum ConfigIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Every tunable of a [`LaneSession`](crate::LaneSession). Missing JSON
/// fields take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub detector: DetectorParams,
    pub tracker: TrackerParams,
    pub metrics: MetricsParams,
    pub alerts: AlertParams,
    pub render: RenderParams,
    /// Log a metrics line every this many frames; 0 disables it.
    pub log_every: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            detector: DetectorParams::default(),
            tracker: TrackerParams::default(),
            metrics: MetricsParams::default(),
            alerts: AlertParams::default(),
            render: RenderParams::default(),
            log_every: 30,
        }
    }
}

impl SessionConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Aggregates over a processed stream.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub frames: usize,
    pub valid_frames: usize,
    pub alerts: usize,
    pub mean_fps: f64,
    /// Tracker confidence after the last frame.
    pub final_confidence: f64,
    #[serde(default)]
    pub mean_abs_offset_m: Option<f64>,
}

impl SessionSummary {
    pub fn from_frames(frames: &[FrameReport]) -> Self {
        let n = frames.len();
        let valid: Vec<&FrameReport> = frames.iter().filter(|f| f.valid).collect();
        let offsets: Vec<f64> = valid.iter().filter_map(|f| f.offset_m).collect();
        Self {
            frames: n,
            valid_frames: valid.len(),
            alerts: frames.iter().map(|f| f.alerts.len()).sum(),
            mean_fps: if n == 0 {
                0.0
            } else {
                frames.iter().map(|f| f.fps).sum::<f64>() / n as f64
            },
            final_confidence: frames.last().map_or(0.0, |f| f.confidence),
            mean_abs_offset_m: (!offsets.is_empty())
                .then(|| offsets.iter().map(|o| o.abs()).sum::<f64>() / offsets.len() as f64),
        }
    }
}

/// Per-frame records of one stream plus their summary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub frames: Vec<FrameReport>,
    pub summary: SessionSummary,
}

impl SessionReport {
    pub fn new(frames: Vec<FrameReport>) -> Self {
        let summary = SessionSummary::from_frames(&frames);
        Self { frames, summary }
    }

    /// Load a report from JSON on disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lane_geometry_track::LaneAlert;

    fn report(frame_index: u64, valid: bool, offset_m: Option<f64>) -> FrameReport {
        FrameReport {
            frame_index,
            valid,
            offset_m,
            curvature_m: offset_m.map(|_| 1000.0),
            confidence: 0.1 * frame_index as f64,
            fps: 20.0,
            alerts: Vec::new(),
        }
    }

    #[test]
    fn partial_json_uses_defaults() {
        let cfg: SessionConfig = serde_json::from_str(
            r#"{"tracker": {"dt": 0.05}, "alerts": {"lane_offset_threshold_m": 0.3}}"#,
        )
        .expect("json");
        assert_eq!(cfg.tracker.dt, 0.05);
        assert_eq!(cfg.tracker.process_noise, 1e-4);
        assert_eq!(cfg.alerts.lane_offset_threshold_m, 0.3);
        assert_eq!(cfg.alerts.curvature_alert_threshold_m, 500.0);
        assert_eq!(cfg.detector, DetectorParams::default());
        assert_eq!(cfg.log_every, 30);
    }

    #[test]
    fn config_file_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.json");
        let mut cfg = SessionConfig::default();
        cfg.render.line_thickness = 4;
        cfg.detector.window.margin = 60;
        cfg.write_json(&path).expect("write");
        assert_eq!(SessionConfig::load_json(&path).expect("load"), cfg);
    }

    #[test]
    fn missing_config_is_io_error() {
        let err = SessionConfig::load_json("/nonexistent/lane-geometry.json").unwrap_err();
        assert!(matches!(err, ConfigIoError::Io(_)));
    }

    #[test]
    fn summary_counts_valid_frames_and_alerts() {
        let mut frames = vec![
            report(0, true, Some(0.2)),
            report(1, false, None),
            report(2, true, Some(-0.4)),
        ];
        frames[2].alerts.push(LaneAlert::SharpCurve { curvature_m: 300.0 });
        let s = SessionSummary::from_frames(&frames);
        assert_eq!(s.frames, 3);
        assert_eq!(s.valid_frames, 2);
        assert_eq!(s.alerts, 1);
        assert_eq!(s.mean_fps, 20.0);
        assert!((s.final_confidence - 0.2).abs() < 1e-12);
        assert!((s.mean_abs_offset_m.expect("offsets") - 0.3).abs() < 1e-12);
        assert_eq!(SessionSummary::from_frames(&[]), SessionSummary::default());
    }
}

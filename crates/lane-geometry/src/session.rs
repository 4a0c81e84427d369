//! Per-stream processing state.

use crate::config::SessionConfig;
use crate::render::LaneRenderer;
use lane_geometry_core::{ImageError, LanePair, RgbImage, RgbImageView};
use lane_geometry_detect::{LaneDetection, LaneDetector, RectifyError};
use lane_geometry_track::{
    AlertEngine, LaneAlert, LaneMetrics, LaneTracker, MetricsEngine, SmoothedLanes,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Failures that make a frame unprocessable. Frames without lanes are not errors.
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Rectify(#[from] RectifyError),
    #[error(transparent)]
    Image(#[from] ImageError),
}

/// Per-frame result record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    pub frame_index: u64,
    /// Whether the window search produced a lane pair for this frame.
    pub valid: bool,
    pub offset_m: Option<f64>,
    pub curvature_m: Option<f64>,
    pub confidence: f64,
    /// Inverse of this frame's processing time.
    pub fps: f64,
    #[serde(default)]
    pub alerts: Vec<LaneAlert>,
}

/// Everything [`LaneSession::process_frame`] knows about a frame.
#[derive(Clone, Debug)]
pub struct FrameOutput {
    pub report: FrameReport,
    pub detection: LaneDetection,
    /// Tracker estimate; on invalid frames this is the coasted prediction.
    pub smoothed: Option<SmoothedLanes>,
    pub metrics: Option<LaneMetrics>,
}

impl FrameOutput {
    /// Lanes to draw: only frames with a fresh measurement get an overlay.
    pub fn overlay_lanes(&self) -> Option<LanePair> {
        if !self.report.valid {
            return None;
        }
        self.smoothed.map(|s| s.pair())
    }
}

/// One camera stream: detector with its cached homographies, tracker,
/// metrics, alerts and renderer.
#[derive(Clone, Debug)]
pub struct LaneSession {
    config: SessionConfig,
    detector: LaneDetector,
    tracker: LaneTracker,
    metrics: MetricsEngine,
    alerts: AlertEngine,
    renderer: LaneRenderer,
    frame_index: u64,
}

impl Default for LaneSession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl LaneSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            detector: LaneDetector::new(config.detector.clone()),
            tracker: LaneTracker::new(config.tracker.clone()),
            metrics: MetricsEngine::new(config.metrics.clone()),
            alerts: AlertEngine::new(config.alerts.clone()),
            renderer: LaneRenderer::new(config.render.clone()),
            frame_index: 0,
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[inline]
    pub fn tracker(&self) -> &LaneTracker {
        &self.tracker
    }

    #[inline]
    pub fn detector(&self) -> &LaneDetector {
        &self.detector
    }

    /// Index the next processed frame will get.
    #[inline]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Run one frame through detection, tracking, metrics and alerts.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "info", skip_all, fields(frame = self.frame_index))
    )]
    pub fn process_frame(&mut self, frame: &RgbImageView<'_>) -> Result<FrameOutput, SessionError> {
        check_frame(frame)?;
        let started = Instant::now();

        let detection = self.detector.detect(frame)?;
        let (smoothed, metrics, alerts) = match detection.fits() {
            Some(fits) => {
                let smoothed = self.tracker.update_and_predict(&fits.left, &fits.right);
                let metrics = self
                    .metrics
                    .compute(&smoothed.pair(), frame.width, frame.height);
                let alerts = self.alerts.evaluate(&metrics);
                (Some(smoothed), Some(metrics), alerts)
            }
            None => {
                log::debug!(
                    "frame {}: insufficient lane pixels (left={}, right={})",
                    self.frame_index,
                    detection.search.left_points,
                    detection.search.right_points
                );
                (self.tracker.predict_only(), None, Vec::new())
            }
        };

        let elapsed = started.elapsed().as_secs_f64();
        let report = FrameReport {
            frame_index: self.frame_index,
            valid: detection.is_valid(),
            offset_m: metrics.map(|m| m.offset_m),
            curvature_m: metrics.map(|m| m.curvature_m),
            confidence: self.tracker.confidence(),
            fps: if elapsed > 0.0 { 1.0 / elapsed } else { 0.0 },
            alerts,
        };

        if let Some(m) = metrics {
            if self.config.log_every > 0 && report.frame_index % self.config.log_every == 0 {
                log::info!(
                    "frame {}: offset={:.2}m curvature={:.0}m confidence={:.3} fps={:.1}",
                    report.frame_index,
                    m.offset_m,
                    m.curvature_m,
                    report.confidence,
                    report.fps
                );
            }
        }

        self.frame_index += 1;
        Ok(FrameOutput {
            report,
            detection,
            smoothed,
            metrics,
        })
    }

    /// Annotated copy of `frame` for a previously processed output.
    pub fn render(
        &mut self,
        frame: &RgbImageView<'_>,
        output: &FrameOutput,
    ) -> Result<RgbImage, SessionError> {
        check_frame(frame)?;
        let lanes = output.overlay_lanes();
        let transforms = self.detector.transforms(frame.width, frame.height)?;
        Ok(self.renderer.render(frame, lanes.as_ref(), transforms))
    }

    /// Start a new stream: tracker and frame counter reset, homographies kept.
    pub fn reset(&mut self) {
        self.tracker.reset();
        self.frame_index = 0;
    }
}

fn check_frame(frame: &RgbImageView<'_>) -> Result<(), ImageError> {
    RgbImageView::new(frame.width, frame.height, frame.data).map(|_| ())
}

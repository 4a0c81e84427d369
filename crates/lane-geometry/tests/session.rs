mod common;

use common::{asphalt, painted_road, synthetic_road};
use lane_geometry::core::{GrayImage, ImageError, RgbImageView};
use lane_geometry::detect::{LaneDetector, RectifyError};
use lane_geometry::track::LaneTracker;
use lane_geometry::{LaneAlert, LaneSession, SessionConfig, SessionError};

const W: usize = 640;
const H: usize = 360;

#[test]
fn stable_road_builds_confidence() {
    let frame = synthetic_road(W, H, &[200.0, 440.0]);
    let mut session = LaneSession::default();

    let reports: Vec<_> = (0..4)
        .map(|_| session.process_frame(&frame.view()).expect("frame").report)
        .collect();

    for (i, r) in reports.iter().enumerate() {
        assert_eq!(r.frame_index, i as u64);
        assert!(r.valid);
        let offset = r.offset_m.expect("offset on valid frame");
        assert!(offset.abs() < 0.1, "offset {offset}");
        assert!(r.curvature_m.expect("curvature on valid frame") > 0.0);
        assert!(r.fps > 0.0);
        assert!(!r
            .alerts
            .iter()
            .any(|a| matches!(a, LaneAlert::LaneDeparture { .. })));
    }
    assert_eq!(reports[0].confidence, 0.0);
    assert!(reports[1].confidence > 0.0);
    assert!(reports[2].confidence > reports[1].confidence);
    assert!(reports[3].confidence > reports[2].confidence);
    assert_eq!(session.frame_index(), 4);
}

#[test]
fn frame_without_lanes_has_no_metrics() {
    let mut session = LaneSession::default();
    let out = session
        .process_frame(&asphalt(W, H).view())
        .expect("frame");

    assert!(!out.report.valid);
    assert_eq!(out.report.offset_m, None);
    assert_eq!(out.report.curvature_m, None);
    assert_eq!(out.report.confidence, 0.0);
    assert!(out.report.alerts.is_empty());
    assert!(out.smoothed.is_none());
    assert!(!session.tracker().is_initialized());

    let json = serde_json::to_value(&out.report).expect("json");
    assert!(json["offset_m"].is_null());
    assert!(json["curvature_m"].is_null());
}

#[test]
fn sparse_right_line_yields_a_null_record() {
    // Right line painted only over the last few bird's-eye rows.
    let road = painted_road(W, H, &[(200.0, 0.0), (440.0, H as f64 - 3.0)]);
    let mut session = LaneSession::default();
    let out = session.process_frame(&road.view()).expect("frame");

    assert!(out.detection.search.left_points >= 100);
    assert!(out.detection.search.right_points < 100);
    assert!(!out.report.valid);
    assert_eq!(out.report.offset_m, None);
    assert_eq!(out.report.curvature_m, None);
    assert_eq!(out.report.confidence, 0.0);
    assert!(out.report.alerts.is_empty());
    assert!(out.overlay_lanes().is_none());
}

#[test]
fn lane_loss_coasts_the_tracker() {
    let road = synthetic_road(W, H, &[200.0, 440.0]);
    let blank = asphalt(W, H);
    let mut session = LaneSession::default();
    session.process_frame(&road.view()).expect("frame");
    let tracked = session.process_frame(&road.view()).expect("frame");

    let lost = session.process_frame(&blank.view()).expect("frame");
    assert!(!lost.report.valid);
    assert_eq!(lost.report.offset_m, None);
    assert!(lost.report.confidence > 0.0);
    assert!(lost.report.confidence < tracked.report.confidence);
    assert!(lost.smoothed.is_some());
    assert!(lost.overlay_lanes().is_none());

    let rendered = session.render(&blank.view(), &lost).expect("render");
    assert_eq!(rendered, blank);
}

#[test]
fn overlay_marks_the_ego_lane() {
    let road = synthetic_road(W, H, &[200.0, 440.0]);
    let mut session = LaneSession::default();
    session.process_frame(&road.view()).expect("frame");
    let out = session.process_frame(&road.view()).expect("frame");

    let rendered = session.render(&road.view(), &out).expect("render");
    // Asphalt between the lines near the bottom, tinted by the green fill.
    assert_eq!(road.pixel(W / 2, H - 10), [60, 62, 66]);
    assert_eq!(rendered.pixel(W / 2, H - 10), [60, 62 + 76, 66]);
    // Sky above the road region is untouched.
    assert_eq!(rendered.pixel(5, 5), road.pixel(5, 5));
}

#[test]
fn alerts_follow_configured_thresholds() {
    // Lane center at x=280 in a 640-wide view: vehicle 40 px right of center.
    let road = synthetic_road(W, H, &[160.0, 400.0]);

    let mut defaults = LaneSession::default();
    let out = defaults.process_frame(&road.view()).expect("frame");
    let offset = out.report.offset_m.expect("valid");
    assert!(offset > 0.15 && offset < 0.3, "offset {offset}");
    assert!(!out
        .report
        .alerts
        .iter()
        .any(|a| matches!(a, LaneAlert::LaneDeparture { .. })));

    let mut config = SessionConfig::default();
    config.alerts.lane_offset_threshold_m = 0.1;
    config.alerts.curvature_alert_threshold_m = 1e12;
    let mut strict = LaneSession::new(config);
    let out = strict.process_frame(&road.view()).expect("frame");
    assert_eq!(out.report.alerts.len(), 2);
    assert!(matches!(
        out.report.alerts[0],
        LaneAlert::LaneDeparture { offset_m } if offset_m > 0.15
    ));
    assert!(matches!(
        out.report.alerts[1],
        LaneAlert::SharpCurve { .. }
    ));
}

#[test]
fn malformed_frames_are_configuration_errors() {
    let mut session = LaneSession::default();

    let empty = RgbImageView {
        width: 0,
        height: 0,
        data: &[],
    };
    let err = session.process_frame(&empty).unwrap_err();
    assert!(matches!(
        err,
        SessionError::Rectify(RectifyError::InvalidDimensions { .. })
    ));

    let short = vec![0u8; 10];
    let bad = RgbImageView {
        width: 4,
        height: 4,
        data: &short,
    };
    let err = session.process_frame(&bad).unwrap_err();
    assert!(matches!(
        err,
        SessionError::Image(ImageError::BufferLength {
            expected: 48,
            got: 10
        })
    ));
    assert_eq!(session.frame_index(), 0);
}

#[test]
fn reset_starts_a_new_stream_with_cached_transforms() {
    let road = synthetic_road(W, H, &[200.0, 440.0]);
    let mut session = LaneSession::default();
    session.process_frame(&road.view()).expect("frame");
    session.process_frame(&road.view()).expect("frame");

    session.reset();
    assert_eq!(session.frame_index(), 0);
    assert!(!session.tracker().is_initialized());
    assert_eq!(session.detector().rectifier().cached_size(), Some((W, H)));

    let first = session.process_frame(&road.view()).expect("frame");
    assert_eq!(first.report.frame_index, 0);
    assert_eq!(first.report.confidence, 0.0);
}

/// Two straight lines in a 1280x720 bird's-eye mask, through the fitter and
/// the tracker.
#[test]
fn straight_mask_scenario_at_720p() {
    let (w, h) = (1280, 720);
    let mut mask = GrayImage::new(w, h);
    for y in 0..h {
        for x in [299, 300, 301, 899, 900, 901] {
            mask.set(x, y, 255);
        }
    }

    let detection = LaneDetector::default().detect_in_mask(mask);
    let fits = *detection.fits().expect("valid fit");
    for (poly, c) in [(fits.left, 300.0), (fits.right, 900.0)] {
        assert!(poly.a.abs() < 1e-9);
        assert!(poly.b.abs() < 1e-6);
        assert!((poly.c - c).abs() < 1e-6);
    }

    let mut tracker = LaneTracker::default();
    let first = tracker.update_and_predict(&fits.left, &fits.right);
    assert_eq!(first.confidence, 0.0);
    assert!((first.left.c - 300.0).abs() < 1e-6);
    assert!((first.right.c - 900.0).abs() < 1e-6);

    let second = tracker.update_and_predict(&fits.left, &fits.right);
    let third = tracker.update_and_predict(&fits.left, &fits.right);
    assert!(second.confidence > 0.0);
    assert!(third.confidence > second.confidence);
}

#[test]
fn sparse_right_lane_is_reported_invalid() {
    let (w, h) = (1280, 720);
    let mut mask = GrayImage::new(w, h);
    for y in 0..h {
        for x in 299..=301 {
            mask.set(x, y, 255);
        }
    }
    for y in 690..720 {
        mask.set(900, y, 255);
    }
    let detection = LaneDetector::default().detect_in_mask(mask);
    assert!(!detection.is_valid());
    assert!(detection.search.right_points < 100);
}

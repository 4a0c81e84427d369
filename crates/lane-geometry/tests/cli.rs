#![cfg(feature = "cli")]

mod common;

use assert_cmd::Command;
use common::{asphalt, synthetic_road};
use lane_geometry::core::RgbImage;
use lane_geometry::frame_io::to_image_rgb;
use lane_geometry::SessionReport;
use predicates::prelude::*;
use std::path::Path;

fn write_png(dir: &Path, name: &str, frame: RgbImage) {
    to_image_rgb(frame)
        .expect("frame fits")
        .save(dir.join(name))
        .expect("save png");
}

fn frames_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    let road = synthetic_road(640, 360, &[200.0, 440.0]);
    write_png(dir.path(), "frame_000.png", road.clone());
    write_png(dir.path(), "frame_001.png", road.clone());
    write_png(dir.path(), "frame_002.png", asphalt(640, 360));
    write_png(dir.path(), "frame_003.png", road);
    std::fs::write(dir.path().join("README.txt"), "not a frame").expect("write");
    dir
}

#[test]
fn writes_report_and_annotated_frames() {
    let frames = frames_dir();
    let out = tempfile::tempdir().expect("tempdir");
    let report_path = out.path().join("report.json");
    let annotated = out.path().join("annotated");

    Command::cargo_bin("lane-geometry")
        .expect("binary")
        .arg("--frames")
        .arg(frames.path())
        .arg("--output-dir")
        .arg(&annotated)
        .arg("--report")
        .arg(&report_path)
        .arg("--log-level")
        .arg("warn")
        .assert()
        .success();

    let report = SessionReport::load_json(&report_path).expect("report");
    assert_eq!(report.frames.len(), 4);
    assert_eq!(report.summary.frames, 4);
    assert_eq!(report.summary.valid_frames, 3);

    let valid: Vec<bool> = report.frames.iter().map(|f| f.valid).collect();
    assert_eq!(valid, [true, true, false, true]);
    assert_eq!(report.frames[0].confidence, 0.0);
    assert!(report.frames[1].confidence > 0.0);
    assert_eq!(report.frames[2].offset_m, None);
    assert!(report.frames[3].offset_m.is_some());

    for i in 0..4 {
        assert!(annotated.join(format!("frame_{i:03}.png")).is_file());
    }
}

#[test]
fn prints_report_without_report_path() {
    let frames = frames_dir();
    Command::cargo_bin("lane-geometry")
        .expect("binary")
        .arg("--frames")
        .arg(frames.path())
        .arg("--log-level")
        .arg("off")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"summary\"").and(predicate::str::contains("\"valid_frames\": 3")));
}

#[test]
fn writes_bird_eye_masks() {
    let frames = frames_dir();
    let out = tempfile::tempdir().expect("tempdir");
    let masks = out.path().join("masks");

    Command::cargo_bin("lane-geometry")
        .expect("binary")
        .arg("--frames")
        .arg(frames.path())
        .arg("--mask-dir")
        .arg(&masks)
        .arg("--log-level")
        .arg("off")
        .assert()
        .success();

    let lit = |name: &str| {
        let mask = image::open(masks.join(name)).expect("mask png").to_luma8();
        assert_eq!(mask.dimensions(), (640, 360));
        mask.pixels().filter(|p| p.0[0] > 0).count()
    };
    assert!(lit("frame_000.png") > 1000);
    assert_eq!(lit("frame_002.png"), 0);
}

#[test]
fn config_file_is_applied() {
    let frames = frames_dir();
    let out = tempfile::tempdir().expect("tempdir");
    let config_path = out.path().join("config.json");
    std::fs::write(
        &config_path,
        r#"{"alerts": {"curvature_alert_threshold_m": 1e12}}"#,
    )
    .expect("write config");
    let report_path = out.path().join("report.json");

    Command::cargo_bin("lane-geometry")
        .expect("binary")
        .arg("--frames")
        .arg(frames.path())
        .arg("--config")
        .arg(&config_path)
        .arg("--report")
        .arg(&report_path)
        .arg("--log-level")
        .arg("off")
        .assert()
        .success();

    let report = SessionReport::load_json(&report_path).expect("report");
    assert_eq!(report.summary.alerts, 3);
}

#[test]
fn empty_directory_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    Command::cargo_bin("lane-geometry")
        .expect("binary")
        .arg("--frames")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no png/jpg frames"));
}

#[test]
fn invalid_log_level_fails() {
    let frames = frames_dir();
    Command::cargo_bin("lane-geometry")
        .expect("binary")
        .arg("--frames")
        .arg(frames.path())
        .arg("--log-level")
        .arg("loud")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid log level"));
}

//! Lane geometry from a stream of camera frames.
//!
//! This crate provides:
//! - re-exports of the `lane-geometry-*` crates
//! - [`LaneSession`], the per-stream pipeline producing a [`FrameReport`] per frame
//! - [`LaneRenderer`] for the translucent lane overlay
//! - JSON configuration ([`SessionConfig`]) and reports ([`SessionReport`])
//! - helpers bridging `image::RgbImage` and frame files
//!
//! ## Quickstart
//!
//! ```
//! use lane_geometry::{LaneSession, SessionConfig};
//! use lane_geometry::core::RgbImage;
//!
//! let mut session = LaneSession::new(SessionConfig::default());
//! let frame = RgbImage::new(1280, 720);
//! let out = session.process_frame(&frame.view()).expect("well-formed frame");
//! assert!(!out.report.valid);
//! assert_eq!(out.report.offset_m, None);
//! ```
//!
//! ## API map
//! - `lane_geometry::core`: image buffers, homographies, lane polynomials, logger.
//! - `lane_geometry::detect`: rectifier, segmenter, sliding-window fitter.
//! - `lane_geometry::track`: Kalman tracker, metrics, alerts.
//! - `lane_geometry::frame_io`: `image` crate interop and frame listing.

pub use lane_geometry_core as core;
pub use lane_geometry_detect as detect;
pub use lane_geometry_track as track;

mod config;
pub mod render;
mod session;

pub mod frame_io;

pub use config::{ConfigIoError, SessionConfig, SessionReport, SessionSummary};
pub use render::{LaneRenderer, RenderParams};
pub use session::{FrameOutput, FrameReport, LaneSession, SessionError};

pub use lane_geometry_core::{LanePair, LanePolynomial};
pub use lane_geometry_detect::DetectorParams;
pub use lane_geometry_track::{LaneAlert, LaneMetrics, TrackerParams};

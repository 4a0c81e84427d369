//! Lane boundary detection on single camera frames.
//!
//! ## Quickstart
//!
//! ```
//! use lane_geometry_core::RgbImage;
//! use lane_geometry_detect::{DetectorParams, LaneDetector};
//!
//! let frame = RgbImage::new(1280, 720);
//! let mut detector = LaneDetector::new(DetectorParams::default());
//! let detection = detector.detect(&frame.view()).expect("non-empty frame");
//! println!("lanes found: {}", detection.is_valid());
//! ```
//!
//! Pipeline:
//! 1. Warp the road trapezoid into a bird's-eye rectangle (homography cached
//!    per frame size).
//! 2. Threshold yellow and white paint in HSV, then close and open the mask.
//! 3. Sliding-window search from the histogram peaks and a quadratic fit per
//!    side.

pub mod color;
mod detector;
pub mod interop;
pub mod morphology;
mod rectify;
mod segment;
mod window;

pub use detector::{DetectorParams, LaneDetection, LaneDetector};
pub use rectify::{PerspectivePair, PerspectiveRectifier, RectifierParams, RectifyError};
pub use segment::{LaneSegmenter, SegmenterParams};
pub use window::{
    fit_quadratic, SearchWindow, SlidingWindowFitter, WindowSearchParams, WindowSearchResult,
};

//! Core types shared by the lane-geometry crates.
//!
//! This crate is small and purely geometric: borrowed/owned image buffers,
//! planar homographies with a perspective warp, and the lane polynomial types
//! that flow between detection, tracking and metrics.

mod homography;
mod image;
mod logger;
mod polynomial;

pub use homography::{homography_from_quad, warp_perspective_rgb, Homography};
pub use image::{
    sample_bilinear_rgb, GrayImage, GrayImageView, ImageError, RgbImage, RgbImageView,
};
pub use polynomial::{LanePair, LanePolynomial, LaneSide};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;

//! Binary morphology with a square structuring element.
//!
//! A `kernel_size` square applied `iterations` times equals one pass with
//! the L-infinity ball of radius `iterations * (kernel_size / 2)`, which is
//! what `imageproc::morphology` computes from a distance transform. Pixels
//! outside the image never count as background, so the border neither grows
//! nor erodes the mask.

use crate::interop::{from_luma, to_luma};
use imageproc::distance_transform::Norm;
use lane_geometry_core::GrayImage;

fn radius(kernel_size: usize, iterations: usize) -> u8 {
    let r = (kernel_size / 2).saturating_mul(iterations);
    u8::try_from(r).unwrap_or(u8::MAX)
}

fn apply(
    src: &GrayImage,
    kernel_size: usize,
    iterations: usize,
    op: fn(&image::GrayImage, Norm, u8) -> image::GrayImage,
) -> GrayImage {
    let k = radius(kernel_size, iterations);
    if k == 0 || src.width == 0 || src.height == 0 {
        return src.clone();
    }
    match to_luma(src) {
        Some(luma) => from_luma(op(&luma, Norm::LInf, k)),
        None => {
            log::warn!(
                "mask {}x{} does not fit an image buffer; left unfiltered",
                src.width,
                src.height
            );
            src.clone()
        }
    }
}

pub fn dilate(src: &GrayImage, kernel_size: usize, iterations: usize) -> GrayImage {
    apply(src, kernel_size, iterations, imageproc::morphology::dilate)
}

pub fn erode(src: &GrayImage, kernel_size: usize, iterations: usize) -> GrayImage {
    apply(src, kernel_size, iterations, imageproc::morphology::erode)
}

/// Closing: `iterations` dilations followed by as many erosions.
pub fn close(src: &GrayImage, kernel_size: usize, iterations: usize) -> GrayImage {
    apply(src, kernel_size, iterations, imageproc::morphology::close)
}

/// Opening: `iterations` erosions followed by as many dilations.
pub fn open(src: &GrayImage, kernel_size: usize, iterations: usize) -> GrayImage {
    apply(src, kernel_size, iterations, imageproc::morphology::open)
}

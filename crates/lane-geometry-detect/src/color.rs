//! HSV conversion and range thresholding for lane-marking colors.

use crate::interop::{from_luma, view_to_rgb};
use image::{Luma, Rgb};
use imageproc::map::map_colors;
use lane_geometry_core::{GrayImage, RgbImageView};
use serde::{Deserialize, Serialize};

/// Convert one RGB pixel to 8-bit HSV.
///
/// Hue is in half-degrees, `[0, 180)`; saturation and value span `[0, 255]`.
#[inline]
pub fn rgb_to_hsv(rgb: [u8; 3]) -> [u8; 3] {
    let r = rgb[0] as f32;
    let g = rgb[1] as f32;
    let b = rgb[2] as f32;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let v = max;
    let s = if max > 0.0 { 255.0 * delta / max } else { 0.0 };

    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    let h = if h < 0.0 { h + 360.0 } else { h };

    let h = (h / 2.0).round() as u16 % 180;
    [h as u8, s.round() as u8, v as u8]
}

/// Inclusive per-channel HSV bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    #[inline]
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|c| self.lower[c] <= hsv[c] && hsv[c] <= self.upper[c])
    }
}

/// Per-pixel 8-bit HSV image of an RGB image.
pub fn hsv_from_rgb(rgb: &image::RgbImage) -> image::RgbImage {
    map_colors(rgb, |p: Rgb<u8>| Rgb(rgb_to_hsv(p.0)))
}

/// Mark every pixel whose HSV value falls into any of `ranges` with 255.
pub fn threshold_hsv_union(src: &RgbImageView<'_>, ranges: &[HsvRange]) -> GrayImage {
    let Some(rgb) = view_to_rgb(src) else {
        log::warn!(
            "frame {}x{} does not match its buffer; nothing thresholded",
            src.width,
            src.height
        );
        return GrayImage::new(src.width, src.height);
    };
    let hsv = hsv_from_rgb(&rgb);
    let mask = map_colors(&hsv, |p: Rgb<u8>| {
        let hit = ranges.iter().any(|r| r.contains(p.0));
        Luma([if hit { 255u8 } else { 0 }])
    });
    from_luma(mask)
}

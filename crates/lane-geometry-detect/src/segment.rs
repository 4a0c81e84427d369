//! Lane-marking segmentation of a rectified frame.

use crate::color::{threshold_hsv_union, HsvRange};
use crate::morphology::{close, open};
use lane_geometry_core::{GrayImage, RgbImageView};
use serde::{Deserialize, Serialize};

/// Color ranges and cleanup settings for [`LaneSegmenter`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterParams {
    /// Yellow paint (8-bit HSV, hue in half-degrees).
    pub yellow: HsvRange,
    /// White paint: any hue, low saturation, bright.
    pub white: HsvRange,
    /// Side of the square structuring element.
    pub kernel_size: usize,
    pub close_iterations: usize,
    pub open_iterations: usize,
}

impl Default for SegmenterParams {
    fn default() -> Self {
        Self {
            yellow: HsvRange::new([15, 80, 160], [40, 255, 255]),
            white: HsvRange::new([0, 0, 200], [255, 20, 255]),
            kernel_size: 3,
            close_iterations: 2,
            open_iterations: 1,
        }
    }
}

/// Produces a {0, 255} mask of probable lane-marking pixels.
#[derive(Clone, Debug, Default)]
pub struct LaneSegmenter {
    params: SegmenterParams,
}

impl LaneSegmenter {
    pub fn new(params: SegmenterParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn params(&self) -> &SegmenterParams {
        &self.params
    }

    /// Threshold yellow and white paint, then close small gaps and open away speckle.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", skip_all, fields(width = rectified.width, height = rectified.height))
    )]
    pub fn segment(&self, rectified: &RgbImageView<'_>) -> GrayImage {
        let p = &self.params;
        let raw = threshold_hsv_union(rectified, &[p.yellow, p.white]);
        let closed = close(&raw, p.kernel_size, p.close_iterations);
        let mask = open(&closed, p.kernel_size, p.open_iterations);
        log::trace!(
            "segmented {} raw / {} cleaned lane pixels",
            raw.count_nonzero(),
            mask.count_nonzero()
        );
        mask
    }
}

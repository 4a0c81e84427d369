//! Bird's-eye rectification of the road region.

use lane_geometry_core::{
    homography_from_quad, warp_perspective_rgb, Homography, ImageError, RgbImage, RgbImageView,
};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RectifyError {
    #[error("frame dimensions must be positive (width={width}, height={height})")]
    InvalidDimensions { width: usize, height: usize },
    #[error("perspective quadrilateral is degenerate")]
    Degenerate,
    #[error(transparent)]
    Image(#[from] ImageError),
}

/// Road trapezoid and target rectangle, as fractions of the frame size.
///
/// Corners are listed bottom-left, bottom-right, top-right, top-left. The
/// defaults assume a centred, forward-facing camera with the road in the
/// lower ~36% of the frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RectifierParams {
    /// Source trapezoid in `(x / width, y / height)`.
    pub src_ratios: [[f64; 2]; 4],
    /// Destination rectangle in `(x / width, y / height)`.
    pub dst_ratios: [[f64; 2]; 4],
}

impl Default for RectifierParams {
    fn default() -> Self {
        Self {
            src_ratios: [[0.15, 1.0], [0.85, 1.0], [0.55, 0.64], [0.45, 0.64]],
            dst_ratios: [[0.25, 1.0], [0.75, 1.0], [0.75, 0.0], [0.25, 0.0]],
        }
    }
}

impl RectifierParams {
    fn scaled(ratios: &[[f64; 2]; 4], width: usize, height: usize) -> [Point2<f64>; 4] {
        ratios.map(|[rx, ry]| Point2::new(rx * width as f64, ry * height as f64))
    }

    /// Source trapezoid in pixels for a `width` x `height` frame.
    pub fn source_quad(&self, width: usize, height: usize) -> [Point2<f64>; 4] {
        Self::scaled(&self.src_ratios, width, height)
    }

    /// Destination rectangle in pixels for a `width` x `height` frame.
    pub fn destination_quad(&self, width: usize, height: usize) -> [Point2<f64>; 4] {
        Self::scaled(&self.dst_ratios, width, height)
    }
}

/// Camera <-> bird's-eye transforms for one frame size.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerspectivePair {
    pub width: usize,
    pub height: usize,
    /// Camera pixels to rectified pixels.
    pub forward: Homography,
    /// Rectified pixels to camera pixels; the inverse of `forward`.
    pub inverse: Homography,
}

impl PerspectivePair {
    pub fn compute(
        params: &RectifierParams,
        width: usize,
        height: usize,
    ) -> Result<Self, RectifyError> {
        if width == 0 || height == 0 {
            return Err(RectifyError::InvalidDimensions { width, height });
        }
        let src = params.source_quad(width, height);
        let dst = params.destination_quad(width, height);
        let forward = homography_from_quad(&src, &dst).ok_or(RectifyError::Degenerate)?;
        let inverse = forward.inverse().ok_or(RectifyError::Degenerate)?;
        Ok(Self {
            width,
            height,
            forward,
            inverse,
        })
    }
}

/// Caches the perspective pair of the most recent frame size.
///
/// One rectifier belongs to one stream; it recomputes only when the frame
/// size changes.
#[derive(Clone, Debug, Default)]
pub struct PerspectiveRectifier {
    params: RectifierParams,
    cached: Option<PerspectivePair>,
}

impl PerspectiveRectifier {
    pub fn new(params: RectifierParams) -> Self {
        Self {
            params,
            cached: None,
        }
    }

    #[inline]
    pub fn params(&self) -> &RectifierParams {
        &self.params
    }

    /// Size the cached transforms were computed for, if any.
    pub fn cached_size(&self) -> Option<(usize, usize)> {
        self.cached.as_ref().map(|p| (p.width, p.height))
    }

    /// Most recently computed transforms.
    pub fn cached(&self) -> Option<&PerspectivePair> {
        self.cached.as_ref()
    }

    /// Transforms for a `width` x `height` frame, computing them on a size change.
    pub fn transforms(
        &mut self,
        width: usize,
        height: usize,
    ) -> Result<&PerspectivePair, RectifyError> {
        let stale = self.cached_size() != Some((width, height));
        if stale {
            let pair = PerspectivePair::compute(&self.params, width, height)?;
            log::debug!("perspective transforms computed for {width}x{height}");
            self.cached = Some(pair);
        }
        self.cached.as_ref().ok_or(RectifyError::Degenerate)
    }

    /// Warp `frame` into the bird's-eye view (same size as the input).
    ///
    /// A view whose buffer disagrees with its dimensions is rejected.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", skip_all, fields(width = frame.width, height = frame.height))
    )]
    pub fn rectify(&mut self, frame: &RgbImageView<'_>) -> Result<RgbImage, RectifyError> {
        let pair = self.transforms(frame.width, frame.height)?;
        RgbImageView::new(frame.width, frame.height, frame.data)?;
        Ok(warp_perspective_rgb(
            frame,
            &pair.inverse,
            frame.width,
            frame.height,
        ))
    }
}

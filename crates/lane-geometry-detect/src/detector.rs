use crate::rectify::{PerspectivePair, PerspectiveRectifier, RectifierParams, RectifyError};
use crate::segment::{LaneSegmenter, SegmenterParams};
use crate::window::{SlidingWindowFitter, WindowSearchParams, WindowSearchResult};
use lane_geometry_core::{GrayImage, LanePair, RgbImageView};
use serde::{Deserialize, Serialize};

/// Parameters of the full per-frame detection chain.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorParams {
    pub rectifier: RectifierParams,
    pub segmenter: SegmenterParams,
    pub window: WindowSearchParams,
}

/// Output of one detection run.
#[derive(Clone, Debug)]
pub struct LaneDetection {
    /// Bird's-eye lane mask the search ran on.
    pub mask: GrayImage,
    pub search: WindowSearchResult,
}

impl LaneDetection {
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.search.is_valid()
    }

    #[inline]
    pub fn fits(&self) -> Option<&LanePair> {
        self.search.fits.as_ref()
    }
}

/// Rectify -> segment -> sliding-window fit, with the homography cached per stream.
#[derive(Clone, Debug, Default)]
pub struct LaneDetector {
    rectifier: PerspectiveRectifier,
    segmenter: LaneSegmenter,
    fitter: SlidingWindowFitter,
}

impl LaneDetector {
    pub fn new(params: DetectorParams) -> Self {
        Self {
            rectifier: PerspectiveRectifier::new(params.rectifier),
            segmenter: LaneSegmenter::new(params.segmenter),
            fitter: SlidingWindowFitter::new(params.window),
        }
    }

    #[inline]
    pub fn rectifier(&self) -> &PerspectiveRectifier {
        &self.rectifier
    }

    /// Transforms for the given frame size (computed and cached on demand).
    pub fn transforms(
        &mut self,
        width: usize,
        height: usize,
    ) -> Result<&PerspectivePair, RectifyError> {
        self.rectifier.transforms(width, height)
    }

    /// Detect lane boundaries in a camera frame.
    ///
    /// Only frame-size problems are errors; a frame without enough lane
    /// pixels yields an invalid detection.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "info", skip_all, fields(width = frame.width, height = frame.height))
    )]
    pub fn detect(&mut self, frame: &RgbImageView<'_>) -> Result<LaneDetection, RectifyError> {
        let rectified = self.rectifier.rectify(frame)?;
        let mask = self.segmenter.segment(&rectified.view());
        let search = self.fitter.search(&mask);
        Ok(LaneDetection { mask, search })
    }

    /// Run only the window search, for callers that already hold a mask.
    pub fn detect_in_mask(&self, mask: GrayImage) -> LaneDetection {
        let search = self.fitter.search(&mask);
        LaneDetection { mask, search }
    }
}

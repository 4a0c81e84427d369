//! Sliding-window lane search and quadratic fitting.
//!
//! 1. Column histogram of the lower half of the mask; the peaks left and
//!    right of the centre seed the two lane bases.
//! 2. The mask is cut into horizontal bands scanned bottom-up. In every band
//!    a box of `±margin` around each side's current x collects mask pixels.
//! 3. A box with more than `min_recenter_pixels` hits moves that side's x to
//!    the mean column of its hits.
//! 4. All hits per side are fitted with `x = a*y^2 + b*y + c`. The pair is
//!    accepted only when both sides have `min_lane_points` hits.

use lane_geometry_core::{GrayImage, LanePair, LanePolynomial, LaneSide};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSearchParams {
    /// Number of horizontal bands.
    pub num_windows: usize,
    /// Half-width of each search box, in pixels.
    pub margin: usize,
    /// Hits above which a box re-centres its side.
    pub min_recenter_pixels: usize,
    /// Minimum hits per side for an accepted fit.
    pub min_lane_points: usize,
}

impl Default for WindowSearchParams {
    fn default() -> Self {
        Self {
            num_windows: 9,
            margin: 80,
            min_recenter_pixels: 50,
            min_lane_points: 100,
        }
    }
}

/// One visited search box. Columns are `[x_low, x_high)`, rows `[y_low, y_high)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchWindow {
    pub side: LaneSide,
    pub x_low: usize,
    pub x_high: usize,
    pub y_low: usize,
    pub y_high: usize,
    pub hits: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WindowSearchResult {
    /// Fitted boundaries; `None` when either side lacks evidence.
    pub fits: Option<LanePair>,
    pub left_base: usize,
    pub right_base: usize,
    pub left_points: usize,
    pub right_points: usize,
    pub windows: Vec<SearchWindow>,
}

impl WindowSearchResult {
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.fits.is_some()
    }

    fn empty() -> Self {
        Self {
            fits: None,
            left_base: 0,
            right_base: 0,
            left_points: 0,
            right_points: 0,
            windows: Vec::new(),
        }
    }
}

#[derive(Default)]
struct SideTrack {
    x: usize,
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl SideTrack {
    fn seeded(x: usize) -> Self {
        Self {
            x,
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SlidingWindowFitter {
    params: WindowSearchParams,
}

impl SlidingWindowFitter {
    pub fn new(params: WindowSearchParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn params(&self) -> &WindowSearchParams {
        &self.params
    }

    /// Run the windowed search over a binary mask and fit both boundaries.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", skip_all, fields(width = mask.width, height = mask.height))
    )]
    pub fn search(&self, mask: &GrayImage) -> WindowSearchResult {
        let (w, h) = (mask.width, mask.height);
        if w == 0 || h == 0 {
            return WindowSearchResult::empty();
        }

        let hist = column_histogram(mask, h / 2);
        let midpoint = w / 2;
        let left_base = argmax(&hist[..midpoint]);
        let right_base = argmax(&hist[midpoint..]) + midpoint;

        let p = &self.params;
        let window_height = h / p.num_windows.max(1);
        let mut left = SideTrack::seeded(left_base);
        let mut right = SideTrack::seeded(right_base);
        let mut windows = Vec::with_capacity(2 * p.num_windows);

        for k in 0..p.num_windows {
            let y_low = h.saturating_sub((k + 1) * window_height);
            let y_high = h.saturating_sub(k * window_height);
            if y_low >= y_high {
                break;
            }
            for (side, track) in [(LaneSide::Left, &mut left), (LaneSide::Right, &mut right)] {
                let x_low = track.x.saturating_sub(p.margin);
                let x_high = (track.x + p.margin).min(w);
                let before = track.xs.len();
                let mut sum_x = 0usize;

                for y in y_low..y_high {
                    let row = &mask.data[y * w..(y + 1) * w];
                    for (x, &v) in row.iter().enumerate().take(x_high).skip(x_low) {
                        if v != 0 {
                            track.xs.push(x as f64);
                            track.ys.push(y as f64);
                            sum_x += x;
                        }
                    }
                }

                let hits = track.xs.len() - before;
                if hits > p.min_recenter_pixels {
                    track.x = sum_x / hits;
                }
                windows.push(SearchWindow {
                    side,
                    x_low,
                    x_high,
                    y_low,
                    y_high,
                    hits,
                });
            }
        }

        let left_points = left.xs.len();
        let right_points = right.xs.len();
        let fits = if left_points >= p.min_lane_points && right_points >= p.min_lane_points {
            fit_quadratic(&left.ys, &left.xs)
                .zip(fit_quadratic(&right.ys, &right.xs))
                .map(|(l, r)| LanePair::new(l, r))
        } else {
            None
        };

        if fits.is_none() {
            log::debug!(
                "insufficient lane evidence: left={left_points} right={right_points} (need {})",
                p.min_lane_points
            );
        }

        WindowSearchResult {
            fits,
            left_base,
            right_base,
            left_points,
            right_points,
            windows,
        }
    }
}

/// Nonzero count per column over rows `[from_row, height)`.
fn column_histogram(mask: &GrayImage, from_row: usize) -> Vec<u32> {
    let mut hist = vec![0u32; mask.width];
    for row in mask.data.chunks_exact(mask.width).skip(from_row) {
        for (bin, &v) in hist.iter_mut().zip(row) {
            *bin += u32::from(v != 0);
        }
    }
    hist
}

/// Index of the first maximum; 0 for an empty slice.
fn argmax(values: &[u32]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Least-squares fit of `x = a*y^2 + b*y + c`.
///
/// Rows are scaled into `[-1, 1]` before solving; rank-deficient inputs get
/// the minimum-norm solution.
pub fn fit_quadratic(ys: &[f64], xs: &[f64]) -> Option<LanePolynomial> {
    let n = ys.len();
    if n == 0 || n != xs.len() {
        return None;
    }
    let scale = ys.iter().fold(1.0_f64, |m, y| m.max(y.abs()));

    let a = DMatrix::from_fn(n, 3, |r, c| {
        let t = ys[r] / scale;
        match c {
            0 => t * t,
            1 => t,
            _ => 1.0,
        }
    });
    let b = DVector::from_column_slice(xs);
    let sol = a.svd(true, true).solve(&b, 1e-12).ok()?;

    let poly = LanePolynomial::new(sol[0] / (scale * scale), sol[1] / scale, sol[2]);
    poly.is_finite().then_some(poly)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// Straight lane lines of three pixel columns centred on each `x`, drawn
    /// on `rows_per_window` rows of every band.
    fn straight_lines_mask(w: usize, h: usize, xs: &[usize], rows_per_window: usize) -> GrayImage {
        let mut mask = GrayImage::new(w, h);
        let band = h / 9;
        for y in 0..h {
            if y % band >= rows_per_window {
                continue;
            }
            for &x in xs {
                for dx in [x - 1, x, x + 1] {
                    mask.set(dx, y, 255);
                }
            }
        }
        mask
    }

    #[test]
    fn straight_lines_give_constant_fits() {
        let mask = straight_lines_mask(1280, 720, &[300, 900], 50);
        let res = SlidingWindowFitter::default().search(&mask);

        assert_eq!(res.left_base, 299);
        assert_eq!(res.right_base, 899);
        assert_eq!(res.left_points, 9 * 150);
        assert_eq!(res.right_points, 9 * 150);

        let fits = res.fits.expect("valid fit");
        assert_abs_diff_eq!(fits.left.a, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(fits.left.b, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(fits.left.c, 300.0, epsilon = 1e-6);
        assert_abs_diff_eq!(fits.right.a, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(fits.right.b, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(fits.right.c, 900.0, epsilon = 1e-6);
    }

    #[test]
    fn windows_recentre_on_a_slanted_line() {
        // x = 200 + 0.25 * (719 - y): drifts 180 px over the frame, more
        // than the search margin, so only re-centring can follow it.
        let (w, h) = (1280, 720);
        let mut mask = GrayImage::new(w, h);
        for y in 0..h {
            let xl = 200 + (h - 1 - y) / 4;
            for dx in 0..3 {
                mask.set(xl + dx, y, 255);
                mask.set(1000 + dx, y, 255);
            }
        }
        let res = SlidingWindowFitter::default().search(&mask);
        let fits = res.fits.expect("valid fit");
        assert_eq!(res.left_points, 3 * 720);
        assert_abs_diff_eq!(fits.left.b, -0.25, epsilon = 0.01);
        assert_abs_diff_eq!(fits.left.eval(0.0), 200.0 + 719.0 / 4.0 + 1.0, epsilon = 2.0);
    }

    #[test]
    fn sparse_right_side_is_invalid() {
        let mut mask = straight_lines_mask(1280, 720, &[300], 50);
        for y in 700..720 {
            mask.set(900, y, 255);
        }
        let res = SlidingWindowFitter::default().search(&mask);
        assert!(!res.is_valid());
        assert_eq!(res.right_points, 20);
        assert!(res.left_points >= 100);
    }

    #[test]
    fn empty_mask_is_invalid() {
        let res = SlidingWindowFitter::default().search(&GrayImage::new(200, 90));
        assert!(!res.is_valid());
        assert_eq!(res.windows.len(), 18);
        assert_eq!((res.left_base, res.right_base), (0, 100));
    }

    #[test]
    fn zero_sized_mask_is_invalid() {
        let res = SlidingWindowFitter::default().search(&GrayImage::new(0, 0));
        assert!(!res.is_valid());
        assert!(res.windows.is_empty());
    }

    #[test]
    fn quadratic_fit_recovers_curve() {
        let ys: Vec<f64> = (0..720).step_by(7).map(|y| y as f64).collect();
        let xs: Vec<f64> = ys.iter().map(|y| 3e-4 * y * y - 0.2 * y + 350.0).collect();
        let p = fit_quadratic(&ys, &xs).expect("fit");
        assert_abs_diff_eq!(p.a, 3e-4, epsilon = 1e-10);
        assert_abs_diff_eq!(p.b, -0.2, epsilon = 1e-7);
        assert_abs_diff_eq!(p.c, 350.0, epsilon = 1e-5);
    }

    #[test]
    fn argmax_prefers_first_peak() {
        assert_eq!(argmax(&[1, 5, 5, 2]), 1);
        assert_eq!(argmax(&[]), 0);
    }
}

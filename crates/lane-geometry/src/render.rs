//! Lane overlay: draw in the bird's-eye view, warp back, blend.

use image::Rgb;
use imageproc::drawing::{draw_filled_rect_mut, draw_polygon_mut, BresenhamLineIter};
use imageproc::map::map_colors2;
use imageproc::point::Point;
use imageproc::rect::Rect;
use lane_geometry_core::{warp_perspective_rgb, LanePair, LanePolynomial, RgbImage, RgbImageView};
use lane_geometry_detect::interop::{from_rgb, rgb_view, to_rgb, view_to_rgb};
use lane_geometry_detect::PerspectivePair;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderParams {
    /// RGB color of the region between the boundaries.
    pub fill_color: [u8; 3],
    /// RGB color of the boundary polylines.
    pub line_color: [u8; 3],
    pub line_thickness: u32,
    pub frame_weight: f64,
    pub overlay_weight: f64,
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            fill_color: [0, 255, 0],
            line_color: [0, 0, 255],
            line_thickness: 8,
            frame_weight: 1.0,
            overlay_weight: 0.3,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct LaneRenderer {
    params: RenderParams,
}

impl LaneRenderer {
    pub fn new(params: RenderParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn params(&self) -> &RenderParams {
        &self.params
    }

    /// Composite the lane overlay onto `frame`.
    ///
    /// With `lanes == None` the frame is returned unchanged. Pixels the
    /// warped overlay does not reach keep their original value.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", skip_all, fields(width = frame.width, height = frame.height))
    )]
    pub fn render(
        &self,
        frame: &RgbImageView<'_>,
        lanes: Option<&LanePair>,
        transforms: &PerspectivePair,
    ) -> RgbImage {
        let unchanged = || RgbImage {
            width: frame.width,
            height: frame.height,
            data: frame.data.to_vec(),
        };
        let Some(lanes) = lanes else {
            return unchanged();
        };
        let Some(base) = view_to_rgb(frame) else {
            log::warn!(
                "frame {}x{} cannot be drawn on; overlay skipped",
                frame.width,
                frame.height
            );
            return unchanged();
        };

        let overlay = self.draw_overlay(lanes, base.width(), base.height());
        // Camera pixel p samples the bird's-eye overlay at M p.
        let warped = warp_perspective_rgb(
            &rgb_view(&overlay),
            &transforms.forward,
            frame.width,
            frame.height,
        );
        let Some(warped) = to_rgb(warped) else {
            return unchanged();
        };
        let (fw, ow) = (self.params.frame_weight, self.params.overlay_weight);
        from_rgb(map_colors2(&base, &warped, |f: Rgb<u8>, o: Rgb<u8>| {
            Rgb(blend_pixel(f.0, o.0, fw, ow))
        }))
    }

    /// Lane region and boundaries in bird's-eye coordinates.
    pub fn draw_overlay(&self, lanes: &LanePair, width: u32, height: u32) -> image::RgbImage {
        let mut overlay = image::RgbImage::new(width, height);
        fill_between(&mut overlay, &lanes.left, &lanes.right, self.params.fill_color);
        for poly in [&lanes.left, &lanes.right] {
            draw_polynomial(
                &mut overlay,
                poly,
                self.params.line_color,
                self.params.line_thickness,
            );
        }
        overlay
    }
}

/// Fill the polygon running down the left boundary and back up the right one.
pub fn fill_between(
    img: &mut image::RgbImage,
    left: &LanePolynomial,
    right: &LanePolynomial,
    color: [u8; 3],
) {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return;
    }
    // Columns beyond the canvas collapse onto its outer neighbours.
    let vertex = |poly: &LanePolynomial, y: i32| {
        let x = poly.eval(y as f64);
        x.is_finite()
            .then(|| Point::new(x.clamp(-1.0, w as f64) as i32, y))
    };
    let rows = 0..h as i32;
    let mut polygon: Vec<Point<i32>> = rows.clone().filter_map(|y| vertex(left, y)).collect();
    polygon.extend(rows.rev().filter_map(|y| vertex(right, y)));
    while polygon.len() > 1 && polygon.first() == polygon.last() {
        polygon.pop();
    }
    if polygon.len() < 3 {
        return;
    }
    draw_polygon_mut(img, &polygon, Rgb(color));
}

/// Draw `x = poly(y)` over every row as a connected thick polyline.
pub fn draw_polynomial(img: &mut image::RgbImage, poly: &LanePolynomial, color: [u8; 3], thickness: u32) {
    let mut prev: Option<(f64, f64)> = None;
    for y in 0..img.height() {
        let x = poly.eval(y as f64);
        if !x.is_finite() {
            prev = None;
            continue;
        }
        let p = (x.trunc(), y as f64);
        if let Some(q) = prev {
            draw_line(img, q, p, color, thickness);
        }
        prev = Some(p);
    }
}

/// Bresenham segment with a `thickness`-wide square stamped at every step.
///
/// The segment is first clipped to the canvas grown by half the stamp, so
/// off-canvas stretches cost nothing.
pub fn draw_line(
    img: &mut image::RgbImage,
    p0: (f64, f64),
    p1: (f64, f64),
    color: [u8; 3],
    thickness: u32,
) {
    let half = thickness / 2;
    let side = 2 * half + 1;
    let (w, h) = img.dimensions();
    let pad = half as f64;
    let bounds = [-pad, -pad, w as f64 - 1.0 + pad, h as f64 - 1.0 + pad];
    let Some((a, b)) = clip_segment(p0, p1, bounds) else {
        return;
    };
    let half = half as i32;
    let snap = |p: (f64, f64)| (p.0.round() as f32, p.1.round() as f32);
    for (x, y) in BresenhamLineIter::new(snap(a), snap(b)) {
        draw_filled_rect_mut(img, Rect::at(x - half, y - half).of_size(side, side), Rgb(color));
    }
}

/// Liang-Barsky clip of `p0 -> p1` against `[x_min, y_min, x_max, y_max]`.
fn clip_segment(
    p0: (f64, f64),
    p1: (f64, f64),
    [x_min, y_min, x_max, y_max]: [f64; 4],
) -> Option<((f64, f64), (f64, f64))> {
    if ![p0.0, p0.1, p1.0, p1.1].iter().all(|v| v.is_finite()) {
        return None;
    }
    let (dx, dy) = (p1.0 - p0.0, p1.1 - p0.1);
    let (mut t0, mut t1) = (0.0f64, 1.0f64);
    for (p, q) in [
        (-dx, p0.0 - x_min),
        (dx, x_max - p0.0),
        (-dy, p0.1 - y_min),
        (dy, y_max - p0.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                t0 = t0.max(r);
            } else {
                t1 = t1.min(r);
            }
            if t0 > t1 {
                return None;
            }
        }
    }
    Some((
        (p0.0 + t0 * dx, p0.1 + t0 * dy),
        (p0.0 + t1 * dx, p0.1 + t1 * dy),
    ))
}

/// `sat(frame * frame_weight + overlay * overlay_weight)` where the overlay
/// is not black, rounding halves to even.
fn blend_pixel(frame: [u8; 3], overlay: [u8; 3], frame_weight: f64, overlay_weight: f64) -> [u8; 3] {
    if overlay == [0, 0, 0] {
        return frame;
    }
    std::array::from_fn(|c| {
        let v = frame[c] as f64 * frame_weight + overlay[c] as f64 * overlay_weight;
        v.round_ties_even().clamp(0.0, 255.0) as u8
    })
}

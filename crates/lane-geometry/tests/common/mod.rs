#![allow(dead_code)]

use lane_geometry::core::RgbImage;
use lane_geometry::detect::{PerspectivePair, RectifierParams};
use nalgebra::Point2;

/// Camera frame whose lane lines are vertical at `xs_rect` in the default
/// bird's-eye view.
pub fn synthetic_road(w: usize, h: usize, xs_rect: &[f64]) -> RgbImage {
    let lines: Vec<(f64, f64)> = xs_rect.iter().map(|&x| (x, 0.0)).collect();
    painted_road(w, h, &lines)
}

/// Like [`synthetic_road`], with each line `(x, y0)` painted only from
/// bird's-eye row `y0` down to the bottom.
pub fn painted_road(w: usize, h: usize, lines: &[(f64, f64)]) -> RgbImage {
    let pair = PerspectivePair::compute(&RectifierParams::default(), w, h).expect("pair");
    let mut img = RgbImage::new(w, h);
    let first_road_row = (0.6 * h as f64).ceil() as usize;
    for y in 0..h {
        for x in 0..w {
            if y < first_road_row {
                img.put_pixel(x, y, [120, 160, 210]);
                continue;
            }
            let p = pair.forward.apply(Point2::new(x as f64, y as f64));
            let on_line = lines
                .iter()
                .any(|&(xl, y0)| (p.x - xl).abs() <= 6.0 && p.y >= y0);
            let rgb = if on_line && p.y >= 0.0 && p.y < h as f64 {
                [245, 245, 245]
            } else {
                [60, 62, 66]
            };
            img.put_pixel(x, y, rgb);
        }
    }
    img
}

pub fn asphalt(w: usize, h: usize) -> RgbImage {
    let mut img = RgbImage::new(w, h);
    for px in img.data.chunks_exact_mut(3) {
        px.copy_from_slice(&[60, 62, 66]);
    }
    img
}

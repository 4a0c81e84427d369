//! Conversions between the core frame buffers and `image` buffers.
//!
//! The `image` side uses `u32` dimensions; conversions return `None` when a
//! size does not fit or the buffer disagrees with it.

use lane_geometry_core::{GrayImage, RgbImage, RgbImageView};

fn dims(width: usize, height: usize) -> Option<(u32, u32)> {
    Some((u32::try_from(width).ok()?, u32::try_from(height).ok()?))
}

pub fn to_luma(img: &GrayImage) -> Option<image::GrayImage> {
    let (w, h) = dims(img.width, img.height)?;
    image::GrayImage::from_raw(w, h, img.data.clone())
}

pub fn from_luma(img: image::GrayImage) -> GrayImage {
    GrayImage {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.into_raw(),
    }
}

pub fn to_rgb(img: RgbImage) -> Option<image::RgbImage> {
    let (w, h) = dims(img.width, img.height)?;
    image::RgbImage::from_raw(w, h, img.data)
}

pub fn view_to_rgb(view: &RgbImageView<'_>) -> Option<image::RgbImage> {
    let (w, h) = dims(view.width, view.height)?;
    image::RgbImage::from_raw(w, h, view.data.to_vec())
}

pub fn from_rgb(img: image::RgbImage) -> RgbImage {
    RgbImage {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.into_raw(),
    }
}

/// Borrow an `image::RgbImage` as a core frame view.
pub fn rgb_view(img: &image::RgbImage) -> RgbImageView<'_> {
    RgbImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

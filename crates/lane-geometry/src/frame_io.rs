//! Interop with the `image` crate and frame directories.

use std::path::{Path, PathBuf};

pub use lane_geometry_detect::interop::{rgb_view, to_luma as to_image_luma, to_rgb as to_image_rgb};

const FRAME_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Decode any supported image file as 8-bit RGB.
pub fn load_frame(path: impl AsRef<Path>) -> Result<::image::RgbImage, ::image::ImageError> {
    Ok(::image::open(path)?.to_rgb8())
}

/// PNG/JPEG files directly inside `dir`, in lexicographic order.
pub fn list_frames(dir: impl AsRef<Path>) -> std::io::Result<Vec<PathBuf>> {
    let mut frames = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let is_frame = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| FRAME_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)));
        if is_frame {
            frames.push(path);
        }
    }
    frames.sort();
    Ok(frames)
}

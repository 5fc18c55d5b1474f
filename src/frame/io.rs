//! Convenience helpers for loading frames via the `image` crate.
//!
//! Available when the `image-io` feature is enabled. Decoding and color
//! conversion are otherwise outside the engine; these helpers exist for the
//! CLI and for tests that want real frames.

use crate::frame::{OwnedFrame, PixelLayout};
use crate::util::{BlockMatchError, BlockMatchResult};
use std::path::Path;

/// Creates an owned frame from an RGB8 image buffer.
pub fn frame_from_rgb_image(img: &image::RgbImage) -> BlockMatchResult<OwnedFrame> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    OwnedFrame::from_u8(img.as_raw().clone(), width, height, PixelLayout::Rgb888)
}

/// Creates an owned frame from an RGBA8 image buffer.
pub fn frame_from_rgba_image(img: &image::RgbaImage) -> BlockMatchResult<OwnedFrame> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    OwnedFrame::from_u8(img.as_raw().clone(), width, height, PixelLayout::Rgba8888)
}

/// Loads an image from disk and converts it to a packed RGB frame.
pub fn load_rgb_frame<P: AsRef<Path>>(path: P) -> BlockMatchResult<OwnedFrame> {
    let path = path.as_ref();
    let img = image::open(path).map_err(|source| BlockMatchError::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;
    frame_from_rgb_image(&img.to_rgb8())
}

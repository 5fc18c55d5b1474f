//! Error types for blockmatch.

use crate::frame::PixelLayout;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias for blockmatch operations.
pub type BlockMatchResult<T> = std::result::Result<T, BlockMatchError>;

/// Errors that can occur when running blockmatch operations.
///
/// Recoverable scan conditions (insufficient detail, degenerate geometry,
/// missing persisted results) never surface here; they degrade to a defined
/// [`ScanResult`](crate::ScanResult) instead. These variants cover contract
/// violations: malformed buffers, mismatched frames, and I/O failures.
#[derive(Debug, Error)]
pub enum BlockMatchError {
    /// A frame or window was created with a zero or overflowing size.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// The row stride is smaller than one row of pixel components.
    #[error("stride {stride} is smaller than row length {row}")]
    InvalidStride { row: usize, stride: usize },
    /// The backing buffer cannot hold the described frame.
    #[error("buffer too small: needed {needed} elements, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// The pixel layout requires a different storage type than supplied.
    #[error("layout {layout:?} requires {expected} storage")]
    StorageMismatch {
        layout: PixelLayout,
        expected: &'static str,
    },
    /// A requested window falls outside the frame.
    #[error(
        "window {x},{y} {width}x{height} out of bounds for {frame_width}x{frame_height} frame"
    )]
    WindowOutOfBounds {
        x: i64,
        y: i64,
        width: i64,
        height: i64,
        frame_width: usize,
        frame_height: usize,
    },
    /// The two frames handed to a scan disagree on pixel layout.
    #[error("pixel layout mismatch: {previous:?} vs {current:?}")]
    LayoutMismatch {
        previous: PixelLayout,
        current: PixelLayout,
    },
    /// The two frames handed to a scan disagree on dimensions.
    #[error("frame size mismatch: {prev_width}x{prev_height} vs {cur_width}x{cur_height}")]
    SizeMismatch {
        prev_width: usize,
        prev_height: usize,
        cur_width: usize,
        cur_height: usize,
    },
    /// A downsample factor was not a power of two >= 1.
    #[error("invalid downsample factor {factor}")]
    InvalidDownsample { factor: usize },
    /// The worker pool could not be constructed.
    #[error("failed to build worker pool: {reason}")]
    PoolBuild { reason: String },
    /// Writing a tracking entry to the backing store failed.
    #[error("failed to write tracking entry {path}")]
    StoreWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Loading an image file failed.
    #[cfg(feature = "image-io")]
    #[error("failed to load image {path}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

//! Blockmatch is a CPU block-matching motion-estimation engine.
//!
//! Given a reference frame and a current frame, it recovers the translation
//! (and optionally rotation) that best aligns a tracked block, at quarter-pixel
//! accuracy. The search is a greedy coarse-to-fine pyramid: each level fans a
//! grid of position and rotation hypotheses out over a bounded worker pool,
//! keeps the cheapest candidate, then narrows the window and doubles the
//! resolution, finishing with a bilinear sub-pixel pass.

pub mod cost;
pub mod engine;
pub mod frame;
pub mod pool;
pub mod rotation;
pub mod scan;
pub mod store;
pub(crate) mod trace;
pub mod util;

pub use engine::MotionEngine;
pub use frame::downsample::{downsample, DownsampleCache};
pub use frame::{FrameView, OwnedFrame, PixelBuffer, PixelData, PixelLayout};
pub use pool::WorkerPool;
pub use rotation::{BilinearRotator, Pivot, RotationRenderer, Viewport};
pub use scan::{
    ActionMode, FrameRelation, ScanRequest, ScanResult, TrackingMode, OVERSAMPLE,
    STARTING_DOWNSAMPLE,
};
pub use store::{FsStore, MemoryStore, NullStore, TrackingStore};
pub use util::{BlockMatchError, BlockMatchResult};

pub use cost::{block_cost, block_cost_subpixel, value_range};

#[cfg(feature = "image-io")]
pub use frame::io;
